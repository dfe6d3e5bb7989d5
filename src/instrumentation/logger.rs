use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// One record per submitted conversational turn, appended to a JSONL file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnLog {
    pub id: String,
    pub timestamp: String,
    pub question: String,
    pub pubmed_cited: bool,
    pub drugbank_cited: bool,
    pub supplemental_chars: usize,
    pub lookup_latency_ms: u64,
    pub llm_latency_ms: u64,
    pub llm_input_tokens: u32,
    pub llm_output_tokens: u32,
    pub outcome: String,
    pub total_latency_ms: u64,
}

impl TurnLog {
    pub fn total_tokens(&self) -> u32 {
        self.llm_input_tokens + self.llm_output_tokens
    }

    pub fn summary(&self) -> String {
        format!(
            "Outcome: {} | Sources: pubmed={} drugbank={} | Lookup: {:.1}s | Model: {:.1}s | Tokens: {}",
            self.outcome,
            self.pubmed_cited,
            self.drugbank_cited,
            self.lookup_latency_ms as f64 / 1000.0,
            self.llm_latency_ms as f64 / 1000.0,
            self.total_tokens(),
        )
    }
}

pub struct TurnLogger {
    dir: PathBuf,
}

impl TurnLogger {
    pub fn new(dir: &str) -> Result<Self> {
        let dir = PathBuf::from(dir);
        fs::create_dir_all(&dir).context("Failed to create logs directory")?;
        Ok(Self { dir })
    }

    pub fn write(&self, turn_log: &TurnLog) -> Result<()> {
        let path = self.dir.join("turns.jsonl");
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open log file")?;

        let json = serde_json::to_string(turn_log).context("Failed to serialize turn log")?;
        writeln!(file, "{}", json).context("Failed to write log")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> TurnLog {
        TurnLog {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            question: "aspirin".to_string(),
            pubmed_cited: true,
            drugbank_cited: false,
            supplemental_chars: 64,
            lookup_latency_ms: 120,
            llm_latency_ms: 900,
            llm_input_tokens: 200,
            llm_output_tokens: 80,
            outcome: "success".to_string(),
            total_latency_ms: 1030,
        }
    }

    #[test]
    fn written_lines_parse_back() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TurnLogger::new(dir.path().to_str().unwrap()).unwrap();

        logger.write(&sample_log()).unwrap();
        logger.write(&sample_log()).unwrap();

        let contents = fs::read_to_string(dir.path().join("turns.jsonl")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: TurnLog = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.question, "aspirin");
        assert_eq!(parsed.total_tokens(), 280);
    }

    #[test]
    fn summary_names_the_outcome() {
        let log = sample_log();
        assert!(log.summary().contains("success"));
        assert!(log.summary().contains("pubmed=true"));
    }
}
