pub mod transcript;

pub use transcript::{Sender, Transcript, Turn};

use std::time::Instant;

use anyhow::Result;
use tracing::{debug, warn};

use crate::config::Config;
use crate::instrumentation::{TurnLog, TurnLogger};
use crate::llm::{ChatMessage, LlmClient};
use crate::lookup::ContextSynthesizer;

/// Assistant turn substituted when the model call fails.
pub const FALLBACK_REPLY: &str = "すみません、応答に失敗しました。";

const SYSTEM_PERSONA: &str = "あなたは診療支援AI『DI アシスタント24/7』です。\
PMDA添付文書を基盤に、正確かつ安全な医療薬剤情報を提供してください。";
const CITATION_PREFACE: &str = "必要に応じて以下の出典情報を活用してください。";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Sending,
}

/// One conversation session. Owns the transcript; `submit` is the only
/// mutation point, gated so a turn in flight rejects further submissions.
pub struct ChatSession {
    transcript: Transcript,
    state: SessionState,
    llm: LlmClient,
    synthesizer: ContextSynthesizer,
    logger: TurnLogger,
    model: String,
}

impl ChatSession {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_logger(config, TurnLogger::new("logs")?)
    }

    pub fn with_logger(config: &Config, logger: TurnLogger) -> Result<Self> {
        Ok(Self {
            transcript: Transcript::new(),
            state: SessionState::Idle,
            llm: LlmClient::new(&config.llm_api_key, &config.llm_base_url),
            synthesizer: ContextSynthesizer::new(config)?,
            logger,
            model: config.chat_model.clone(),
        })
    }

    /// Run one conversational turn.
    ///
    /// Returns `None` when the submission is rejected (blank text, or a turn
    /// already in flight): no network call, no transcript change. Otherwise
    /// the transcript grows by exactly two turns — the user's, then either
    /// the model reply or the fixed fallback — and the turn's log record is
    /// returned.
    pub async fn submit(&mut self, text: &str) -> Option<TurnLog> {
        let text = text.trim().to_string();
        if text.is_empty() {
            debug!("ignoring empty submission");
            return None;
        }
        if self.state == SessionState::Sending {
            debug!("submission rejected: turn already in flight");
            return None;
        }

        self.state = SessionState::Sending;
        let turn_start = Instant::now();
        self.transcript.push_user(&text);

        let lookup_start = Instant::now();
        let supplement = self.synthesizer.gather(&text).await;
        let lookup_latency_ms = lookup_start.elapsed().as_millis() as u64;

        let messages = self.build_messages(&supplement.text);

        let llm_start = Instant::now();
        let result = self.llm.complete(&self.model, messages).await;
        let llm_latency_ms = llm_start.elapsed().as_millis() as u64;

        let (outcome, response) = match result {
            Ok(r) if !r.text.trim().is_empty() => {
                self.transcript.push_assistant(r.text.trim());
                ("success", Some(r))
            }
            Ok(_) => {
                warn!("model response had no message content");
                self.transcript.push_assistant(FALLBACK_REPLY);
                ("failure", None)
            }
            Err(e) => {
                warn!(error = %e, "model call failed");
                self.transcript.push_assistant(FALLBACK_REPLY);
                ("failure", None)
            }
        };

        let turn_log = TurnLog {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            question: text,
            pubmed_cited: supplement.pubmed_cited,
            drugbank_cited: supplement.drugbank_cited,
            supplemental_chars: supplement.text.chars().count(),
            lookup_latency_ms,
            llm_latency_ms,
            llm_input_tokens: response.as_ref().map(|r| r.input_tokens).unwrap_or(0),
            llm_output_tokens: response.as_ref().map(|r| r.output_tokens).unwrap_or(0),
            outcome: outcome.to_string(),
            total_latency_ms: turn_start.elapsed().as_millis() as u64,
        };

        if let Err(e) = self.logger.write(&turn_log) {
            warn!(error = %e, "failed to write turn log");
        }

        self.state = SessionState::Idle;
        Some(turn_log)
    }

    /// System prompt, then the whole transcript in completion-role order.
    /// The just-appended user turn is the final message.
    fn build_messages(&self, supplemental: &str) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::new("system", build_system_prompt(supplemental))];
        messages.extend(
            self.transcript
                .turns()
                .iter()
                .map(|t| ChatMessage::new(t.sender.role(), t.text.clone())),
        );
        messages
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn last_reply(&self) -> &str {
        &self.transcript.last().text
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }
}

fn build_system_prompt(supplemental: &str) -> String {
    if supplemental.is_empty() {
        // No citation section when both sources came back empty.
        SYSTEM_PERSONA.to_string()
    } else {
        format!("{}{}\n\n{}", SYSTEM_PERSONA, CITATION_PREFACE, supplemental)
    }
}
