pub mod drugbank;
pub mod pubmed;

pub use drugbank::DrugBankLookup;
pub use pubmed::PubMedLookup;

use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Config;

/// A formatted reference produced by one of the enrichment sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub label: &'static str,
    pub title: String,
    pub source_url: String,
}

impl Citation {
    pub fn render(&self) -> String {
        format!("{}（{}）\n出典: {}", self.label, self.title, self.source_url)
    }
}

/// Why a single lookup produced nothing. These never escape the lookup
/// boundary; the public surface degrades them to `None` after logging.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed payload: missing {0}")]
    MissingField(&'static str),
    #[error("search returned no identifiers")]
    EmptyList,
    #[error("no entry matched the markup pattern")]
    NoMatch,
}

impl LookupError {
    /// A plain miss is expected traffic; everything else is worth a warning.
    pub(crate) fn is_miss(&self) -> bool {
        matches!(self, LookupError::EmptyList | LookupError::NoMatch)
    }
}

/// Merged enrichment result for one query. `text` is the joined citation
/// block handed to the system prompt; the flags feed the turn log.
#[derive(Debug, Clone, Default)]
pub struct Supplement {
    pub text: String,
    pub pubmed_cited: bool,
    pub drugbank_cited: bool,
}

/// Fans out to both enrichment sources and merges whatever came back.
/// This stage has no error path: a source that fails contributes nothing.
pub struct ContextSynthesizer {
    pubmed: PubMedLookup,
    drugbank: DrugBankLookup,
}

impl ContextSynthesizer {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.lookup_timeout_secs))
            .build()
            .context("Failed to build lookup HTTP client")?;

        Ok(Self {
            pubmed: PubMedLookup::new(client.clone(), &config.pubmed_base_url),
            drugbank: DrugBankLookup::new(client, &config.drugbank_base_url),
        })
    }

    /// Both lookups run concurrently and always settle; one source missing
    /// or failing never cancels the other.
    pub async fn gather(&self, query: &str) -> Supplement {
        let query = query.trim();
        if query.is_empty() {
            return Supplement::default();
        }

        let (pubmed, drugbank) = tokio::join!(
            self.pubmed.fetch_citation(query),
            self.drugbank.fetch_citation(query),
        );

        Supplement {
            pubmed_cited: pubmed.is_some(),
            drugbank_cited: drugbank.is_some(),
            text: merge_citations([pubmed, drugbank]),
        }
    }
}

fn merge_citations(citations: [Option<Citation>; 2]) -> String {
    citations
        .into_iter()
        .flatten()
        .map(|c| c.render())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation(label: &'static str, title: &str, url: &str) -> Citation {
        Citation {
            label,
            title: title.to_string(),
            source_url: url.to_string(),
        }
    }

    #[test]
    fn render_includes_title_and_source() {
        let c = citation("PubMed論文", "Aspirin and platelets", "https://pubmed.ncbi.nlm.nih.gov/12345");
        assert_eq!(
            c.render(),
            "PubMed論文（Aspirin and platelets）\n出典: https://pubmed.ncbi.nlm.nih.gov/12345"
        );
    }

    #[test]
    fn merge_joins_both_with_one_blank_line() {
        let merged = merge_citations([
            Some(citation("PubMed論文", "A", "https://example.org/a")),
            Some(citation("DrugBank情報", "B", "https://example.org/b")),
        ]);
        assert_eq!(
            merged,
            "PubMed論文（A）\n出典: https://example.org/a\n\nDrugBank情報（B）\n出典: https://example.org/b"
        );
    }

    #[test]
    fn merge_with_single_hit_has_no_separator() {
        let merged = merge_citations([None, Some(citation("DrugBank情報", "B", "https://example.org/b"))]);
        assert_eq!(merged, "DrugBank情報（B）\n出典: https://example.org/b");
        assert!(!merged.contains("\n\n"));
    }

    #[test]
    fn merge_with_no_hits_is_empty() {
        assert_eq!(merge_citations([None, None]), "");
    }

    fn test_config(base: &str) -> Config {
        Config {
            llm_api_key: "test-key".to_string(),
            llm_base_url: format!("{}/chat/completions", base),
            chat_model: "gpt-4".to_string(),
            pubmed_base_url: base.to_string(),
            drugbank_base_url: base.to_string(),
            relay_port: 0,
            lookup_timeout_secs: 5,
            voice_capture_cmd: None,
        }
    }

    #[tokio::test]
    async fn gather_keeps_the_surviving_source_when_one_misses() {
        use axum::routing::get;

        // PubMed finds nothing; DrugBank hits.
        let router = axum::Router::new()
            .route(
                "/esearch.fcgi",
                get(|| async { r#"{"esearchresult":{"idlist":[]}}"# }),
            )
            .route(
                "/unearth/q",
                get(|| async { "<a href=\"/drugs/DB00945\">Aspirin</a>" }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        let base = format!("http://{}", addr);

        let synthesizer = ContextSynthesizer::new(&test_config(&base)).unwrap();
        let supplement = synthesizer.gather("aspirin").await;

        assert!(!supplement.pubmed_cited);
        assert!(supplement.drugbank_cited);
        assert!(supplement.text.starts_with("DrugBank情報（Aspirin）"));
        assert!(!supplement.text.contains("\n\n"));
    }

    #[tokio::test]
    async fn gather_with_blank_query_is_empty_without_network() {
        let synthesizer = ContextSynthesizer::new(&test_config("http://127.0.0.1:1")).unwrap();
        let supplement = synthesizer.gather("   ").await;
        assert_eq!(supplement.text, "");
        assert!(!supplement.pubmed_cited);
        assert!(!supplement.drugbank_cited);
    }
}
