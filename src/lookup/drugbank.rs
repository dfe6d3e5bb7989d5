use regex::Regex;
use tracing::{debug, warn};

use super::{Citation, LookupError};

/// First drug-entry anchor in a search result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugEntry {
    pub id: String,
    pub title: String,
}

/// Single-pattern heuristic over third-party markup. This coupling is
/// fragile and versioned: an upstream layout change makes `extract` return
/// `None`, never an error. Swap this type for a structured parser if the
/// page ever needs more than one anchor shape.
pub struct EntryExtractor {
    pattern: Regex,
}

impl EntryExtractor {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r#"<a href="/drugs/(DB\d{5})">(.*?)</a>"#)
                .expect("Invalid drug entry pattern"),
        }
    }

    pub fn extract(&self, markup: &str) -> Option<DrugEntry> {
        let captures = self.pattern.captures(markup)?;
        Some(DrugEntry {
            id: captures[1].to_string(),
            title: captures[2].to_string(),
        })
    }
}

impl Default for EntryExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Keyword search against the drug-reference site. Browser-origin callers
/// go through the relay forwarder; this client calls the site directly.
pub struct DrugBankLookup {
    client: reqwest::Client,
    base_url: String,
    extractor: EntryExtractor,
}

impl DrugBankLookup {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            extractor: EntryExtractor::new(),
        }
    }

    /// Same degrade-to-empty contract as the literature lookup.
    pub async fn fetch_citation(&self, query: &str) -> Option<Citation> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        match self.lookup(query).await {
            Ok(citation) => Some(citation),
            Err(e) if e.is_miss() => {
                debug!(query, "drugbank: no result");
                None
            }
            Err(e) => {
                warn!(query, error = %e, "drugbank lookup failed");
                None
            }
        }
    }

    async fn lookup(&self, query: &str) -> Result<Citation, LookupError> {
        let response = self
            .client
            .get(format!("{}/unearth/q", self.base_url))
            .query(&[("searcher", "drugs"), ("query", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let markup = response.text().await?;
        let entry = self.extractor.extract(&markup).ok_or(LookupError::NoMatch)?;

        Ok(Citation {
            label: "DrugBank情報",
            title: entry.title,
            source_url: format!("{}/drugs/{}", self.base_url, entry.id),
        })
    }
}
