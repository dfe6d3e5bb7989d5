use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, warn};

use super::{Citation, LookupError};

/// Canonical article URL; the eutils base only serves the API.
const ARTICLE_BASE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    esearchresult: Option<EsearchResult>,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
    idlist: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct EsummaryResponse {
    result: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct DocSummary {
    title: Option<String>,
}

/// Two-step literature lookup: keyword search for the first matching
/// identifier, then a summary fetch for its title.
pub struct PubMedLookup {
    client: reqwest::Client,
    base_url: String,
}

impl PubMedLookup {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Degrade-to-empty boundary: every failure is logged and mapped to
    /// `None`, never propagated. Empty queries return without network access.
    pub async fn fetch_citation(&self, query: &str) -> Option<Citation> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        match self.lookup(query).await {
            Ok(citation) => Some(citation),
            Err(e) if e.is_miss() => {
                debug!(query, "pubmed: no result");
                None
            }
            Err(e) => {
                warn!(query, error = %e, "pubmed lookup failed");
                None
            }
        }
    }

    async fn lookup(&self, query: &str) -> Result<Citation, LookupError> {
        let id = self.search_first_id(query).await?;
        let title = self.fetch_title(&id).await?;

        Ok(Citation {
            label: "PubMed論文",
            title,
            source_url: format!("{}/{}", ARTICLE_BASE_URL, id),
        })
    }

    async fn search_first_id(&self, query: &str) -> Result<String, LookupError> {
        let response = self
            .client
            .get(format!("{}/esearch.fcgi", self.base_url))
            .query(&[("db", "pubmed"), ("retmode", "json"), ("term", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let body: EsearchResponse = response.json().await?;
        body.esearchresult
            .ok_or(LookupError::MissingField("esearchresult"))?
            .idlist
            .ok_or(LookupError::MissingField("esearchresult.idlist"))?
            .into_iter()
            .next()
            .ok_or(LookupError::EmptyList)
    }

    async fn fetch_title(&self, id: &str) -> Result<String, LookupError> {
        let response = self
            .client
            .get(format!("{}/esummary.fcgi", self.base_url))
            .query(&[("db", "pubmed"), ("retmode", "json"), ("id", id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let body: EsummaryResponse = response.json().await?;
        let doc = body
            .result
            .ok_or(LookupError::MissingField("result"))?
            .remove(id)
            .ok_or(LookupError::MissingField("result.<id>"))?;

        let summary: DocSummary = serde_json::from_value(doc)
            .map_err(|_| LookupError::MissingField("result.<id>"))?;
        summary.title.ok_or(LookupError::MissingField("title"))
    }
}
