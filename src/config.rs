use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub chat_model: String,
    pub pubmed_base_url: String,
    pub drugbank_base_url: String,
    pub relay_port: u16,
    pub lookup_timeout_secs: u64,
    pub voice_capture_cmd: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            llm_api_key: std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?,
            llm_base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".into()),
            chat_model: std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4".into()),
            pubmed_base_url: std::env::var("PUBMED_BASE_URL")
                .unwrap_or_else(|_| "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".into()),
            drugbank_base_url: std::env::var("DRUGBANK_BASE_URL")
                .unwrap_or_else(|_| "https://go.drugbank.com".into()),
            relay_port: std::env::var("RELAY_PORT")
                .unwrap_or_else(|_| "3001".into())
                .parse()
                .context("RELAY_PORT must be a port number")?,
            lookup_timeout_secs: std::env::var("LOOKUP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .context("LOOKUP_TIMEOUT_SECS must be a number")?,
            voice_capture_cmd: std::env::var("VOICE_CAPTURE_CMD").ok(),
        })
    }
}
