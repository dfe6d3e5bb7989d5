//! Cross-origin pass-through for browser clients of the drug-reference
//! search. No business logic: the upstream status and body are forwarded
//! verbatim.

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::Config;

#[derive(Clone)]
pub struct RelayState {
    client: reqwest::Client,
    upstream_base: String,
}

impl RelayState {
    pub fn new(upstream_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            upstream_base: upstream_base.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupParams {
    q: Option<String>,
}

pub fn relay_router(state: RelayState) -> Router {
    Router::new()
        .route("/lookup", get(forward_lookup))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn forward_lookup(
    State(state): State<RelayState>,
    Query(params): Query<LookupParams>,
) -> impl IntoResponse {
    let Some(query) = params.q else {
        return (StatusCode::BAD_REQUEST, "Query missing".to_string());
    };

    let upstream = state
        .client
        .get(format!("{}/unearth/q", state.upstream_base))
        .query(&[("searcher", "drugs"), ("query", query.as_str())])
        .send()
        .await;

    match upstream {
        Ok(response) => {
            let status = StatusCode::from_u16(response.status().as_u16())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            let body = response.text().await.unwrap_or_default();
            (status, body)
        }
        Err(e) => {
            warn!(error = %e, "upstream fetch failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error fetching upstream".to_string())
        }
    }
}

pub async fn serve(config: &Config) -> Result<()> {
    let router = relay_router(RelayState::new(&config.drugbank_base_url));
    let addr = format!("0.0.0.0:{}", config.relay_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind relay port")?;
    info!(%addr, "relay forwarder listening");
    axum::serve(listener, router)
        .await
        .context("Relay server exited")?;
    Ok(())
}
