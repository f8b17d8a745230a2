use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use application::interfaces::platform::AdapterRegistry;
use domain::value_objects::platform_api::AdapterError;

pub mod reddit;
pub mod twitter;

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build platform http client")
}

pub(crate) fn transport_error(err: reqwest::Error) -> AdapterError {
    AdapterError::Transport(err.to_string())
}

/// Reads the response body exactly once and classifies the outcome: non-2xx
/// becomes `Provider`, an unparseable body becomes `MalformedResponse`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    context: &str,
) -> Result<T, AdapterError> {
    let status = resp.status();
    let body = resp.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(AdapterError::Provider {
            status: status.as_u16(),
            detail: if body.is_empty() {
                "<empty response body>".to_string()
            } else {
                body
            },
        });
    }

    serde_json::from_str(&body)
        .map_err(|err| AdapterError::MalformedResponse(format!("{context}: {err}")))
}

/// Builds the registry from whatever platform credentials the environment
/// carries. A platform with missing credentials is skipped with a warning so
/// a partial deployment still serves the configured ones.
pub fn build_registry_from_env() -> Result<AdapterRegistry> {
    let mut registry = AdapterRegistry::new();

    match twitter::TwitterConfig::from_env() {
        Ok(config) => {
            registry.register(std::sync::Arc::new(twitter::TwitterAdapter::new(config)?));
            info!("registered twitter adapter");
        }
        Err(err) => warn!(error = %err, "twitter adapter not configured, skipping"),
    }

    match reddit::RedditConfig::from_env() {
        Ok(config) => {
            registry.register(std::sync::Arc::new(reddit::RedditAdapter::new(config)?));
            info!("registered reddit adapter");
        }
        Err(err) => warn!(error = %err, "reddit adapter not configured, skipping"),
    }

    Ok(registry)
}
