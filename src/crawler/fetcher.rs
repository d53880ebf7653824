//! HTTP fetcher
//!
//! One fetch builds one client so the identity's proxy and user-agent
//! apply to exactly that request and the underlying connection pool is
//! dropped on every exit path, success or failure. The per-request
//! deadline covers the whole transfer.

use crate::crawler::identity::Identity;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Per-page fetch failures. All are non-fatal to the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Render error for {url}: status {status}")]
    Render { url: String, status: u16 },
}

/// Builds a client configured for one identity
fn build_client(identity: &Identity, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(identity.user_agent.clone())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &identity.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }

    builder.build()
}

/// Fetches a page body under the given identity and deadline
///
/// # Errors
///
/// * `FetchError::Timeout` - the deadline elapsed
/// * `FetchError::Network` - connection or protocol failure
/// * `FetchError::Render` - non-success status, or a body that could not
///   be decoded into text
pub async fn fetch_page(
    url: &str,
    identity: &Identity,
    timeout: Duration,
) -> Result<String, FetchError> {
    let client = build_client(identity, timeout).map_err(|e| FetchError::Network {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let response = client.get(url).send().await.map_err(|e| classify(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Render {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Render {
                url: url.to_string(),
                status: status.as_u16(),
            }
        }
    })
}

/// Maps a transport error onto the fetch taxonomy
fn classify(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
