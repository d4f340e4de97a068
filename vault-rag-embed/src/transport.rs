//! JSON-over-HTTP plumbing shared by the service clients

use crate::error::{Result, ServiceError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Instant;

/// POST `body` as JSON to `url` and decode the JSON answer into `R`.
///
/// Transport failures map to [`ServiceError::Unreachable`], non-2xx statuses to
/// [`ServiceError::Status`], undecodable bodies to [`ServiceError::MalformedResponse`].
pub(crate) async fn post_json<B, R>(client: &reqwest::Client, url: &str, body: &B) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let started = Instant::now();
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| ServiceError::unreachable(url, e))?;

    let decoded = decode(url, response).await?;
    tracing::debug!("POST {} completed in {:?}", url, started.elapsed());
    Ok(decoded)
}

/// GET `url` and decode the JSON answer into `R`.
pub(crate) async fn get_json<R>(client: &reqwest::Client, url: &str) -> Result<R>
where
    R: DeserializeOwned,
{
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ServiceError::unreachable(url, e))?;

    decode(url, response).await
}

async fn decode<R>(url: &str, response: reqwest::Response) -> Result<R>
where
    R: DeserializeOwned,
{
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ServiceError::unreachable(url, e))?;

    if !status.is_success() {
        return Err(ServiceError::Status {
            status,
            body: String::from_utf8_lossy(&bytes).trim().to_string(),
        });
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| ServiceError::malformed(format!("cannot decode response from {url}: {e}")))
}
