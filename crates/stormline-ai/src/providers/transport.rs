//! HTTP plumbing shared by every adapter
//!
//! Non-2xx responses become [`Error::Provider`] with the raw body, reqwest
//! timeouts become [`Error::Timeout`], and SSE bodies are decoded lazily.

use crate::completion::ChunkStream;
use crate::error::{Error, Result};
use crate::router::ProviderKind;
use crate::sse::{SseDecoder, StreamParser};
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Connect timeout for every adapter client
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the pooled client shared by an adapter's requests.
///
/// No overall timeout is set on the client: non-streaming calls set one per
/// request and streams apply an idle timeout per read.
pub(crate) fn build_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| Error::Network(e.to_string()))
}

pub(crate) fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// Turn a non-2xx response into [`Error::Provider`]
pub(crate) async fn check_status(provider: ProviderKind, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!(provider = %provider, status = status.as_u16(), "Provider returned error status");
    Err(Error::Provider {
        provider: provider.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// Send a request and return the raw body text of a 2xx response
pub(crate) async fn send_text(
    provider: ProviderKind,
    request: RequestBuilder,
    timeout: Duration,
) -> Result<String> {
    let timeout_ms = millis(timeout);
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| Error::from_reqwest(e, timeout_ms))?;

    let response = check_status(provider, response).await?;
    response
        .text()
        .await
        .map_err(|e| Error::from_reqwest(e, timeout_ms))
}

/// Send a request and decode a 2xx JSON body
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: ProviderKind,
    request: RequestBuilder,
    timeout: Duration,
) -> Result<T> {
    let body = send_text(provider, request, timeout).await?;
    serde_json::from_str(&body)
        .map_err(|e| Error::InvalidResponse(format!("{provider}: {e}")))
}

/// Open an SSE stream and run its frames through `parser`.
///
/// Nothing is sent until the returned stream is first polled. Dropping the
/// stream drops the response body and closes the connection; no background
/// task keeps reading.
pub(crate) fn sse_stream<P>(
    provider: ProviderKind,
    request: RequestBuilder,
    mut parser: P,
    timeout: Duration,
) -> ChunkStream
where
    P: StreamParser + 'static,
{
    let timeout_ms = millis(timeout);

    Box::pin(async_stream::stream! {
        debug!(provider = %provider, "Opening stream");
        let response = match tokio::time::timeout(timeout, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                yield Err(Error::from_reqwest(e, timeout_ms));
                return;
            }
            Err(_) => {
                yield Err(Error::Timeout(timeout_ms));
                return;
            }
        };
        let response = match check_status(provider, response).await {
            Ok(response) => response,
            Err(e) => {
                yield Err(e);
                return;
            }
        };

        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        loop {
            let read = match tokio::time::timeout(timeout, body.next()).await {
                Ok(read) => read,
                Err(_) => {
                    yield Err(Error::Timeout(timeout_ms));
                    return;
                }
            };
            let Some(read) = read else { break };
            let bytes = match read {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(Error::from_reqwest(e, timeout_ms));
                    return;
                }
            };
            match decoder.feed_into(&mut parser, &bytes) {
                Ok(chunks) => {
                    for chunk in chunks {
                        yield Ok(chunk);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
            if decoder.is_terminal() || parser.is_terminal() {
                break;
            }
        }

        match decoder.finish_into(&mut parser) {
            Ok(chunks) => {
                for chunk in chunks {
                    yield Ok(chunk);
                }
            }
            Err(e) => yield Err(e),
        }
        debug!(provider = %provider, "Stream finished");
    })
}
