//! reqwest plumbing shared by the HTTP transports.

use async_stream::try_stream;
use futures_util::StreamExt;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;

use crate::{ProviderError, ProviderId};

use super::PayloadStream;
use super::sse::SseDecoder;

const DONE_SENTINEL: &str = "[DONE]";

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub(crate) fn map_send_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(err.to_string())
    } else {
        ProviderError::transport(err.to_string())
    }
}

/// Sends the request and turns any non-success status into a `ProviderError`.
pub(crate) async fn send(
    provider: ProviderId,
    builder: RequestBuilder,
) -> Result<Response, ProviderError> {
    let response = builder.send().await.map_err(map_send_error)?;
    if response.status().is_success() {
        return Ok(response);
    }

    Err(parse_error(provider, response).await)
}

pub(crate) async fn read_body(response: Response) -> Result<String, ProviderError> {
    response.text().await.map_err(map_send_error)
}

async fn parse_error(provider: ProviderId, response: Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body)
        .unwrap_or_else(|| format!("{provider} request failed with status {status}"));

    ProviderError::from_status(status.as_u16(), message)
}

/// All three vendors nest a human-readable message under `error.message`.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Envelope {
        error: Detail,
    }

    #[derive(Deserialize)]
    struct Detail {
        message: String,
    }

    serde_json::from_str::<Envelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
}

/// Streams SSE `data` payloads until the body ends or a `[DONE]` sentinel arrives.
pub(crate) fn payloads<'a>(response: Response) -> PayloadStream<'a> {
    let stream = try_stream! {
        let mut bytes = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut finished = false;

        while let Some(item) = bytes.next().await {
            let chunk = item.map_err(map_send_error)?;
            for event in decoder.push(&chunk)? {
                if event.data.trim() == DONE_SENTINEL {
                    finished = true;
                    break;
                }
                yield event.data;
            }

            if finished {
                break;
            }
        }

        if !finished {
            if let Some(event) = decoder.finish()? {
                if event.data.trim() != DONE_SENTINEL {
                    yield event.data;
                }
            }
        }
    };

    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::{endpoint, extract_error_message};

    #[test]
    fn endpoint_joins_without_duplicate_slashes() {
        assert_eq!(
            endpoint("https://api.openai.com/v1/", "/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn error_message_is_read_from_vendor_envelopes() {
        let anthropic = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let gemini = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;

        assert_eq!(extract_error_message(anthropic).as_deref(), Some("Overloaded"));
        assert_eq!(extract_error_message(gemini).as_deref(), Some("API key not valid"));
        assert_eq!(extract_error_message("<html>"), None);
    }
}
