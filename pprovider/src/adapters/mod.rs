//! Vendor adapters and the helpers they share.

use std::pin::Pin;

use futures_core::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{FunctionDeclaration, ProviderError, ProviderId, Schema};

pub mod sse;

#[cfg(any(
    feature = "provider-openai",
    feature = "provider-anthropic",
    feature = "provider-gemini"
))]
pub(crate) mod http;

#[cfg(feature = "provider-openai")]
pub mod openai;

#[cfg(feature = "provider-anthropic")]
pub mod anthropic;

#[cfg(feature = "provider-gemini")]
pub mod gemini;

/// Raw event payloads (one JSON document each) read off a streaming response.
pub type PayloadStream<'a> = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send + 'a>>;

/// Parses one vendor payload into its typed form plus the raw JSON view.
pub(crate) fn parse_payload<T>(provider: ProviderId, payload: &str) -> Result<(T, Value), ProviderError>
where
    T: DeserializeOwned,
{
    let typed = serde_json::from_str::<T>(payload).map_err(|err| {
        ProviderError::transport(format!("{provider} returned an unreadable payload: {err}"))
    })?;
    let raw = serde_json::from_str::<Value>(payload).unwrap_or(Value::Null);

    Ok((typed, raw))
}

/// JSON-Schema parameters for vendors that accept the schema verbatim.
///
/// Function parameters must describe an object; an empty schema becomes `{}` properties.
pub(crate) fn object_parameters(schema: &Schema) -> Result<Value, ProviderError> {
    if schema.kind.is_empty() && schema.properties.is_empty() {
        return Ok(serde_json::json!({"type": "object", "properties": {}}));
    }

    if !schema.kind.eq_ignore_ascii_case("object") {
        return Err(ProviderError::schema_conversion(format!(
            "function parameters must be an object schema, got '{}'",
            schema.kind
        )));
    }

    Ok(schema.to_value())
}

/// Converts each declaration, dropping the ones whose schema does not translate.
pub(crate) fn convert_functions<T>(
    provider: ProviderId,
    functions: &[FunctionDeclaration],
    convert: impl Fn(&FunctionDeclaration) -> Result<T, ProviderError>,
) -> Vec<T> {
    functions
        .iter()
        .filter_map(|function| match convert(function) {
            Ok(converted) => Some(converted),
            Err(err) => {
                tracing::warn!(
                    provider = %provider,
                    function = %function.name,
                    error = %err,
                    "omitting function whose schema could not be converted"
                );
                None
            }
        })
        .collect()
}

/// Valid JSON text for a call's arguments; blank arguments become `{}`.
pub(crate) fn arguments_or_empty_object(arguments: &str) -> &str {
    if arguments.trim().is_empty() {
        "{}"
    } else {
        arguments
    }
}
