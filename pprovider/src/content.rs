//! Part/Content vocabulary shared by the accumulator, sessions, and adapters.
//!
//! ```rust
//! use pprovider::{Content, FunctionCall, Part};
//!
//! let turn = Content::assistant(vec![
//!     Part::text("looking it up"),
//!     Part::FunctionCall(FunctionCall::new("c1", "lookup", r#"{"a":1}"#)),
//! ]);
//!
//! assert_eq!(turn.role, "assistant");
//! assert_eq!(turn.text(), "looking it up");
//! assert_eq!(turn.function_calls().len(), 1);
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::ProviderError;

pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// One turn: a role plus its ordered parts.
///
/// Roles are free-form strings; nothing here enforces an ordering convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            role: role.into(),
            parts,
        }
    }

    pub fn user(parts: Vec<Part>) -> Self {
        Self::new(ROLE_USER, parts)
    }

    pub fn assistant(parts: Vec<Part>) -> Self {
        Self::new(ROLE_ASSISTANT, parts)
    }

    /// Concatenation of every text part, in order.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(Part::as_text)
    }

    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Image(Image),
    Blob(Blob),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        match self {
            Self::Image(image) => image.mime_type(),
            Self::Blob(blob) => Some(blob.mime_type.as_str()),
            _ => None,
        }
    }

    /// MIME type and bytes for inline media, the pair used for media equality.
    pub fn media(&self) -> Option<(&str, &[u8])> {
        match self {
            Self::Image(Image::Inline(blob)) | Self::Blob(blob) => {
                Some((blob.mime_type.as_str(), blob.data.as_slice()))
            }
            _ => None,
        }
    }
}

impl From<&str> for Part {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Part {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    pub fn from_base64(mime_type: impl Into<String>, encoded: &str) -> Result<Self, ProviderError> {
        let data = STANDARD
            .decode(encoded.trim())
            .map_err(|err| ProviderError::invalid_request(format!("invalid base64 payload: {err}")))?;

        Ok(Self::new(mime_type, data))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Image {
    Inline(Blob),
    Uri(String),
}

impl Image {
    pub fn inline(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::Inline(Blob::new(mime_type, data))
    }

    /// Accepts `data:<mime>;base64,<payload>` or an `http(s)://` reference.
    pub fn parse(uri: &str) -> Result<Self, ProviderError> {
        if let Some(rest) = uri.strip_prefix("data:") {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| ProviderError::invalid_request("data URI is missing its payload"))?;
            let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
                ProviderError::invalid_request("only base64 data URIs are supported")
            })?;

            return Ok(Self::Inline(Blob::from_base64(mime_type, payload)?));
        }

        if uri.starts_with("http://") || uri.starts_with("https://") {
            return Ok(Self::Uri(uri.to_string()));
        }

        Err(ProviderError::invalid_request(format!(
            "unsupported image reference: {uri}"
        )))
    }

    pub fn mime_type(&self) -> Option<&str> {
        match self {
            Self::Inline(blob) => Some(blob.mime_type.as_str()),
            Self::Uri(_) => None,
        }
    }

    /// Inline images render as a base64 data URI; references pass through.
    pub fn data_uri(&self) -> String {
        match self {
            Self::Inline(blob) => format!("data:{};base64,{}", blob.mime_type, blob.to_base64()),
            Self::Uri(uri) => uri.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionCall {
    pub id: String,
    pub name: String,
    /// JSON-encoded arguments, kept verbatim.
    pub arguments: String,
}

impl FunctionCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionResponse {
    pub id: String,
    pub response: String,
}

impl FunctionResponse {
    pub fn new(id: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            response: response.into(),
        }
    }
}
