//! Chat-layer errors and classification.
//!
//! A canceled context and a vendor failure are distinct kinds, so callers
//! can tell "I gave up" from "the vendor failed".
//!
//! ```rust
//! use pchat::{ChatError, ChatErrorKind};
//! use pcommon::ContextError;
//! use pprovider::ProviderError;
//!
//! let gave_up = ChatError::rate_limit_canceled(ContextError::Canceled);
//! assert_eq!(gave_up.kind, ChatErrorKind::RateLimitCanceled);
//!
//! let vendor = ChatError::from(ProviderError::unavailable("overloaded"));
//! assert_eq!(vendor.kind, ChatErrorKind::Transport);
//! assert!(vendor.is_retryable());
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use pcommon::ContextError;
use pprovider::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    ClientClosed,
    /// The context ended while waiting for a rate-limit token.
    RateLimitCanceled,
    /// The context ended while the vendor call was outstanding.
    Canceled,
    Transport,
    InvalidRequest,
    StreamExhausted,
    StreamClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatErrorSource {
    Provider(ProviderError),
    Context(ContextError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub source: Option<ChatErrorSource>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn client_closed() -> Self {
        Self::new(ChatErrorKind::ClientClosed, "client is closed")
    }

    pub fn rate_limit_canceled(cause: ContextError) -> Self {
        Self {
            source: Some(ChatErrorSource::Context(cause)),
            ..Self::new(
                ChatErrorKind::RateLimitCanceled,
                format!("rate limiter wait aborted: {cause}"),
            )
        }
    }

    pub fn canceled(cause: ContextError) -> Self {
        Self {
            source: Some(ChatErrorSource::Context(cause)),
            ..Self::new(ChatErrorKind::Canceled, cause.to_string())
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn stream_exhausted() -> Self {
        Self::new(ChatErrorKind::StreamExhausted, "stream is exhausted")
    }

    pub fn stream_closed() -> Self {
        Self::new(ChatErrorKind::StreamClosed, "stream is closed")
    }

    /// The vendor error behind a `Transport` or `InvalidRequest` failure.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match &self.source {
            Some(ChatErrorSource::Provider(err)) => Some(err),
            _ => None,
        }
    }

    pub fn context_error(&self) -> Option<ContextError> {
        match self.source {
            Some(ChatErrorSource::Context(err)) => Some(err),
            _ => None,
        }
    }

    /// Advisory only; nothing in this crate retries.
    pub fn is_retryable(&self) -> bool {
        self.provider_error().is_some_and(|err| err.retryable)
    }

    pub(crate) fn rejected(err: ProviderError) -> Self {
        Self {
            message: err.message.clone(),
            source: Some(ChatErrorSource::Provider(err)),
            ..Self::new(ChatErrorKind::InvalidRequest, "")
        }
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            Some(ChatErrorSource::Provider(err)) => Some(err),
            Some(ChatErrorSource::Context(err)) => Some(err),
            None => None,
        }
    }
}

/// Vendor errors pass through unchanged as the source of a `Transport` error.
impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        Self {
            message: value.to_string(),
            source: Some(ChatErrorSource::Provider(value)),
            ..Self::new(ChatErrorKind::Transport, "")
        }
    }
}
