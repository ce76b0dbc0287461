use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchErrorKind {
    /// The client was closed before the batch started.
    ClientClosed,
    /// A worker task panicked or was aborted.
    TaskFailed,
}

/// Failure of the batch as a whole. Per-prompt failures are reported in
/// [`crate::BatchResult::error`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchError {
    pub kind: BatchErrorKind,
    pub message: String,
}

impl BatchError {
    pub fn new(kind: BatchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn client_closed() -> Self {
        Self::new(BatchErrorKind::ClientClosed, "chat client is closed")
    }

    pub fn task_failed(message: impl Into<String>) -> Self {
        Self::new(BatchErrorKind::TaskFailed, message)
    }
}

impl Display for BatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for BatchError {}

impl From<tokio::task::JoinError> for BatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::task_failed(err.to_string())
    }
}
