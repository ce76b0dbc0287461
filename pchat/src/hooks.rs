//! Dispatch lifecycle hooks. Every method defaults to a no-op.

use std::time::Duration;

use pprovider::{ProviderId, TokenCount};

use crate::ChatError;

pub const OPERATION_CHAT: &str = "chat";
pub const OPERATION_CHAT_STREAM: &str = "chat_stream";
pub const OPERATION_LIST_MODELS: &str = "list_models";

pub trait ChatHooks: Send + Sync {
    /// The limiter admitted the call after `waited`.
    fn on_admitted(&self, _provider: ProviderId, _operation: &str, _waited: Duration) {}

    fn on_dispatch(&self, _provider: ProviderId, _operation: &str, _model: &str) {}

    /// For streams this fires once the finalized turn is committed.
    fn on_success(&self, _provider: ProviderId, _operation: &str, _token_count: TokenCount) {}

    fn on_failure(&self, _provider: ProviderId, _operation: &str, _error: &ChatError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChatHooks;

impl ChatHooks for NoopChatHooks {}
