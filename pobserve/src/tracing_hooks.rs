//! Structured `tracing` events for each dispatch phase.
//!
//! ```rust
//! use pchat::ChatHooks;
//! use pobserve::TracingChatHooks;
//!
//! fn accepts_chat_hooks(_hooks: &dyn ChatHooks) {}
//!
//! accepts_chat_hooks(&TracingChatHooks);
//! ```

use std::time::Duration;

use pchat::{ChatError, ChatHooks};
use pprovider::{ProviderId, TokenCount};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingChatHooks;

impl ChatHooks for TracingChatHooks {
    fn on_admitted(&self, provider: ProviderId, operation: &str, waited: Duration) {
        tracing::debug!(
            phase = "limiter",
            event = "admitted",
            provider = %provider,
            operation,
            waited_ms = waited.as_millis() as u64
        );
    }

    fn on_dispatch(&self, provider: ProviderId, operation: &str, model: &str) {
        tracing::info!(
            phase = "dispatch",
            event = "start",
            provider = %provider,
            operation,
            model
        );
    }

    fn on_success(&self, provider: ProviderId, operation: &str, token_count: TokenCount) {
        tracing::info!(
            phase = "dispatch",
            event = "success",
            provider = %provider,
            operation,
            prompt_tokens = token_count.prompt,
            result_tokens = token_count.result,
            total_tokens = token_count.total
        );
    }

    fn on_failure(&self, provider: ProviderId, operation: &str, error: &ChatError) {
        tracing::error!(
            phase = "dispatch",
            event = "failure",
            provider = %provider,
            operation,
            error_kind = ?error.kind,
            retryable = error.is_retryable(),
            error = %error
        );
    }
}
