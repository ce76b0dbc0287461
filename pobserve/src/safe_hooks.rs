use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use pchat::{ChatError, ChatHooks};
use pprovider::{ProviderId, TokenCount};

/// Swallows panics raised by the wrapped hooks so they never reach a dispatch.
pub struct SafeChatHooks<H> {
    inner: H,
}

impl<H> SafeChatHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ChatHooks for SafeChatHooks<H>
where
    H: ChatHooks,
{
    fn on_admitted(&self, provider: ProviderId, operation: &str, waited: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_admitted(provider, operation, waited)
        }));
    }

    fn on_dispatch(&self, provider: ProviderId, operation: &str, model: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_dispatch(provider, operation, model)
        }));
    }

    fn on_success(&self, provider: ProviderId, operation: &str, token_count: TokenCount) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(provider, operation, token_count)
        }));
    }

    fn on_failure(&self, provider: ProviderId, operation: &str, error: &ChatError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(provider, operation, error)
        }));
    }
}

/// Forwards every callback to each hook in order.
#[derive(Default, Clone)]
pub struct FanoutChatHooks {
    hooks: Vec<Arc<dyn ChatHooks>>,
}

impl FanoutChatHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, hooks: Arc<dyn ChatHooks>) -> Self {
        self.hooks.push(hooks);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl ChatHooks for FanoutChatHooks {
    fn on_admitted(&self, provider: ProviderId, operation: &str, waited: Duration) {
        for hooks in &self.hooks {
            hooks.on_admitted(provider, operation, waited);
        }
    }

    fn on_dispatch(&self, provider: ProviderId, operation: &str, model: &str) {
        for hooks in &self.hooks {
            hooks.on_dispatch(provider, operation, model);
        }
    }

    fn on_success(&self, provider: ProviderId, operation: &str, token_count: TokenCount) {
        for hooks in &self.hooks {
            hooks.on_success(provider, operation, token_count);
        }
    }

    fn on_failure(&self, provider: ProviderId, operation: &str, error: &ChatError) {
        for hooks in &self.hooks {
            hooks.on_failure(provider, operation, error);
        }
    }
}
