//! Observability hooks for chat dispatch: tracing events, metrics counters,
//! and a panic-isolating wrapper.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pchat::ChatHooks;
//! use pobserve::{MetricsChatHooks, SafeChatHooks, TracingChatHooks};
//!
//! let hooks: Arc<dyn ChatHooks> = Arc::new(SafeChatHooks::new(TracingChatHooks));
//! let _metrics: Arc<dyn ChatHooks> = Arc::new(MetricsChatHooks);
//! # let _ = hooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsChatHooks;
pub use safe_hooks::{FanoutChatHooks, SafeChatHooks};
pub use tracing_hooks::TracingChatHooks;

pub mod prelude {
    pub use crate::{FanoutChatHooks, MetricsChatHooks, SafeChatHooks, TracingChatHooks};
}
