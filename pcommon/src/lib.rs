//! Shared primitives for the parley workspace crates.
//!
//! ```rust
//! use pcommon::{Context, ModelConfig};
//!
//! let ctx = Context::background();
//! assert!(ctx.err().is_none());
//!
//! let config = ModelConfig::default().with_temperature(0.0).with_max_tokens(256);
//! assert_eq!(config.temperature, Some(0.0));
//! assert_eq!(config.top_p, None);
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use pcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Per-call cancellation and deadlines.
    //!
    //! A [`Context`] governs exactly one call. Cancelling it aborts limiter
    //! waits and outstanding network operations; it never outlives the call
    //! it was handed to.
    //!
    //! ```rust
    //! use pcommon::{Context, ContextError};
    //!
    //! let root = Context::background();
    //! let (child, handle) = root.with_cancel();
    //!
    //! assert!(child.err().is_none());
    //! handle.cancel();
    //! assert_eq!(child.err(), Some(ContextError::Canceled));
    //! assert!(root.err().is_none());
    //! ```

    use std::error::Error;
    use std::fmt::{Display, Formatter};
    use std::future::Future;
    use std::time::Duration;

    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ContextError {
        Canceled,
        DeadlineExceeded,
    }

    impl Display for ContextError {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Canceled => f.write_str("context canceled"),
                Self::DeadlineExceeded => f.write_str("context deadline exceeded"),
            }
        }
    }

    impl Error for ContextError {}

    #[derive(Debug, Clone)]
    pub struct Context {
        token: CancellationToken,
        deadline: Option<Instant>,
    }

    impl Default for Context {
        fn default() -> Self {
            Self::background()
        }
    }

    impl Context {
        /// A context that is never canceled and has no deadline.
        pub fn background() -> Self {
            Self {
                token: CancellationToken::new(),
                deadline: None,
            }
        }

        /// Derives a child context plus the handle that cancels it.
        ///
        /// Cancelling the parent also cancels the child; the reverse does not hold.
        pub fn with_cancel(&self) -> (Self, CancelHandle) {
            let token = self.token.child_token();
            let handle = CancelHandle {
                token: token.clone(),
            };

            (
                Self {
                    token,
                    deadline: self.deadline,
                },
                handle,
            )
        }

        pub fn with_timeout(&self, timeout: Duration) -> Self {
            self.with_deadline(Instant::now() + timeout)
        }

        /// The earlier of the inherited deadline and `deadline` wins.
        pub fn with_deadline(&self, deadline: Instant) -> Self {
            let deadline = match self.deadline {
                Some(current) if current <= deadline => current,
                _ => deadline,
            };

            Self {
                token: self.token.clone(),
                deadline: Some(deadline),
            }
        }

        pub fn deadline(&self) -> Option<Instant> {
            self.deadline
        }

        pub fn err(&self) -> Option<ContextError> {
            if self.token.is_cancelled() {
                return Some(ContextError::Canceled);
            }

            match self.deadline {
                Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
                _ => None,
            }
        }

        /// Resolves once the context is canceled or its deadline passes.
        pub async fn done(&self) -> ContextError {
            match self.deadline {
                Some(deadline) => tokio::select! {
                    biased;
                    _ = self.token.cancelled() => ContextError::Canceled,
                    _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
                },
                None => {
                    self.token.cancelled().await;
                    ContextError::Canceled
                }
            }
        }

        /// Races `future` against this context. Cancellation wins ties.
        pub async fn run<F>(&self, future: F) -> Result<F::Output, ContextError>
        where
            F: Future,
        {
            if let Some(err) = self.err() {
                return Err(err);
            }

            tokio::select! {
                biased;
                err = self.done() => Err(err),
                output = future => Ok(output),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct CancelHandle {
        token: CancellationToken,
    }

    impl CancelHandle {
        pub fn cancel(&self) {
            self.token.cancel();
        }

        pub fn is_canceled(&self) -> bool {
            self.token.is_cancelled()
        }
    }
}

pub mod model {
    //! Optional generation settings shared by clients and configuration files.
    //!
    //! Every field is optional so that "unset" stays distinct from zero.
    //!
    //! ```rust
    //! use pcommon::ModelConfig;
    //!
    //! let mut base = ModelConfig::default().with_temperature(0.7).with_count(2);
    //! base.merge(&ModelConfig::default().with_temperature(0.0));
    //!
    //! assert_eq!(base.temperature, Some(0.0));
    //! assert_eq!(base.count, Some(2));
    //! ```

    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ModelConfig {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub model: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub count: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub max_tokens: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub temperature: Option<f32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub top_p: Option<f32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub json_response: Option<bool>,
        /// Ask for the model's reasoning summaries where the vendor offers them.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub thinking: Option<bool>,
    }

    impl ModelConfig {
        pub fn with_model(mut self, model: impl Into<String>) -> Self {
            self.model = Some(model.into());
            self
        }

        pub fn with_count(mut self, count: u32) -> Self {
            self.count = Some(count);
            self
        }

        pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = Some(max_tokens);
            self
        }

        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_top_p(mut self, top_p: f32) -> Self {
            self.top_p = Some(top_p);
            self
        }

        pub fn with_json_response(mut self, enabled: bool) -> Self {
            self.json_response = Some(enabled);
            self
        }

        pub fn with_thinking(mut self, enabled: bool) -> Self {
            self.thinking = Some(enabled);
            self
        }

        /// Overlays every field that is set in `other`.
        pub fn merge(&mut self, other: &ModelConfig) {
            if let Some(model) = &other.model {
                self.model = Some(model.clone());
            }
            if other.count.is_some() {
                self.count = other.count;
            }
            if other.max_tokens.is_some() {
                self.max_tokens = other.max_tokens;
            }
            if other.temperature.is_some() {
                self.temperature = other.temperature;
            }
            if other.top_p.is_some() {
                self.top_p = other.top_p;
            }
            if other.json_response.is_some() {
                self.json_response = other.json_response;
            }
            if other.thinking.is_some() {
                self.thinking = other.thinking;
            }
        }

        pub fn is_empty(&self) -> bool {
            self == &Self::default()
        }
    }
}

pub use context::{CancelHandle, Context, ContextError};
pub use future::BoxFuture;
pub use model::ModelConfig;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Context, ContextError, ModelConfig};

    #[test]
    fn model_config_merge_keeps_unset_fields() {
        let mut config = ModelConfig::default()
            .with_model("gpt-4o-mini")
            .with_max_tokens(64)
            .with_top_p(0.9);
        config.merge(&ModelConfig::default().with_temperature(0.0).with_max_tokens(128));

        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.max_tokens, Some(128));
        assert_eq!(config.temperature, Some(0.0));
        assert_eq!(config.top_p, Some(0.9));
        assert_eq!(config.count, None);
        assert_eq!(config.thinking, None);

        config.merge(&ModelConfig::default().with_thinking(true));
        assert_eq!(config.thinking, Some(true));
        assert_eq!(config.max_tokens, Some(128));
    }

    #[test]
    fn model_config_deserializes_partial_documents() {
        let config: ModelConfig = serde_json::from_str(r#"{"temperature":0,"count":3}"#)
            .expect("partial config should deserialize");

        assert_eq!(config.temperature, Some(0.0));
        assert_eq!(config.count, Some(3));
        assert_eq!(config.max_tokens, None);
        assert!(!config.is_empty());
        assert!(ModelConfig::default().is_empty());
    }

    #[test]
    fn canceling_parent_cancels_child() {
        let (parent, handle) = Context::background().with_cancel();
        let (child, _child_handle) = parent.with_cancel();

        handle.cancel();
        assert_eq!(parent.err(), Some(ContextError::Canceled));
        assert_eq!(child.err(), Some(ContextError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_context_reports_deadline_exceeded() {
        let ctx = Context::background().with_timeout(Duration::from_secs(2));
        assert!(ctx.err().is_none());

        assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn nested_deadline_keeps_the_earlier_one() {
        let outer = Context::background().with_timeout(Duration::from_secs(1));
        let inner = outer.with_timeout(Duration::from_secs(30));

        assert_eq!(inner.deadline(), outer.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn run_returns_output_or_context_error() {
        let ctx = Context::background();
        let value = ctx.run(async { 7 }).await.expect("future should finish first");
        assert_eq!(value, 7);

        let short = ctx.with_timeout(Duration::from_millis(10));
        let outcome = short
            .run(tokio::time::sleep(Duration::from_secs(60)))
            .await;
        assert_eq!(outcome, Err(ContextError::DeadlineExceeded));

        let (canceled, handle) = ctx.with_cancel();
        handle.cancel();
        assert_eq!(canceled.run(async { 1 }).await, Err(ContextError::Canceled));
    }
}
