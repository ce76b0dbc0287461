//! One chat contract over OpenAI, Anthropic and Gemini models.
//!
//! This crate is the single dependency for most applications. It re-exports
//! the workspace crates and builds a ready [`Client`] from a [`ClientConfig`].
//!
//! ```rust,no_run
//! use parley::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new(LlmKind::Gemini, std::env::var("GEMINI_API_KEY")?)
//!     .with_limit(15);
//! let client = build_client(&config)?;
//!
//! let mut session = client.session();
//! let reply = session.chat(&Context::background(), parts!["Hello"]).await?;
//! println!("{}", first_result(&reply).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

mod config;
mod macros;
mod providers;

pub mod prelude;
pub mod util;

pub use pbatch;
pub use pchat;
pub use pcommon;
pub use pobserve;
pub use pprovider;

pub use config::{ClientConfig, ConfigError, ConfigErrorKind, LlmKind};
pub use providers::{build_client, build_client_with_hooks, build_provider};
pub use util::{first_result, joined_results, text_parts};

pub use pbatch::{BatchError, BatchErrorKind, BatchResult, Example, Prompt, PromptParts, Template};
pub use pchat::{
    ChatError, ChatErrorKind, ChatErrorSource, ChatHooks, ChatStream, Client, ClientBuilder,
    FinalizedTurn, NoopChatHooks, Session, StreamAccumulator,
};
pub use pcommon::{CancelHandle, Context, ContextError, ModelConfig};
pub use pobserve::{FanoutChatHooks, MetricsChatHooks, SafeChatHooks, TracingChatHooks};
pub use pprovider::{
    Blob, ChatResponse, Content, FunctionCall, FunctionCallingMode, FunctionDeclaration,
    FunctionResponse, Image, JsonResponse, JsonSchema, Limiter, ModelProvider, ModelResponse,
    Part, ProviderError, ProviderErrorKind, ProviderId, ROLE_ASSISTANT, ROLE_USER, Schema,
    StreamChunk, StreamEvent, TokenCount,
};
