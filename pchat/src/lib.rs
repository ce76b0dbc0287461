//! Chat client, sessions and streamed-turn accumulation over model adapters.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pchat::Client;
//! use pprovider::{BoxedEventStream, ChatRequest, ModelProvider, ModelResponse, ProviderError,
//!     ProviderFuture, ProviderId};
//!
//! struct Offline;
//!
//! impl ModelProvider for Offline {
//!     fn id(&self) -> ProviderId { ProviderId::OpenAi }
//!     fn default_model(&self) -> &str { "offline" }
//!     fn complete<'a>(&'a self, _: ChatRequest)
//!         -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
//!         Box::pin(async { Err(ProviderError::unavailable("offline")) })
//!     }
//!     fn stream<'a>(&'a self, _: ChatRequest)
//!         -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
//!         Box::pin(async { Err(ProviderError::unavailable("offline")) })
//!     }
//!     fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>> {
//!         Box::pin(async { Ok(Vec::new()) })
//!     }
//! }
//!
//! let client = Client::builder(Arc::new(Offline)).limit(Some(60)).build();
//! client.set_temperature(0.2);
//! assert_eq!(client.model(), "offline");
//! assert_eq!(client.limit(), Some(60));
//! ```

mod accumulator;
mod client;
mod error;
mod hooks;
mod session;
mod stream;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatHooks, ChatStream, Client, ClientBuilder, Session,
        StreamAccumulator,
    };
    pub use pcommon::{Context, ContextError, ModelConfig};
    pub use pprovider::{ChatResponse, Content, ModelResponse, Part, StreamChunk, TokenCount};
}

pub use accumulator::{FinalizedTurn, StreamAccumulator};
pub use client::{Client, ClientBuilder};
pub use error::{ChatError, ChatErrorKind, ChatErrorSource};
pub use hooks::{
    ChatHooks, NoopChatHooks, OPERATION_CHAT, OPERATION_CHAT_STREAM, OPERATION_LIST_MODELS,
};
pub use session::Session;
pub use stream::ChatStream;
