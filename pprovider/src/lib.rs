//! Vendor-neutral content model, response types and vendor adapters.
//!
//! Adapters translate a [`ChatRequest`] into one vendor call and the reply back
//! into [`ModelResponse`] or a stream of [`StreamChunk`] values.
//!
//! ```rust
//! use pprovider::{ChatRequest, Content, Part};
//!
//! let request = ChatRequest::new("gpt-4o-mini", vec![Part::text("and now?")])
//!     .with_history(vec![Content::user(vec![Part::text("hello")])]);
//!
//! assert_eq!(request.conversation().len(), 2);
//! ```

mod content;
mod credentials;
mod error;
mod limiter;
mod model;
mod provider;
mod response;
mod schema;
mod stream;

pub mod adapters;
pub mod prelude;

pub use content::{
    Blob, Content, FunctionCall, FunctionResponse, Image, Part, ROLE_ASSISTANT, ROLE_USER,
};
pub use credentials::SecretString;
pub use error::{ProviderError, ProviderErrorKind};
pub use limiter::Limiter;
pub use model::{ChatRequest, ProviderId};
pub use provider::{ModelProvider, ProviderFuture};
pub use response::{ChatResponse, ModelResponse, StreamChunk, TokenCount};
pub use schema::{FunctionCallingMode, FunctionDeclaration, JsonResponse, JsonSchema, Schema};
pub use stream::{BoxedEventStream, ModelEventStream, StreamEvent, VecEventStream};

pub use pcommon::{Context, ContextError, ModelConfig};

#[cfg(feature = "provider-anthropic")]
pub use adapters::anthropic::{AnthropicHttpTransport, AnthropicProvider, AnthropicTransport};
#[cfg(feature = "provider-gemini")]
pub use adapters::gemini::{GeminiHttpTransport, GeminiProvider, GeminiTransport};
#[cfg(feature = "provider-openai")]
pub use adapters::openai::{OpenAiHttpTransport, OpenAiProvider, OpenAiTransport};
