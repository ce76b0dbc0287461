//! Common `pprovider` imports for downstream crates.

pub use crate::{
    Blob, BoxedEventStream, ChatRequest, ChatResponse, Content, FunctionCall, FunctionCallingMode,
    FunctionDeclaration, FunctionResponse, Image, JsonResponse, JsonSchema, Limiter,
    ModelEventStream, ModelProvider, ModelResponse, Part, ProviderError, ProviderErrorKind,
    ProviderId, Schema, SecretString, StreamChunk, StreamEvent, TokenCount,
};
pub use pcommon::{BoxFuture, Context, ContextError, ModelConfig};
