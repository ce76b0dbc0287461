//! Common imports for most parley applications.

pub use crate::{
    BatchResult, ChatError, ChatErrorKind, ChatHooks, ChatResponse, ChatStream, Client,
    ClientConfig, ConfigError, Content, Context, ContextError, Example, FunctionCall,
    FunctionCallingMode, FunctionDeclaration, FunctionResponse, Image, JsonSchema, LlmKind,
    ModelConfig, ModelResponse, Part, Prompt, Schema, Session, StreamChunk, TokenCount,
};
pub use crate::{build_client, build_client_with_hooks, first_result, text_parts};
pub use crate::{parts, turn, turns};
