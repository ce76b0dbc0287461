mod convert;
mod provider;
mod tests;
mod transport;
mod types;

pub use convert::{from_wire, to_wire};
pub use provider::{ANTHROPIC_DEFAULT_MAX_TOKENS, ANTHROPIC_DEFAULT_MODEL, AnthropicProvider};
pub use transport::{
    ANTHROPIC_BASE_URL, ANTHROPIC_VERSION, AnthropicHttpTransport, AnthropicTransport,
};
pub use types::{
    AnthropicBlock, AnthropicDelta, AnthropicErrorDetail, AnthropicMessage, AnthropicModel,
    AnthropicModelList, AnthropicRequest, AnthropicResponse, AnthropicSource,
    AnthropicStreamBlock, AnthropicStreamEvent, AnthropicStreamMessage, AnthropicTool,
    AnthropicUsage,
};
