mod convert;
mod provider;
mod tests;
mod transport;
mod types;

pub use convert::{from_wire, to_wire};
pub use provider::{OPENAI_DEFAULT_MODEL, OpenAiProvider};
pub use transport::{OPENAI_BASE_URL, OpenAiHttpTransport, OpenAiTransport};
pub use types::{
    OpenAiChoice, OpenAiContent, OpenAiContentPart, OpenAiDelta, OpenAiDeltaFunction,
    OpenAiDeltaToolCall, OpenAiFile, OpenAiFunction, OpenAiFunctionCall, OpenAiImageUrl,
    OpenAiMessage, OpenAiModel, OpenAiModelList, OpenAiRequest, OpenAiResponse,
    OpenAiStreamChoice, OpenAiStreamOptions, OpenAiStreamResponse, OpenAiTool, OpenAiToolCall,
    OpenAiUsage,
};
