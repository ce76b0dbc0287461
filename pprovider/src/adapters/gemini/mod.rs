mod convert;
mod provider;
mod transport;
mod types;

pub use convert::{conversation_to_wire, from_wire, to_wire};
pub use provider::{GEMINI_DEFAULT_MODEL, GeminiProvider};
pub use transport::{GEMINI_BASE_URL, GeminiHttpTransport, GeminiTransport};
pub use types::{
    GeminiCandidate, GeminiContent, GeminiFileData, GeminiFunctionCall,
    GeminiFunctionCallingConfig, GeminiFunctionDeclaration, GeminiFunctionResponse,
    GeminiGenerationConfig, GeminiInlineData, GeminiModel, GeminiModelList, GeminiPart,
    GeminiRequest, GeminiResponse, GeminiSchema, GeminiThinkingConfig, GeminiTool,
    GeminiToolConfig, GeminiUsage,
};
