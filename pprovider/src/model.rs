//! Provider identifiers and the vendor-neutral chat request.
//!
//! ```rust
//! use pprovider::{ChatRequest, Part, ProviderErrorKind};
//!
//! let ok = ChatRequest::new("gpt-4o-mini", vec![Part::text("Summarize this diff")]);
//! assert!(ok.validate().is_ok());
//!
//! let err = ChatRequest::new("", vec![Part::text("hi")])
//!     .validate()
//!     .expect_err("empty model should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//! ```

use std::fmt::{Display, Formatter};

use pcommon::ModelConfig;

use crate::{Content, FunctionCallingMode, FunctionDeclaration, JsonResponse, Part, ProviderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenAi,
    Anthropic,
    Gemini,
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
        };

        f.write_str(id)
    }
}

/// One dispatch: prior turns, the new user parts, and a settings snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub history: Vec<Content>,
    pub parts: Vec<Part>,
    pub config: ModelConfig,
    pub functions: Vec<FunctionDeclaration>,
    pub function_calling_mode: FunctionCallingMode,
    pub json_response: Option<JsonResponse>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            model: model.into(),
            history: Vec::new(),
            parts,
            config: ModelConfig::default(),
            functions: Vec::new(),
            function_calling_mode: FunctionCallingMode::Unspecified,
            json_response: None,
        }
    }

    pub fn with_history(mut self, history: Vec<Content>) -> Self {
        self.history = history;
        self
    }

    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_functions(
        mut self,
        functions: Vec<FunctionDeclaration>,
        mode: FunctionCallingMode,
    ) -> Self {
        self.functions = functions;
        self.function_calling_mode = mode;
        self
    }

    pub fn with_json_response(mut self, json_response: JsonResponse) -> Self {
        self.json_response = Some(json_response);
        self
    }

    /// History followed by the new user turn, the full conversation to send.
    pub fn conversation(&self) -> Vec<Content> {
        let mut turns = self.history.clone();
        turns.push(Content::user(self.parts.clone()));
        turns
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if self.parts.is_empty() {
            return Err(ProviderError::invalid_request("at least one part is required"));
        }

        if let Some(max_tokens) = self.config.max_tokens
            && max_tokens == 0
        {
            return Err(ProviderError::invalid_request(
                "max_tokens must be greater than zero",
            ));
        }

        if let Some(count) = self.config.count
            && count == 0
        {
            return Err(ProviderError::invalid_request("count must be greater than zero"));
        }

        if let Some(temperature) = self.config.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ProviderError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        if let Some(top_p) = self.config.top_p
            && !(0.0..=1.0).contains(&top_p)
        {
            return Err(ProviderError::invalid_request(
                "top_p must be in the inclusive range 0.0..=1.0",
            ));
        }

        Ok(())
    }
}
