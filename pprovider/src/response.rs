//! Uniform read-only view over vendor replies and streamed fragments.
//!
//! ```rust
//! use pprovider::{ChatResponse, StreamChunk, StreamEvent, TokenCount};
//!
//! let chunk = StreamChunk::new(vec![
//!     StreamEvent::text("Hel"),
//!     StreamEvent::usage(Some(10), Some(5)),
//! ]);
//!
//! assert_eq!(chunk.results(), vec!["Hel".to_string()]);
//! assert_eq!(chunk.token_count(), TokenCount::new(10, 5));
//! assert_eq!(chunk.token_count().total, 15);
//! ```

use std::fmt::{Debug, Display, Formatter};

use serde_json::Value;

use crate::{Content, FunctionCall, Part, ProviderId, StreamEvent};

/// Usage totals. The zero value means "not reported", not "no usage".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TokenCount {
    pub prompt: u64,
    pub result: u64,
    pub total: u64,
}

impl TokenCount {
    pub fn new(prompt: u64, result: u64) -> Self {
        Self {
            prompt,
            result,
            total: prompt + result,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.prompt == 0 && self.result == 0 && self.total == 0
    }
}

impl Display for TokenCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "prompt={} result={} total={}",
            self.prompt, self.result, self.total
        )
    }
}

/// Implemented once per vendor reply and once per streamed fragment.
pub trait ChatResponse: Debug + Send + Sync {
    /// Text segments in order. For a fragment, only the text it carries.
    fn results(&self) -> Vec<String>;

    /// Invocations observed here. Fragment arguments may be partial.
    fn function_calls(&self) -> Vec<FunctionCall>;

    fn token_count(&self) -> TokenCount;

    /// Vendor payload for debugging. Never consulted by the chat layer.
    fn raw(&self) -> Option<&Value>;
}

/// One complete, non-streamed reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub provider: ProviderId,
    pub model: String,
    pub candidates: Vec<Content>,
    pub token_count: TokenCount,
    pub thoughts: Vec<String>,
    pub raw: Option<Value>,
}

impl ModelResponse {
    pub fn new(provider: ProviderId, model: impl Into<String>, candidates: Vec<Content>) -> Self {
        Self {
            provider,
            model: model.into(),
            candidates,
            token_count: TokenCount::default(),
            thoughts: Vec::new(),
            raw: None,
        }
    }

    pub fn with_token_count(mut self, token_count: TokenCount) -> Self {
        self.token_count = token_count;
        self
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn with_thoughts(mut self, thoughts: Vec<String>) -> Self {
        self.thoughts = thoughts;
        self
    }

    /// Reasoning summaries, when thinking was requested and the vendor sent
    /// any. Never part of the committed turn.
    pub fn thoughts(&self) -> &[String] {
        &self.thoughts
    }

    /// The assistant turn a session commits: the first candidate.
    pub fn turn(&self) -> Content {
        self.candidates
            .first()
            .cloned()
            .unwrap_or_else(|| Content::assistant(Vec::new()))
    }
}

impl ChatResponse for ModelResponse {
    fn results(&self) -> Vec<String> {
        self.candidates
            .iter()
            .flat_map(|candidate| candidate.texts().map(str::to_string))
            .collect()
    }

    fn function_calls(&self) -> Vec<FunctionCall> {
        self.candidates
            .iter()
            .flat_map(|candidate| candidate.parts.iter())
            .filter_map(|part| match part {
                Part::FunctionCall(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }

    fn token_count(&self) -> TokenCount {
        self.token_count
    }

    fn raw(&self) -> Option<&Value> {
        self.raw.as_ref()
    }
}

impl Display for ModelResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(first) = self.results().into_iter().next() {
            return f.write_str(&first);
        }

        let arguments = self
            .function_calls()
            .into_iter()
            .map(|call| call.arguments)
            .collect::<Vec<_>>();
        f.write_str(&arguments.join("\n"))
    }
}

/// One streamed fragment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamChunk {
    pub events: Vec<StreamEvent>,
    pub raw: Option<Value>,
}

impl StreamChunk {
    pub fn new(events: Vec<StreamEvent>) -> Self {
        Self { events, raw: None }
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl ChatResponse for StreamChunk {
    fn results(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                StreamEvent::TextDelta { text, .. } if !text.is_empty() => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn function_calls(&self) -> Vec<FunctionCall> {
        self.events
            .iter()
            .filter_map(|event| match event {
                StreamEvent::ToolCallOpen {
                    id,
                    name,
                    arguments,
                } => Some(FunctionCall::new(id.clone(), name.clone(), arguments.clone())),
                StreamEvent::ToolCallArgumentDelta { id, arguments } => Some(FunctionCall::new(
                    id.clone().unwrap_or_default(),
                    String::new(),
                    arguments.clone(),
                )),
                _ => None,
            })
            .collect()
    }

    /// Latest usage report carried by this fragment, if any.
    fn token_count(&self) -> TokenCount {
        self.events
            .iter()
            .rev()
            .find_map(|event| match event {
                StreamEvent::UsageUpdate { prompt, result } => Some(TokenCount::new(
                    prompt.unwrap_or_default(),
                    result.unwrap_or_default(),
                )),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn raw(&self) -> Option<&Value> {
        self.raw.as_ref()
    }
}
