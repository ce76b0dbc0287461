//! Folds streamed fragments into the turn a non-streamed call would return.
//!
//! ```rust
//! use pchat::StreamAccumulator;
//! use pprovider::{Part, StreamChunk, StreamEvent};
//!
//! let mut accumulator = StreamAccumulator::new();
//! for piece in ["Hello", ", ", "world"] {
//!     accumulator.push(&StreamChunk::new(vec![StreamEvent::text(piece)]));
//! }
//!
//! let turn = accumulator.finish();
//! assert_eq!(turn.content.parts, vec![Part::text("Hello, world")]);
//! ```

use std::collections::BTreeMap;

use pprovider::{Content, FunctionCall, Part, StreamChunk, StreamEvent, TokenCount};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedTurn {
    pub content: Content,
    pub token_count: TokenCount,
}

#[derive(Debug, Default)]
pub struct StreamAccumulator {
    texts: BTreeMap<u32, String>,
    /// Calls in opening order. None is closed before end-of-stream.
    calls: Vec<FunctionCall>,
    prompt_tokens: Option<u64>,
    result_tokens: Option<u64>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &StreamChunk) {
        for event in &chunk.events {
            self.apply(event);
        }
    }

    pub fn apply(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::TextDelta { channel, text } => {
                self.texts.entry(*channel).or_default().push_str(text);
            }
            StreamEvent::ToolCallOpen {
                id,
                name,
                arguments,
            } => {
                self.calls
                    .push(FunctionCall::new(id.clone(), name.clone(), arguments.clone()));
            }
            StreamEvent::ToolCallArgumentDelta { id, arguments } => {
                self.append_arguments(id.as_deref(), arguments);
            }
            StreamEvent::UsageUpdate { prompt, result } => {
                if prompt.is_some() {
                    self.prompt_tokens = *prompt;
                }
                if result.is_some() {
                    self.result_tokens = *result;
                }
            }
        }
    }

    /// Continuations without a known id go to the most recently opened call.
    fn append_arguments(&mut self, id: Option<&str>, arguments: &str) {
        let matched = id.and_then(|id| self.calls.iter().rposition(|call| call.id == id));
        let target = match (matched, id) {
            (Some(index), _) => Some(index),
            (None, Some(id)) => {
                tracing::warn!(
                    call_id = id,
                    "argument fragment names an unknown call; attributing it to the latest call"
                );
                self.calls.len().checked_sub(1)
            }
            (None, None) => self.calls.len().checked_sub(1),
        };

        match target {
            Some(index) => self.calls[index].arguments.push_str(arguments),
            None => tracing::warn!("dropping argument fragment received before any call opened"),
        }
    }

    /// Text received so far, all channels in channel order.
    pub fn text(&self) -> String {
        self.texts.values().map(String::as_str).collect()
    }

    pub fn function_calls(&self) -> &[FunctionCall] {
        &self.calls
    }

    pub fn token_count(&self) -> TokenCount {
        if self.prompt_tokens.is_none() && self.result_tokens.is_none() {
            return TokenCount::default();
        }

        TokenCount::new(
            self.prompt_tokens.unwrap_or_default(),
            self.result_tokens.unwrap_or_default(),
        )
    }

    /// Texts first, one part per non-empty channel, then calls in opening order.
    pub fn finish(self) -> FinalizedTurn {
        let token_count = self.token_count();
        let mut parts = self
            .texts
            .into_values()
            .filter(|text| !text.is_empty())
            .map(Part::Text)
            .collect::<Vec<_>>();

        parts.extend(self.calls.into_iter().map(|mut call| {
            if call.arguments.trim().is_empty() {
                call.arguments = "{}".to_string();
            }
            Part::FunctionCall(call)
        }));

        FinalizedTurn {
            content: Content::assistant(parts),
            token_count,
        }
    }
}
