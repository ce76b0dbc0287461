//! Streaming event contracts and in-memory stream utilities.
//!
//! ```rust
//! use pprovider::{BoxedEventStream, StreamChunk, StreamEvent, VecEventStream};
//!
//! let stream = VecEventStream::new(vec![Ok(StreamChunk::new(vec![StreamEvent::text("hello")]))]);
//! let _boxed: BoxedEventStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{ProviderError, StreamChunk};

/// Vendor-neutral incremental event. Each adapter translates its wire events
/// into this set and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    TextDelta {
        channel: u32,
        text: String,
    },
    /// Opens a call. `arguments` holds any argument text sent with the opener.
    ToolCallOpen {
        id: String,
        name: String,
        arguments: String,
    },
    /// Argument continuation. Some vendors omit `id` on continuations.
    ToolCallArgumentDelta {
        id: Option<String>,
        arguments: String,
    },
    /// Cumulative usage; later reports supersede earlier ones field by field.
    UsageUpdate {
        prompt: Option<u64>,
        result: Option<u64>,
    },
}

impl StreamEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextDelta {
            channel: 0,
            text: text.into(),
        }
    }

    pub fn text_on(channel: u32, text: impl Into<String>) -> Self {
        Self::TextDelta {
            channel,
            text: text.into(),
        }
    }

    pub fn tool_call_open(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self::ToolCallOpen {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    pub fn argument_delta(id: Option<&str>, arguments: impl Into<String>) -> Self {
        Self::ToolCallArgumentDelta {
            id: id.map(str::to_string),
            arguments: arguments.into(),
        }
    }

    pub fn usage(prompt: Option<u64>, result: Option<u64>) -> Self {
        Self::UsageUpdate { prompt, result }
    }
}

/// Provider stream contract.
///
/// Invariants for consumers:
/// - Fragments are emitted in source order.
/// - A terminal `Err` ends the stream; no partial turn may be committed from it.
/// - Once the stream yields `None`, it must not yield additional items.
pub trait ModelEventStream: Stream<Item = Result<StreamChunk, ProviderError>> + Send {}

impl<T> ModelEventStream for T where T: Stream<Item = Result<StreamChunk, ProviderError>> + Send {}

pub type BoxedEventStream<'a> = Pin<Box<dyn ModelEventStream + 'a>>;

#[derive(Debug)]
pub struct VecEventStream {
    chunks: VecDeque<Result<StreamChunk, ProviderError>>,
}

impl VecEventStream {
    pub fn new(chunks: Vec<Result<StreamChunk, ProviderError>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }

    /// One fragment per event, all successful.
    pub fn from_events(events: Vec<StreamEvent>) -> Self {
        Self::new(
            events
                .into_iter()
                .map(|event| Ok(StreamChunk::new(vec![event])))
                .collect(),
        )
    }
}

impl Stream for VecEventStream {
    type Item = Result<StreamChunk, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<StreamChunk, ProviderError>>> {
        Poll::Ready(self.chunks.pop_front())
    }
}
