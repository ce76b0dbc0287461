//! Pull-based streamed turn bound to a client and, optionally, a session history.

use futures_util::StreamExt;
use pcommon::Context;
use pprovider::{BoxedEventStream, Content, StreamChunk, TokenCount};

use crate::hooks::OPERATION_CHAT_STREAM;
use crate::{ChatError, Client, StreamAccumulator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Open,
    /// End-of-stream was reported or the stream failed.
    Finished,
    Closed,
}

/// One streamed turn.
///
/// [`ChatStream::next`] yields fragments, then `Ok(None)` exactly once at
/// end-of-stream, then `StreamExhausted`. After [`ChatStream::close`] it
/// yields `StreamClosed`. The finalized assistant turn is committed to the
/// bound history only at end-of-stream; errors and early closes discard it.
pub struct ChatStream<'a> {
    client: &'a Client,
    ctx: Context,
    events: Option<BoxedEventStream<'a>>,
    accumulator: StreamAccumulator,
    history: Option<&'a mut Vec<Content>>,
    state: StreamState,
    turn: Option<Content>,
    token_count: TokenCount,
}

impl<'a> ChatStream<'a> {
    pub(crate) fn new(
        client: &'a Client,
        ctx: Context,
        events: BoxedEventStream<'a>,
        history: Option<&'a mut Vec<Content>>,
    ) -> Self {
        Self {
            client,
            ctx,
            events: Some(events),
            accumulator: StreamAccumulator::new(),
            history,
            state: StreamState::Open,
            turn: None,
            token_count: TokenCount::default(),
        }
    }

    pub async fn next(&mut self) -> Result<Option<StreamChunk>, ChatError> {
        match self.state {
            StreamState::Open => {}
            StreamState::Finished => return Err(ChatError::stream_exhausted()),
            StreamState::Closed => return Err(ChatError::stream_closed()),
        }

        let Some(events) = self.events.as_mut() else {
            return Err(ChatError::stream_exhausted());
        };

        let item = tokio::select! {
            biased;
            err = self.ctx.done() => Err(err),
            item = events.next() => Ok(item),
        };

        match item {
            Err(err) => Err(self.fail(ChatError::canceled(err))),
            Ok(None) => {
                self.commit();
                Ok(None)
            }
            Ok(Some(Err(err))) => Err(self.fail(ChatError::from(err))),
            Ok(Some(Ok(chunk))) => {
                self.accumulator.push(&chunk);
                Ok(Some(chunk))
            }
        }
    }

    /// Drains the remaining fragments and returns the finalized turn.
    pub async fn collect_turn(&mut self) -> Result<Content, ChatError> {
        while self.next().await?.is_some() {}
        Ok(self.turn.clone().unwrap_or_else(|| Content::assistant(Vec::new())))
    }

    /// Idempotent. A turn still in flight is discarded.
    pub fn close(&mut self) {
        if self.state == StreamState::Open {
            tracing::debug!(provider = %self.client.provider_id(), "chat stream closed early");
        }
        self.events = None;
        self.state = StreamState::Closed;
    }

    pub fn is_closed(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// The finalized assistant turn, once end-of-stream was reached.
    pub fn turn(&self) -> Option<&Content> {
        self.turn.as_ref()
    }

    /// Usage reported so far, or the final usage after end-of-stream.
    pub fn token_count(&self) -> TokenCount {
        match self.turn {
            Some(_) => self.token_count,
            None => self.accumulator.token_count(),
        }
    }

    fn commit(&mut self) {
        let finalized = std::mem::take(&mut self.accumulator).finish();
        if let Some(history) = self.history.as_deref_mut() {
            history.push(finalized.content.clone());
        }

        self.token_count = finalized.token_count;
        self.turn = Some(finalized.content);
        self.events = None;
        self.state = StreamState::Finished;

        self.client.hooks().on_success(
            self.client.provider_id(),
            OPERATION_CHAT_STREAM,
            finalized.token_count,
        );
    }

    fn fail(&mut self, err: ChatError) -> ChatError {
        self.accumulator = StreamAccumulator::new();
        self.events = None;
        self.state = StreamState::Finished;

        self.client
            .hooks()
            .on_failure(self.client.provider_id(), OPERATION_CHAT_STREAM, &err);
        err
    }
}

impl std::fmt::Debug for ChatStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("state", &self.state)
            .field("turn", &self.turn)
            .finish_non_exhaustive()
    }
}
