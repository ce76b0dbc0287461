//! Stateful conversation over a client.
//!
//! History is append-only and grows only on successful turns. A session is
//! either idle or has exactly one [`ChatStream`] borrowing it.

use pcommon::Context;
use pprovider::{Content, ModelResponse, Part};

use crate::{ChatError, ChatStream, Client};

#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    history: Vec<Content>,
}

impl Session {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            history: Vec::new(),
        }
    }

    /// Resumes a conversation from earlier turns.
    pub fn with_history(mut self, history: Vec<Content>) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Appends the user turn and the reply's first candidate, only on success.
    pub async fn chat(&mut self, ctx: &Context, parts: Vec<Part>) -> Result<ModelResponse, ChatError> {
        let response = self
            .client
            .complete(ctx, self.history.clone(), parts.clone(), true)
            .await?;

        self.history.push(Content::user(parts));
        self.history.push(response.turn());
        Ok(response)
    }

    /// Appends the user turn at dispatch time; the assistant turn follows at
    /// end-of-stream.
    pub async fn chat_stream(
        &mut self,
        ctx: &Context,
        parts: Vec<Part>,
    ) -> Result<ChatStream<'_>, ChatError> {
        self.client
            .open_stream(ctx, parts, Some(&mut self.history))
            .await
    }
}
