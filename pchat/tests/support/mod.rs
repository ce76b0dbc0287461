#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::stream;
use pprovider::{
    BoxedEventStream, ChatRequest, Content, ModelProvider, ModelResponse, Part, ProviderError,
    ProviderFuture, ProviderId, StreamChunk, StreamEvent, TokenCount,
};
use pchat::{ChatError, ChatHooks};

pub enum Reply {
    Complete(Result<ModelResponse, ProviderError>),
    /// Never resolves.
    Hang,
}

pub enum Script {
    Chunks(Vec<Result<StreamChunk, ProviderError>>),
    /// Yields the chunks, then never ends.
    Stall(Vec<StreamChunk>),
    OpenError(ProviderError),
}

/// Replays scripted replies and records every request it receives.
#[derive(Default)]
pub struct ScriptedProvider {
    pub requests: Mutex<Vec<ChatRequest>>,
    replies: Mutex<VecDeque<Reply>>,
    streams: Mutex<VecDeque<Script>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, reply: Reply) -> &Self {
        self.replies.lock().expect("replies lock").push_back(reply);
        self
    }

    pub fn reply_text(&self, text: &str) -> &Self {
        self.reply(Reply::Complete(Ok(text_response(text))))
    }

    pub fn script(&self, script: Script) -> &Self {
        self.streams.lock().expect("streams lock").push_back(script);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    fn record(&self, request: ChatRequest) {
        self.requests.lock().expect("requests lock").push(request);
    }
}

impl ModelProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    fn complete<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            self.record(request);
            let reply = self
                .replies
                .lock()
                .expect("replies lock")
                .pop_front()
                .expect("a reply should be scripted");

            match reply {
                Reply::Complete(result) => result,
                Reply::Hang => std::future::pending().await,
            }
        })
    }

    fn stream<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            self.record(request);
            let script = self
                .streams
                .lock()
                .expect("streams lock")
                .pop_front()
                .expect("a stream should be scripted");

            match script {
                Script::Chunks(chunks) => Ok(Box::pin(stream::iter(chunks)) as BoxedEventStream<'a>),
                Script::Stall(chunks) => {
                    let head = stream::iter(chunks.into_iter().map(Ok));
                    Ok(Box::pin(futures_util::StreamExt::chain(head, stream::pending()))
                        as BoxedEventStream<'a>)
                }
                Script::OpenError(err) => Err(err),
            }
        })
    }

    fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async move { Ok(vec!["scripted-model".to_string()]) })
    }
}

pub fn text_response(text: &str) -> ModelResponse {
    ModelResponse::new(
        ProviderId::OpenAi,
        "scripted-model",
        vec![Content::assistant(vec![Part::text(text)])],
    )
    .with_token_count(TokenCount::new(3, 2))
}

pub fn text_chunk(text: &str) -> StreamChunk {
    StreamChunk::new(vec![StreamEvent::text(text)])
}

pub fn ok_chunks(texts: &[&str]) -> Vec<Result<StreamChunk, ProviderError>> {
    texts.iter().map(|text| Ok(text_chunk(text))).collect()
}

pub fn pause() -> Duration {
    Duration::from_secs(5)
}

/// Records hook calls as `event:operation` strings.
#[derive(Default)]
pub struct RecordingHooks {
    pub events: Mutex<Vec<String>>,
}

impl RecordingHooks {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }

    fn push(&self, event: &str, operation: &str) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("{event}:{operation}"));
    }
}

impl ChatHooks for RecordingHooks {
    fn on_admitted(&self, _provider: ProviderId, operation: &str, _waited: Duration) {
        self.push("admitted", operation);
    }

    fn on_dispatch(&self, _provider: ProviderId, operation: &str, _model: &str) {
        self.push("dispatch", operation);
    }

    fn on_success(&self, _provider: ProviderId, operation: &str, _token_count: TokenCount) {
        self.push("success", operation);
    }

    fn on_failure(&self, _provider: ProviderId, operation: &str, _error: &ChatError) {
        self.push("failure", operation);
    }
}
