use std::future::Future;
use std::pin::Pin;

use crate::{BoxedEventStream, ChatRequest, ModelResponse, ProviderError, ProviderId};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Vendor adapter. Translates the neutral request into one wire call.
///
/// Adapters hold no per-conversation state; settings, rate limiting and
/// history belong to the chat client that drives them.
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Model used when the caller never set one.
    fn default_model(&self) -> &str;

    fn complete<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>>;

    fn stream<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>>;

    fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>>;
}
