//! Anthropic provider implementation over transport and shared models.

use std::sync::Arc;

use async_stream::try_stream;
use futures_util::StreamExt;

use crate::adapters::parse_payload;
use crate::{
    BoxedEventStream, ChatRequest, ModelProvider, ModelResponse, ProviderError, ProviderFuture,
    ProviderId,
};

use super::convert::{StreamTranslator, build_request, parse_response};
use super::transport::AnthropicTransport;
use super::types::{AnthropicModelList, AnthropicResponse, AnthropicStreamEvent};

pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
/// The messages API requires `max_tokens`; this is sent when none is configured.
pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    transport: Arc<dyn AnthropicTransport>,
    default_model: String,
    default_max_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(transport: Arc<dyn AnthropicTransport>) -> Self {
        Self {
            transport,
            default_model: ANTHROPIC_DEFAULT_MODEL.to_string(),
            default_max_tokens: ANTHROPIC_DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_default_max_tokens(mut self, max_tokens: u32) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }
}

impl ModelProvider for AnthropicProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn complete<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let wire = build_request(&request, false, self.default_max_tokens)?;
            let payload = self.transport.complete(wire).await?;
            let (response, raw) =
                parse_payload::<AnthropicResponse>(ProviderId::Anthropic, &payload)?;
            Ok(parse_response(response, raw))
        })
    }

    fn stream<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            let wire = build_request(&request, true, self.default_max_tokens)?;
            let mut payloads = self.transport.stream(wire).await?;

            let stream = try_stream! {
                let mut translator = StreamTranslator::default();
                while let Some(payload) = payloads.next().await {
                    let payload = payload?;
                    let (event, raw) =
                        parse_payload::<AnthropicStreamEvent>(ProviderId::Anthropic, &payload)?;
                    let chunk = translator.translate(event, raw)?;
                    if !chunk.is_empty() {
                        yield chunk;
                    }
                }
            };

            Ok(Box::pin(stream) as BoxedEventStream<'a>)
        })
    }

    fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async move {
            let payload = self.transport.list_models().await?;
            let (list, _) = parse_payload::<AnthropicModelList>(ProviderId::Anthropic, &payload)?;
            Ok(list.data.into_iter().map(|model| model.id).collect())
        })
    }
}
