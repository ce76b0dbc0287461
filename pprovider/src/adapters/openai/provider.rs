//! OpenAI provider implementation over transport and shared models.

use std::sync::Arc;

use async_stream::try_stream;
use futures_util::StreamExt;

use crate::adapters::parse_payload;
use crate::{
    BoxedEventStream, ChatRequest, ModelProvider, ModelResponse, ProviderError, ProviderFuture,
    ProviderId,
};

use super::convert::{StreamTranslator, build_request, parse_response};
use super::transport::OpenAiTransport;
use super::types::{OpenAiModelList, OpenAiRequest, OpenAiResponse, OpenAiStreamResponse};

pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    transport: Arc<dyn OpenAiTransport>,
    default_model: String,
}

impl OpenAiProvider {
    pub fn new(transport: Arc<dyn OpenAiTransport>) -> Self {
        Self {
            transport,
            default_model: OPENAI_DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn build_openai_request(&self, request: &ChatRequest, stream: bool) -> OpenAiRequest {
        build_request(request, stream)
    }
}

impl ModelProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn complete<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let openai_request = build_request(&request, false);
            let payload = self.transport.complete(openai_request).await?;
            let (response, raw) = parse_payload::<OpenAiResponse>(ProviderId::OpenAi, &payload)?;
            Ok(parse_response(response, raw))
        })
    }

    fn stream<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            let openai_request = build_request(&request, true);
            let mut payloads = self.transport.stream(openai_request).await?;

            let stream = try_stream! {
                let mut translator = StreamTranslator::default();
                while let Some(payload) = payloads.next().await {
                    let payload = payload?;
                    let (chunk, raw) =
                        parse_payload::<OpenAiStreamResponse>(ProviderId::OpenAi, &payload)?;
                    let chunk = translator.translate(chunk, raw);
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
            let (list, _) = parse_payload::<OpenAiModelList>(ProviderId::OpenAi, &payload)?;
            Ok(list.data.into_iter().map(|model| model.id).collect())
        })
    }
}
