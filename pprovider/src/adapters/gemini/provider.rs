//! Gemini provider implementation over transport and shared models.

use std::sync::Arc;

use async_stream::try_stream;
use futures_util::StreamExt;

use crate::adapters::parse_payload;
use crate::{
    BoxedEventStream, ChatRequest, ModelProvider, ModelResponse, ProviderError, ProviderFuture,
    ProviderId,
};

use super::convert::{build_request, parse_response, translate_stream_chunk};
use super::transport::GeminiTransport;
use super::types::{GeminiModelList, GeminiRequest, GeminiResponse};

pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    transport: Arc<dyn GeminiTransport>,
    default_model: String,
}

impl GeminiProvider {
    pub fn new(transport: Arc<dyn GeminiTransport>) -> Self {
        Self {
            transport,
            default_model: GEMINI_DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn build_gemini_request(
        &self,
        request: &ChatRequest,
        stream: bool,
    ) -> Result<GeminiRequest, ProviderError> {
        build_request(request, stream)
    }
}

impl ModelProvider for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn complete<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let wire = build_request(&request, false)?;
            let payload = self.transport.complete(wire).await?;
            let (response, raw) = parse_payload::<GeminiResponse>(ProviderId::Gemini, &payload)?;
            Ok(parse_response(response, &request.model, raw))
        })
    }

    fn stream<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            let wire = build_request(&request, true)?;
            let mut payloads = self.transport.stream(wire).await?;

            let stream = try_stream! {
                while let Some(payload) = payloads.next().await {
                    let payload = payload?;
                    let (response, raw) =
                        parse_payload::<GeminiResponse>(ProviderId::Gemini, &payload)?;
                    let chunk = translate_stream_chunk(response, raw);
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
            let (list, _) = parse_payload::<GeminiModelList>(ProviderId::Gemini, &payload)?;
            Ok(list
                .models
                .into_iter()
                .map(|model| {
                    model
                        .name
                        .strip_prefix("models/")
                        .map(str::to_string)
                        .unwrap_or(model.name)
                })
                .collect())
        })
    }
}
