//! Gemini transport trait and reqwest-based HTTP implementation.

use reqwest::Client;

use crate::adapters::PayloadStream;
use crate::adapters::http::{endpoint, payloads, read_body, send};
use crate::{ProviderError, ProviderFuture, ProviderId, SecretString};

use super::types::GeminiRequest;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub trait GeminiTransport: Send + Sync + std::fmt::Debug {
    fn complete<'a>(
        &'a self,
        request: GeminiRequest,
    ) -> ProviderFuture<'a, Result<String, ProviderError>>;

    fn stream<'a>(
        &'a self,
        request: GeminiRequest,
    ) -> ProviderFuture<'a, Result<PayloadStream<'a>, ProviderError>>;

    fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<String, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct GeminiHttpTransport {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl GeminiHttpTransport {
    pub fn new(client: Client, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: GEMINI_BASE_URL.to_string(),
            api_key,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn model_endpoint(&self, model: &str, method: &str) -> String {
        let model = model.trim_start_matches("models/");
        endpoint(&self.base_url, &format!("models/{model}:{method}"))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("x-goog-api-key", self.api_key.expose())
    }
}

impl GeminiTransport for GeminiHttpTransport {
    fn complete<'a>(
        &'a self,
        request: GeminiRequest,
    ) -> ProviderFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let builder = self
                .client
                .post(self.model_endpoint(&request.model, "generateContent"))
                .json(&request);
            let response = send(ProviderId::Gemini, self.authorize(builder)).await?;
            read_body(response).await
        })
    }

    fn stream<'a>(
        &'a self,
        request: GeminiRequest,
    ) -> ProviderFuture<'a, Result<PayloadStream<'a>, ProviderError>> {
        Box::pin(async move {
            let builder = self
                .client
                .post(self.model_endpoint(&request.model, "streamGenerateContent"))
                .query(&[("alt", "sse")])
                .json(&request);
            let response = send(ProviderId::Gemini, self.authorize(builder)).await?;
            Ok(payloads(response))
        })
    }

    fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let builder = self.client.get(endpoint(&self.base_url, "models"));
            let response = send(ProviderId::Gemini, self.authorize(builder)).await?;
            read_body(response).await
        })
    }
}
