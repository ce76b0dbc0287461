//! OpenAI transport trait and reqwest-based HTTP implementation.

use reqwest::Client;

use crate::adapters::PayloadStream;
use crate::adapters::http::{endpoint, payloads, read_body, send};
use crate::{ProviderError, ProviderFuture, ProviderId, SecretString};

use super::types::OpenAiRequest;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Moves serialized requests and raw JSON payloads; parsing stays in the provider.
pub trait OpenAiTransport: Send + Sync + std::fmt::Debug {
    fn complete<'a>(
        &'a self,
        request: OpenAiRequest,
    ) -> ProviderFuture<'a, Result<String, ProviderError>>;

    fn stream<'a>(
        &'a self,
        request: OpenAiRequest,
    ) -> ProviderFuture<'a, Result<PayloadStream<'a>, ProviderError>>;

    fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<String, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct OpenAiHttpTransport {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl OpenAiHttpTransport {
    pub fn new(client: Client, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: OPENAI_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Points the transport at an OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn post(&self, request: &OpenAiRequest) -> reqwest::RequestBuilder {
        self.client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(self.api_key.expose())
            .json(request)
    }
}

impl OpenAiTransport for OpenAiHttpTransport {
    fn complete<'a>(
        &'a self,
        request: OpenAiRequest,
    ) -> ProviderFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let response = send(ProviderId::OpenAi, self.post(&request)).await?;
            read_body(response).await
        })
    }

    fn stream<'a>(
        &'a self,
        mut request: OpenAiRequest,
    ) -> ProviderFuture<'a, Result<PayloadStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.stream = true;
            let response = send(ProviderId::OpenAi, self.post(&request)).await?;
            Ok(payloads(response))
        })
    }

    fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let builder = self
                .client
                .get(endpoint(&self.base_url, "models"))
                .bearer_auth(self.api_key.expose());
            let response = send(ProviderId::OpenAi, builder).await?;
            read_body(response).await
        })
    }
}
