//! Anthropic transport trait and reqwest-based HTTP implementation.

use reqwest::Client;

use crate::adapters::PayloadStream;
use crate::adapters::http::{endpoint, payloads, read_body, send};
use crate::{ProviderError, ProviderFuture, ProviderId, SecretString};

use super::types::AnthropicRequest;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub trait AnthropicTransport: Send + Sync + std::fmt::Debug {
    fn complete<'a>(
        &'a self,
        request: AnthropicRequest,
    ) -> ProviderFuture<'a, Result<String, ProviderError>>;

    fn stream<'a>(
        &'a self,
        request: AnthropicRequest,
    ) -> ProviderFuture<'a, Result<PayloadStream<'a>, ProviderError>>;

    fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<String, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct AnthropicHttpTransport {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl AnthropicHttpTransport {
    pub fn new(client: Client, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: ANTHROPIC_BASE_URL.to_string(),
            api_key,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
    }
}

impl AnthropicTransport for AnthropicHttpTransport {
    fn complete<'a>(
        &'a self,
        request: AnthropicRequest,
    ) -> ProviderFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let builder = self
                .client
                .post(endpoint(&self.base_url, "messages"))
                .json(&request);
            let response = send(ProviderId::Anthropic, self.authorize(builder)).await?;
            read_body(response).await
        })
    }

    fn stream<'a>(
        &'a self,
        mut request: AnthropicRequest,
    ) -> ProviderFuture<'a, Result<PayloadStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.stream = true;
            let builder = self
                .client
                .post(endpoint(&self.base_url, "messages"))
                .json(&request);
            let response = send(ProviderId::Anthropic, self.authorize(builder)).await?;
            Ok(payloads(response))
        })
    }

    fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let builder = self.client.get(endpoint(&self.base_url, "models"));
            let response = send(ProviderId::Anthropic, self.authorize(builder)).await?;
            read_body(response).await
        })
    }
}
