//! Stable construction surface: config in, ready chat client out.

use std::sync::Arc;

use pchat::{ChatHooks, Client, NoopChatHooks};
use pprovider::{ModelProvider, SecretString};
use reqwest::Proxy;

use crate::{ClientConfig, ConfigError, ConfigErrorKind, LlmKind};

pub fn build_client(config: &ClientConfig) -> Result<Client, ConfigError> {
    build_client_with_hooks(config, Arc::new(NoopChatHooks))
}

pub fn build_client_with_hooks(
    config: &ClientConfig,
    hooks: Arc<dyn ChatHooks>,
) -> Result<Client, ConfigError> {
    let provider = build_provider(config)?;

    let mut builder = Client::builder(provider)
        .limit(config.limit)
        .config(config.model_config.clone())
        .hooks(hooks);
    if let Some(model) = config.resolved_model() {
        builder = builder.model(model);
    }

    tracing::debug!(
        llm = %config.llm,
        limit = ?config.limit,
        endpoint = config.endpoint().unwrap_or("default"),
        "built chat client"
    );
    Ok(builder.build())
}

/// The bare adapter, for callers that assemble their own [`Client`].
pub fn build_provider(config: &ClientConfig) -> Result<Arc<dyn ModelProvider>, ConfigError> {
    let api_key = SecretString::api_key(config.api_key.trim())
        .map_err(|err| ConfigError::new(ConfigErrorKind::MissingApiKey, err.message))?;
    let http = http_client(config)?;

    match config.llm {
        LlmKind::ChatGpt => build_openai_provider(http, api_key, config.endpoint()),
        LlmKind::Anthropic => build_anthropic_provider(http, api_key, config.endpoint()),
        LlmKind::Gemini => build_gemini_provider(http, api_key, config.endpoint()),
    }
}

fn http_client(config: &ClientConfig) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder();
    if let Some(proxy) = config.proxy() {
        let proxy = Proxy::all(proxy).map_err(|err| {
            ConfigError::new(ConfigErrorKind::InvalidProxy, format!("{proxy}: {err}"))
        })?;
        builder = builder.proxy(proxy);
    }
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|err| ConfigError::new(ConfigErrorKind::HttpClient, err.to_string()))
}

#[cfg(feature = "provider-openai")]
fn build_openai_provider(
    http: reqwest::Client,
    api_key: SecretString,
    endpoint: Option<&str>,
) -> Result<Arc<dyn ModelProvider>, ConfigError> {
    use pprovider::adapters::openai::{OpenAiHttpTransport, OpenAiProvider};

    let mut transport = OpenAiHttpTransport::new(http, api_key);
    if let Some(endpoint) = endpoint {
        transport = transport.with_base_url(endpoint);
    }
    Ok(Arc::new(OpenAiProvider::new(Arc::new(transport))))
}

#[cfg(not(feature = "provider-openai"))]
fn build_openai_provider(
    _http: reqwest::Client,
    _api_key: SecretString,
    _endpoint: Option<&str>,
) -> Result<Arc<dyn ModelProvider>, ConfigError> {
    Err(disabled(LlmKind::ChatGpt, "provider-openai"))
}

#[cfg(feature = "provider-anthropic")]
fn build_anthropic_provider(
    http: reqwest::Client,
    api_key: SecretString,
    endpoint: Option<&str>,
) -> Result<Arc<dyn ModelProvider>, ConfigError> {
    use pprovider::adapters::anthropic::{AnthropicHttpTransport, AnthropicProvider};

    let mut transport = AnthropicHttpTransport::new(http, api_key);
    if let Some(endpoint) = endpoint {
        transport = transport.with_base_url(endpoint);
    }
    Ok(Arc::new(AnthropicProvider::new(Arc::new(transport))))
}

#[cfg(not(feature = "provider-anthropic"))]
fn build_anthropic_provider(
    _http: reqwest::Client,
    _api_key: SecretString,
    _endpoint: Option<&str>,
) -> Result<Arc<dyn ModelProvider>, ConfigError> {
    Err(disabled(LlmKind::Anthropic, "provider-anthropic"))
}

#[cfg(feature = "provider-gemini")]
fn build_gemini_provider(
    http: reqwest::Client,
    api_key: SecretString,
    endpoint: Option<&str>,
) -> Result<Arc<dyn ModelProvider>, ConfigError> {
    use pprovider::adapters::gemini::{GeminiHttpTransport, GeminiProvider};

    let mut transport = GeminiHttpTransport::new(http, api_key);
    if let Some(endpoint) = endpoint {
        transport = transport.with_base_url(endpoint);
    }
    Ok(Arc::new(GeminiProvider::new(Arc::new(transport))))
}

#[cfg(not(feature = "provider-gemini"))]
fn build_gemini_provider(
    _http: reqwest::Client,
    _api_key: SecretString,
    _endpoint: Option<&str>,
) -> Result<Arc<dyn ModelProvider>, ConfigError> {
    Err(disabled(LlmKind::Gemini, "provider-gemini"))
}

#[cfg(not(all(
    feature = "provider-openai",
    feature = "provider-anthropic",
    feature = "provider-gemini"
)))]
fn disabled(llm: LlmKind, feature: &str) -> ConfigError {
    ConfigError::new(
        ConfigErrorKind::UnsupportedLlm,
        format!("{llm} requires the {feature} feature of parley"),
    )
}
