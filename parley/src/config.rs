//! Client configuration as loaded from a config file or built in code.
//!
//! ```rust
//! use parley::{ClientConfig, LlmKind};
//!
//! let config = ClientConfig::new(LlmKind::Gemini, "key")
//!     .with_model("gemini-2.0-flash")
//!     .with_limit(30);
//!
//! assert_eq!(config.limit, Some(30));
//! assert_eq!("chatgpt".parse::<LlmKind>(), Ok(LlmKind::ChatGpt));
//! assert!("".parse::<LlmKind>().is_err());
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use pcommon::ModelConfig;
use pprovider::ProviderId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmKind {
    ChatGpt,
    Gemini,
    Anthropic,
}

impl LlmKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChatGpt => "ChatGPT",
            Self::Gemini => "Gemini",
            Self::Anthropic => "Anthropic",
        }
    }

    pub fn provider_id(self) -> ProviderId {
        match self {
            Self::ChatGpt => ProviderId::OpenAi,
            Self::Gemini => ProviderId::Gemini,
            Self::Anthropic => ProviderId::Anthropic,
        }
    }
}

impl Display for LlmKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LlmKind> for ProviderId {
    fn from(kind: LlmKind) -> Self {
        kind.provider_id()
    }
}

impl FromStr for LlmKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::new(ConfigErrorKind::EmptyLlm, "empty LLM name"));
        }

        match value.to_ascii_lowercase().as_str() {
            "chatgpt" | "openai" => Ok(Self::ChatGpt),
            "gemini" | "google" => Ok(Self::Gemini),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            _ => Err(ConfigError::new(
                ConfigErrorKind::UnsupportedLlm,
                format!("unsupported LLM: {value}"),
            )),
        }
    }
}

impl Serialize for LlmKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LlmKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Everything needed to build a [`pchat::Client`] for one vendor.
///
/// Empty strings for `endpoint` and `proxy` mean "not set". `timeout` is in
/// whole seconds when deserialized and bounds each HTTP request.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub llm: LlmKind,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Requests per minute. Absent means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "ModelConfig::is_empty")]
    pub model_config: ModelConfig,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "duration_secs"
    )]
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(llm: LlmKind, api_key: impl Into<String>) -> Self {
        Self {
            llm,
            api_key: api_key.into(),
            endpoint: None,
            proxy: None,
            limit: None,
            model: None,
            model_config: ModelConfig::default(),
            timeout: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_limit(mut self, requests_per_minute: u32) -> Self {
        self.limit = Some(requests_per_minute);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_model_config(mut self, model_config: ModelConfig) -> Self {
        self.model_config = model_config;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn endpoint(&self) -> Option<&str> {
        non_blank(self.endpoint.as_deref())
    }

    pub(crate) fn proxy(&self) -> Option<&str> {
        non_blank(self.proxy.as_deref())
    }

    /// The explicit `model` wins over `model_config.model`.
    pub(crate) fn resolved_model(&self) -> Option<&str> {
        non_blank(self.model.as_deref()).or(non_blank(self.model_config.model.as_deref()))
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("llm", &self.llm)
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("proxy", &self.proxy)
            .field("limit", &self.limit)
            .field("model", &self.model)
            .field("model_config", &self.model_config)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_u64(duration.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigErrorKind {
    EmptyLlm,
    UnsupportedLlm,
    MissingApiKey,
    InvalidProxy,
    HttpClient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ConfigError {}
