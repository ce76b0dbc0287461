//! The chat client: settings, admission control and dispatch.
//!
//! Every dispatch runs in the same order: closed check, request build and
//! validation, limiter wait, then the adapter call raced against the context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use pcommon::{Context, ModelConfig};
use pprovider::{
    ChatRequest, Content, FunctionCallingMode, FunctionDeclaration, JsonResponse, JsonSchema,
    Limiter, ModelProvider, ModelResponse, Part, ProviderId,
};
use tokio::time::Instant;

use crate::hooks::{OPERATION_CHAT, OPERATION_CHAT_STREAM, OPERATION_LIST_MODELS};
use crate::{ChatError, ChatHooks, ChatStream, NoopChatHooks, Session};

/// Cheap to clone; clones share settings, limiter and closed state.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    provider: Arc<dyn ModelProvider>,
    settings: RwLock<Settings>,
    limiter: RwLock<Arc<Limiter>>,
    hooks: Arc<dyn ChatHooks>,
    closed: AtomicBool,
}

#[derive(Debug, Clone, Default)]
struct Settings {
    model: Option<String>,
    config: ModelConfig,
    functions: Vec<FunctionDeclaration>,
    function_calling_mode: FunctionCallingMode,
    json_response: Option<JsonResponse>,
}

pub struct ClientBuilder {
    provider: Arc<dyn ModelProvider>,
    settings: Settings,
    limiter: Arc<Limiter>,
    hooks: Arc<dyn ChatHooks>,
}

impl ClientBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.settings.model = Some(model.into());
        self
    }

    pub fn config(mut self, config: ModelConfig) -> Self {
        apply_config(&mut self.settings, &config);
        self
    }

    /// `None` disables rate limiting.
    pub fn limit(mut self, requests_per_minute: Option<u32>) -> Self {
        self.limiter = Arc::new(limiter_for(requests_per_minute));
        self
    }

    /// Shares one limiter between several clients.
    pub fn limiter(mut self, limiter: Arc<Limiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn ChatHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> Client {
        Client {
            inner: Arc::new(ClientInner {
                provider: self.provider,
                settings: RwLock::new(self.settings),
                limiter: RwLock::new(self.limiter),
                hooks: self.hooks,
                closed: AtomicBool::new(false),
            }),
        }
    }
}

impl Client {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self::builder(provider).build()
    }

    pub fn builder(provider: Arc<dyn ModelProvider>) -> ClientBuilder {
        ClientBuilder {
            provider,
            settings: Settings::default(),
            limiter: Arc::new(Limiter::unbounded()),
            hooks: Arc::new(NoopChatHooks),
        }
    }

    pub fn provider_id(&self) -> ProviderId {
        self.inner.provider.id()
    }

    /// The configured model, or the adapter default.
    pub fn model(&self) -> String {
        self.settings()
            .model
            .clone()
            .unwrap_or_else(|| self.inner.provider.default_model().to_string())
    }

    pub fn model_config(&self) -> ModelConfig {
        self.settings().config.clone()
    }

    pub fn set_model(&self, model: impl Into<String>) {
        self.settings_mut().model = Some(model.into());
    }

    pub fn set_count(&self, count: u32) {
        self.settings_mut().config.count = Some(count);
    }

    pub fn set_max_tokens(&self, max_tokens: u32) {
        self.settings_mut().config.max_tokens = Some(max_tokens);
    }

    pub fn set_temperature(&self, temperature: f32) {
        self.settings_mut().config.temperature = Some(temperature);
    }

    pub fn set_top_p(&self, top_p: f32) {
        self.settings_mut().config.top_p = Some(top_p);
    }

    pub fn set_thinking(&self, enabled: bool) {
        self.settings_mut().config.thinking = Some(enabled);
    }

    /// Enables JSON output, constrained by `schema` when one is given.
    pub fn set_json_response(&self, schema: Option<JsonSchema>) {
        let mut settings = self.settings_mut();
        settings.config.json_response = Some(true);
        settings.json_response = Some(JsonResponse { schema });
    }

    pub fn disable_json_response(&self) {
        let mut settings = self.settings_mut();
        settings.config.json_response = Some(false);
        settings.json_response = None;
    }

    pub fn set_function_call(&self, functions: Vec<FunctionDeclaration>, mode: FunctionCallingMode) {
        let mut settings = self.settings_mut();
        settings.functions = functions;
        settings.function_calling_mode = mode;
    }

    /// Overlays every field set in `config`; unset fields keep their value.
    pub fn apply_model_config(&self, config: &ModelConfig) {
        apply_config(&mut self.settings_mut(), config);
    }

    /// Replaces the limiter, carrying unspent tokens over so a rate change
    /// never grants a fresh burst. Calls already waiting keep the old one.
    pub fn set_limit(&self, requests_per_minute: Option<u32>) {
        let mut limiter = self
            .inner
            .limiter
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *limiter = Arc::new(limiter.rescaled(requests_per_minute));
    }

    /// Requests per minute, or `None` when unbounded.
    pub fn limit(&self) -> Option<u32> {
        self.limiter().limit()
    }

    pub fn session(&self) -> Session {
        Session::new(self.clone())
    }

    /// Idempotent. Every dispatch after this fails with `ClientClosed`.
    pub fn close(&self) -> Result<(), ChatError> {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(provider = %self.provider_id(), "chat client closed");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub async fn chat(&self, ctx: &Context, parts: Vec<Part>) -> Result<ModelResponse, ChatError> {
        self.complete(ctx, Vec::new(), parts, false).await
    }

    /// Streams one turn without a session; the finalized turn is available
    /// from [`ChatStream::turn`] once the stream ends.
    pub async fn chat_stream(
        &self,
        ctx: &Context,
        parts: Vec<Part>,
    ) -> Result<ChatStream<'_>, ChatError> {
        self.open_stream(ctx, parts, None).await
    }

    pub async fn list_models(&self, ctx: &Context) -> Result<Vec<String>, ChatError> {
        self.ensure_open()?;
        self.admit(ctx, OPERATION_LIST_MODELS).await?;

        let provider = self.provider_id();
        let outcome = match ctx.run(self.inner.provider.list_models()).await {
            Ok(result) => result.map_err(ChatError::from),
            Err(err) => Err(ChatError::canceled(err)),
        };

        match &outcome {
            Ok(_) => self
                .inner
                .hooks
                .on_success(provider, OPERATION_LIST_MODELS, Default::default()),
            Err(err) => self.inner.hooks.on_failure(provider, OPERATION_LIST_MODELS, err),
        }
        outcome
    }

    pub(crate) async fn complete(
        &self,
        ctx: &Context,
        history: Vec<Content>,
        parts: Vec<Part>,
        single_candidate: bool,
    ) -> Result<ModelResponse, ChatError> {
        self.ensure_open()?;
        let request = self.request(history, parts, single_candidate)?;
        self.admit(ctx, OPERATION_CHAT).await?;

        let provider = self.provider_id();
        self.inner.hooks.on_dispatch(provider, OPERATION_CHAT, &request.model);
        tracing::debug!(provider = %provider, model = %request.model, "dispatching chat");

        let outcome = match ctx.run(self.inner.provider.complete(request)).await {
            Ok(result) => result.map_err(ChatError::from),
            Err(err) => Err(ChatError::canceled(err)),
        };

        match &outcome {
            Ok(response) => {
                self.inner
                    .hooks
                    .on_success(provider, OPERATION_CHAT, response.token_count)
            }
            Err(err) => self.inner.hooks.on_failure(provider, OPERATION_CHAT, err),
        }
        outcome
    }

    /// Opens a stream. With a history, the user turn is appended once the
    /// limiter admits the call and stays even if opening the stream fails.
    pub(crate) async fn open_stream<'a>(
        &'a self,
        ctx: &Context,
        parts: Vec<Part>,
        mut history: Option<&'a mut Vec<Content>>,
    ) -> Result<ChatStream<'a>, ChatError> {
        self.ensure_open()?;
        let prior = history.as_deref().cloned().unwrap_or_default();
        let single_candidate = history.is_some();
        let request = self.request(prior, parts.clone(), single_candidate)?;
        self.admit(ctx, OPERATION_CHAT_STREAM).await?;

        if let Some(history) = history.as_deref_mut() {
            history.push(Content::user(parts));
        }

        let provider = self.provider_id();
        self.inner
            .hooks
            .on_dispatch(provider, OPERATION_CHAT_STREAM, &request.model);
        tracing::debug!(provider = %provider, model = %request.model, "opening chat stream");

        let opened = match ctx.run(self.inner.provider.stream(request)).await {
            Ok(result) => result.map_err(ChatError::from),
            Err(err) => Err(ChatError::canceled(err)),
        };

        match opened {
            Ok(events) => Ok(ChatStream::new(self, ctx.clone(), events, history)),
            Err(err) => {
                self.inner.hooks.on_failure(provider, OPERATION_CHAT_STREAM, &err);
                Err(err)
            }
        }
    }

    pub(crate) fn hooks(&self) -> &dyn ChatHooks {
        self.inner.hooks.as_ref()
    }

    fn ensure_open(&self) -> Result<(), ChatError> {
        if self.is_closed() {
            return Err(ChatError::client_closed());
        }
        Ok(())
    }

    fn request(
        &self,
        history: Vec<Content>,
        parts: Vec<Part>,
        single_candidate: bool,
    ) -> Result<ChatRequest, ChatError> {
        let settings = self.settings().clone();
        let mut config = settings.config;
        if single_candidate {
            config.count = None;
        }

        let mut request = ChatRequest::new(
            settings
                .model
                .unwrap_or_else(|| self.inner.provider.default_model().to_string()),
            parts,
        )
        .with_history(history)
        .with_config(config)
        .with_functions(settings.functions, settings.function_calling_mode);
        request.json_response = settings.json_response;

        request.validate().map_err(ChatError::rejected)?;
        Ok(request)
    }

    async fn admit(&self, ctx: &Context, operation: &str) -> Result<(), ChatError> {
        let limiter = self.limiter();
        let started = Instant::now();
        limiter
            .wait(ctx)
            .await
            .map_err(ChatError::rate_limit_canceled)
            .inspect_err(|err| self.inner.hooks.on_failure(self.provider_id(), operation, err))?;

        self.inner
            .hooks
            .on_admitted(self.provider_id(), operation, started.elapsed());
        Ok(())
    }

    fn limiter(&self) -> Arc<Limiter> {
        self.inner
            .limiter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn settings(&self) -> RwLockReadGuard<'_, Settings> {
        self.inner.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn settings_mut(&self) -> RwLockWriteGuard<'_, Settings> {
        self.inner.settings.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("provider", &self.provider_id())
            .field("model", &self.model())
            .field("limit", &self.limit())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn limiter_for(requests_per_minute: Option<u32>) -> Limiter {
    match requests_per_minute {
        Some(rpm) => Limiter::per_minute(rpm),
        None => Limiter::unbounded(),
    }
}

fn apply_config(settings: &mut Settings, config: &ModelConfig) {
    if let Some(model) = &config.model {
        settings.model = Some(model.clone());
    }

    settings.config.merge(config);
    settings.config.model = None;

    match config.json_response {
        Some(true) if settings.json_response.is_none() => {
            settings.json_response = Some(JsonResponse::plain());
        }
        Some(false) => settings.json_response = None,
        _ => {}
    }
}
