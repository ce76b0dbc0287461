mod support;

use std::sync::Arc;
use std::time::Duration;

use pchat::{ChatErrorKind, Client};
use pcommon::{Context, ContextError, ModelConfig};
use pprovider::{
    ChatResponse, FunctionCallingMode, FunctionDeclaration, JsonSchema, Part, ProviderError,
    Schema, StreamEvent, StreamChunk,
};
use support::{RecordingHooks, Reply, Script, ScriptedProvider, ok_chunks};

#[tokio::test]
async fn chat_sends_current_settings_and_default_model() {
    let provider = ScriptedProvider::new();
    provider.reply_text("hi there");
    let client = Client::new(provider.clone());
    client.set_max_tokens(128);
    client.set_temperature(0.0);
    client.set_count(2);
    client.set_thinking(true);

    let response = client
        .chat(&Context::background(), vec![Part::text("hello")])
        .await
        .expect("chat should succeed");
    assert_eq!(response.results(), vec!["hi there"]);

    let request = &provider.requests()[0];
    assert_eq!(request.model, "scripted-model");
    assert!(request.history.is_empty());
    assert_eq!(request.parts, vec![Part::text("hello")]);
    assert_eq!(request.config.max_tokens, Some(128));
    assert_eq!(request.config.temperature, Some(0.0));
    assert_eq!(request.config.count, Some(2));
    assert_eq!(request.config.thinking, Some(true));
    assert_eq!(request.config.top_p, None);
}

#[tokio::test]
async fn model_config_json_mode_and_functions_reach_the_request() {
    let provider = ScriptedProvider::new();
    provider.reply_text("{}").reply_text("{}");
    let client = Client::builder(provider.clone())
        .model("gpt-4o")
        .config(ModelConfig::default().with_top_p(0.9))
        .build();

    client.apply_model_config(&ModelConfig::default().with_model("gpt-4.1").with_max_tokens(64));
    client.set_json_response(Some(JsonSchema::new("answer", "", Schema::object())));
    client.set_function_call(
        vec![FunctionDeclaration::new("lookup", "find", Schema::object())],
        FunctionCallingMode::Auto,
    );

    let ctx = Context::background();
    client
        .chat(&ctx, vec![Part::text("q")])
        .await
        .expect("chat should succeed");

    client.disable_json_response();
    client
        .chat(&ctx, vec![Part::text("q")])
        .await
        .expect("chat should succeed");

    let requests = provider.requests();
    assert_eq!(requests[0].model, "gpt-4.1");
    assert_eq!(requests[0].config.top_p, Some(0.9));
    assert_eq!(requests[0].config.max_tokens, Some(64));
    assert_eq!(requests[0].functions.len(), 1);
    assert_eq!(requests[0].function_calling_mode, FunctionCallingMode::Auto);
    let schema = requests[0]
        .json_response
        .as_ref()
        .and_then(|json| json.schema.as_ref())
        .expect("schema should be sent");
    assert_eq!(schema.name, "answer");
    assert!(requests[1].json_response.is_none());
}

#[tokio::test]
async fn closed_client_rejects_every_dispatch() {
    let provider = ScriptedProvider::new();
    let client = Client::new(provider.clone());
    let ctx = Context::background();

    client.close().expect("close should succeed");
    client.close().expect("second close should also succeed");
    assert!(client.is_closed());

    let chat = client.chat(&ctx, vec![Part::text("x")]).await.expect_err("closed");
    let stream = client
        .chat_stream(&ctx, vec![Part::text("x")])
        .await
        .expect_err("closed");
    let models = client.list_models(&ctx).await.expect_err("closed");
    let mut session = client.session();
    let session_chat = session.chat(&ctx, vec![Part::text("x")]).await.expect_err("closed");

    for err in [chat, stream, models, session_chat] {
        assert_eq!(err.kind, ChatErrorKind::ClientClosed);
    }
    assert!(session.history().is_empty());
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn invalid_settings_fail_before_dispatch() {
    let provider = ScriptedProvider::new();
    let client = Client::new(provider.clone());
    client.set_temperature(3.0);

    let err = client
        .chat(&Context::background(), vec![Part::text("x")])
        .await
        .expect_err("temperature out of range");
    assert_eq!(err.kind, ChatErrorKind::InvalidRequest);

    client.set_temperature(1.0);
    let err = client
        .chat(&Context::background(), Vec::new())
        .await
        .expect_err("no parts");
    assert_eq!(err.kind, ChatErrorKind::InvalidRequest);
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn vendor_errors_pass_through_unchanged() {
    let provider = ScriptedProvider::new();
    let original = ProviderError::rate_limited("quota");
    provider.reply(Reply::Complete(Err(original.clone())));
    let client = Client::new(provider);

    let err = client
        .chat(&Context::background(), vec![Part::text("x")])
        .await
        .expect_err("vendor failure");
    assert_eq!(err.kind, ChatErrorKind::Transport);
    assert_eq!(err.provider_error(), Some(&original));
    assert!(err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn canceled_context_fails_at_the_limiter_without_dispatch() {
    let provider = ScriptedProvider::new();
    let client = Client::builder(provider.clone()).limit(Some(60)).build();
    let (ctx, handle) = Context::background().with_cancel();
    handle.cancel();

    let err = client
        .chat(&ctx, vec![Part::text("x")])
        .await
        .expect_err("canceled before admission");
    assert_eq!(err.kind, ChatErrorKind::RateLimitCanceled);
    assert_eq!(err.context_error(), Some(ContextError::Canceled));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn drained_limiter_times_out_the_next_call() {
    let provider = ScriptedProvider::new();
    provider.reply_text("first");
    let client = Client::builder(provider.clone()).limit(Some(1)).build();

    client
        .chat(&Context::background(), vec![Part::text("x")])
        .await
        .expect("first call fits the burst");

    let ctx = Context::background().with_timeout(Duration::from_secs(5));
    let err = client
        .chat(&ctx, vec![Part::text("x")])
        .await
        .expect_err("second call must wait a minute");
    assert_eq!(err.kind, ChatErrorKind::RateLimitCanceled);
    assert_eq!(err.context_error(), Some(ContextError::DeadlineExceeded));
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn context_deadline_aborts_an_outstanding_call() {
    let provider = ScriptedProvider::new();
    provider.reply(Reply::Hang);
    let client = Client::new(provider.clone());

    let ctx = Context::background().with_timeout(Duration::from_secs(30));
    let err = client
        .chat(&ctx, vec![Part::text("x")])
        .await
        .expect_err("hanging call should time out");

    assert_eq!(err.kind, ChatErrorKind::Canceled);
    assert_eq!(err.context_error(), Some(ContextError::DeadlineExceeded));
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn set_limit_replaces_the_limiter() {
    let client = Client::new(ScriptedProvider::new());
    assert_eq!(client.limit(), None);

    client.set_limit(Some(0));
    assert_eq!(client.limit(), Some(1));

    client.set_limit(None);
    assert_eq!(client.limit(), None);
}

#[tokio::test(start_paused = true)]
async fn raising_the_limit_does_not_refill_the_bucket() {
    let provider = ScriptedProvider::new();
    provider.reply_text("first").reply_text("second");
    let client = Client::builder(provider.clone()).limit(Some(1)).build();

    client
        .chat(&Context::background(), vec![Part::text("x")])
        .await
        .expect("first call fits the burst");

    client.set_limit(Some(60));
    let ctx = Context::background().with_timeout(Duration::from_millis(500));
    let err = client
        .chat(&ctx, vec![Part::text("x")])
        .await
        .expect_err("no token is available yet");
    assert_eq!(err.kind, ChatErrorKind::RateLimitCanceled);

    client
        .chat(&Context::background(), vec![Part::text("x")])
        .await
        .expect("a token refills within a second");
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn direct_stream_exposes_the_finalized_turn() {
    let provider = ScriptedProvider::new();
    let mut chunks = ok_chunks(&["Hel", "lo"]);
    chunks.push(Ok(StreamChunk::new(vec![StreamEvent::usage(Some(4), Some(2))])));
    provider.script(Script::Chunks(chunks));
    let client = Client::new(provider.clone());
    client.set_count(3);

    let mut stream = client
        .chat_stream(&Context::background(), vec![Part::text("hi")])
        .await
        .expect("stream should open");
    assert!(stream.turn().is_none());

    let turn = stream.collect_turn().await.expect("stream should finish");
    assert_eq!(turn.parts, vec![Part::text("Hello")]);
    assert_eq!(stream.turn(), Some(&turn));
    assert_eq!(stream.token_count().total, 6);

    assert_eq!(provider.requests()[0].config.count, Some(3));
}

#[tokio::test]
async fn hooks_observe_admission_dispatch_and_outcome() {
    let provider = ScriptedProvider::new();
    provider
        .reply_text("ok")
        .reply(Reply::Complete(Err(ProviderError::unavailable("down"))));
    provider.script(Script::Chunks(ok_chunks(&["a"])));
    let hooks = Arc::new(RecordingHooks::default());
    let client = Client::builder(provider).hooks(hooks.clone()).build();
    let ctx = Context::background();

    client.chat(&ctx, vec![Part::text("x")]).await.expect("first call succeeds");
    client.chat(&ctx, vec![Part::text("x")]).await.expect_err("second call fails");
    let mut stream = client
        .chat_stream(&ctx, vec![Part::text("x")])
        .await
        .expect("stream should open");
    stream.collect_turn().await.expect("stream should finish");
    client.list_models(&ctx).await.expect("models should list");

    assert_eq!(
        hooks.events(),
        vec![
            "admitted:chat",
            "dispatch:chat",
            "success:chat",
            "admitted:chat",
            "dispatch:chat",
            "failure:chat",
            "admitted:chat_stream",
            "dispatch:chat_stream",
            "success:chat_stream",
            "admitted:list_models",
            "success:list_models",
        ]
    );
}

#[tokio::test]
async fn list_models_returns_adapter_names() {
    let client = Client::new(ScriptedProvider::new());
    let models = client
        .list_models(&Context::background())
        .await
        .expect("models should list");
    assert_eq!(models, vec!["scripted-model".to_string()]);
}
