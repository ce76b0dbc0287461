#![cfg(all(
    feature = "provider-openai",
    feature = "provider-anthropic",
    feature = "provider-gemini"
))]

use std::time::Duration;

use mockito::Matcher;
use parley::prelude::*;
use parley::{ConfigErrorKind, ProviderId, build_provider};
use serde_json::json;

fn gemini_reply(text: &str) -> String {
    json!({
        "candidates": [{"index": 0, "content": {"role": "model", "parts": [{"text": text}]}}],
        "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 2, "totalTokenCount": 5}
    })
    .to_string()
}

#[tokio::test]
async fn gemini_client_uses_endpoint_model_and_settings() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-1.5-pro:generateContent")
        .match_header("x-goog-api-key", "gem-key")
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": {"temperature": 0.0, "maxOutputTokens": 64}
        })))
        .with_status(200)
        .with_body(gemini_reply("bonjour"))
        .create_async()
        .await;

    let config = ClientConfig::new(LlmKind::Gemini, "gem-key")
        .with_endpoint(server.url())
        .with_model("gemini-1.5-pro")
        .with_model_config(ModelConfig::default().with_temperature(0.0).with_max_tokens(64))
        .with_timeout(Duration::from_secs(10));
    let client = build_client(&config).expect("client should build");

    assert_eq!(client.provider_id(), ProviderId::Gemini);
    assert_eq!(client.model(), "gemini-1.5-pro");
    assert_eq!(client.limit(), None);

    let mut session = client.session();
    let reply = session
        .chat(&Context::background(), parts!["hello"])
        .await
        .expect("chat should succeed");

    mock.assert_async().await;
    assert_eq!(first_result(&reply).as_deref(), Some("bonjour"));
    assert_eq!(reply.token_count().total, 5);
    assert_eq!(session.history().len(), 2);
}

#[tokio::test]
async fn chatgpt_client_posts_to_the_configured_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer oa-key")
        .match_body(Matcher::PartialJson(json!({"model": "gpt-4o"})))
        .with_status(200)
        .with_body(
            json!({
                "model": "gpt-4o",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "pong"}}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let config = ClientConfig::new(LlmKind::ChatGpt, "oa-key")
        .with_endpoint(server.url())
        .with_model_config(ModelConfig::default().with_model("gpt-4o"))
        .with_limit(60);
    let client = build_client(&config).expect("client should build");
    assert_eq!(client.limit(), Some(60));

    let reply = client
        .chat(&Context::background(), text_parts(["ping"]))
        .await
        .expect("chat should succeed");

    mock.assert_async().await;
    assert_eq!(reply.results(), vec!["pong".to_string()]);
}

#[tokio::test]
async fn anthropic_client_lists_models() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/models")
        .match_header("x-api-key", "an-key")
        .with_status(200)
        .with_body(json!({"data": [{"id": "claude-3-5-haiku-latest"}]}).to_string())
        .create_async()
        .await;

    let config = ClientConfig::new(LlmKind::Anthropic, "an-key").with_endpoint(server.url());
    let client = build_client(&config).expect("client should build");

    let models = client
        .list_models(&Context::background())
        .await
        .expect("models should list");

    mock.assert_async().await;
    assert_eq!(models, vec!["claude-3-5-haiku-latest".to_string()]);
}

#[test]
fn blank_api_key_is_rejected() {
    let err = build_client(&ClientConfig::new(LlmKind::Gemini, "  "))
        .expect_err("blank key should fail");
    assert_eq!(err.kind, ConfigErrorKind::MissingApiKey);
}

#[test]
fn malformed_proxy_is_rejected() {
    let config = ClientConfig::new(LlmKind::ChatGpt, "k").with_proxy("::not a proxy::");
    let err = match build_provider(&config) {
        Ok(_) => panic!("bad proxy should fail"),
        Err(err) => err,
    };
    assert_eq!(err.kind, ConfigErrorKind::InvalidProxy);
}

#[test]
fn config_file_values_build_a_client() {
    let config: ClientConfig = serde_json::from_value(json!({
        "llm": "anthropic",
        "api_key": "k",
        "proxy": "",
        "model": "claude-3-5-sonnet-latest",
        "limit": 5
    }))
    .expect("config should deserialize");

    let client = build_client(&config).expect("client should build");
    assert_eq!(client.provider_id(), ProviderId::Anthropic);
    assert_eq!(client.model(), "claude-3-5-sonnet-latest");
    assert_eq!(client.limit(), Some(5));
}
