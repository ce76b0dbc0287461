//! Focused unit tests for Anthropic adapter internals.

#![cfg(test)]

use pcommon::ModelConfig;
use serde_json::json;

use crate::{
    Blob, ChatRequest, ChatResponse, Content, FunctionCall, FunctionCallingMode,
    FunctionDeclaration, FunctionResponse, Image, JsonResponse, Part, ProviderErrorKind, Schema,
    StreamEvent,
};

use super::convert::{
    StreamTranslator, build_request, from_wire, parse_response, to_wire,
};
use super::types::{AnthropicResponse, AnthropicStreamEvent};

#[test]
fn text_call_and_response_parts_round_trip() {
    let contents = [
        Content::user(vec![Part::text("hello")]),
        Content::assistant(vec![
            Part::text("checking"),
            Part::FunctionCall(FunctionCall::new("toolu_1", "lookup", r#"{"b": 1, "a": [2]}"#)),
        ]),
        Content::user(vec![Part::FunctionResponse(FunctionResponse::new(
            "toolu_1", "found",
        ))]),
    ];

    for content in contents {
        let wire = to_wire(&content).expect("content should convert");
        assert_eq!(from_wire(&wire), content);
    }
}

#[test]
fn media_parts_round_trip_by_mime_and_bytes() {
    let content = Content::user(vec![
        Part::Image(Image::inline("image/jpeg", vec![0xff, 0xd8])),
        Part::Blob(Blob::new("application/pdf", b"%PDF".to_vec())),
        Part::Image(Image::Uri("https://example.com/cat.png".to_string())),
    ]);

    let back = from_wire(&to_wire(&content).expect("content should convert"));
    assert_eq!(back.parts.len(), 3);
    assert_eq!(back.parts[0].media(), content.parts[0].media());
    assert_eq!(back.parts[1].media(), content.parts[1].media());
    assert!(matches!(back.parts[1], Part::Blob(_)));
    assert_eq!(back.parts[2], content.parts[2]);
}

#[test]
fn invalid_call_arguments_fail_conversion() {
    let content = Content::assistant(vec![Part::FunctionCall(FunctionCall::new(
        "toolu_1", "lookup", "{not json",
    ))]);

    let err = to_wire(&content).expect_err("invalid JSON should fail");
    assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
}

#[test]
fn build_request_defaults_max_tokens_and_lifts_system_turns() {
    let request = ChatRequest::new("claude-3-5-haiku-latest", vec![Part::text("hi")])
        .with_history(vec![Content::new("system", vec![Part::text("be brief")])])
        .with_config(ModelConfig::default().with_count(3).with_top_p(0.5))
        .with_functions(
            vec![FunctionDeclaration::new("lookup", "", Schema::object())],
            FunctionCallingMode::None,
        )
        .with_json_response(JsonResponse::plain());

    let built = build_request(&request, false, 1024).expect("request should build");
    assert_eq!(built.max_tokens, 1024);
    assert_eq!(built.system.as_deref(), Some("be brief"));
    assert_eq!(built.messages.len(), 1);
    assert_eq!(built.messages[0].role, "user");
    assert_eq!(built.top_p, Some(0.5));
    assert_eq!(built.tool_choice, Some(json!({"type": "none"})));

    let explicit = build_request(
        &request
            .clone()
            .with_config(ModelConfig::default().with_max_tokens(10)),
        true,
        1024,
    )
    .expect("request should build");
    assert_eq!(explicit.max_tokens, 10);
    assert!(explicit.stream);
}

#[test]
fn empty_assistant_turn_is_not_sent() {
    let request = ChatRequest::new("claude-3-5-haiku-latest", vec![Part::text("again")])
        .with_history(vec![
            Content::user(vec![Part::text("first")]),
            Content::assistant(Vec::new()),
        ]);

    let built = build_request(&request, false, 1024).expect("request should build");
    assert_eq!(built.messages.len(), 2);
    assert!(built.messages.iter().all(|message| !message.content.is_empty()));
}

#[test]
fn parse_response_reads_blocks_and_usage() {
    let raw = json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-5-haiku-latest",
        "content": [
            {"type": "text", "text": "Let me look."},
            {"type": "tool_use", "id": "toolu_1", "name": "lookup", "input": {"q": "rust"}}
        ],
        "stop_reason": "tool_use",
        "usage": {"input_tokens": 12, "output_tokens": 8}
    });
    let response: AnthropicResponse =
        serde_json::from_str(&raw.to_string()).expect("response should deserialize");

    let parsed = parse_response(response, raw);
    assert_eq!(parsed.results(), vec!["Let me look."]);
    assert_eq!(parsed.function_calls()[0].arguments, r#"{"q":"rust"}"#);
    assert_eq!(parsed.token_count.total, 20);
}

#[test]
fn stream_translator_maps_block_events() {
    let frames = [
        json!({"type": "message_start", "message": {"id": "msg_1", "usage": {"input_tokens": 10, "output_tokens": 1}}}),
        json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
        json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Hi"}}),
        json!({"type": "content_block_stop", "index": 0}),
        json!({"type": "content_block_start", "index": 1, "content_block": {"type": "tool_use", "id": "toolu_1", "name": "lookup", "input": {}}}),
        json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "{\"q\":"}}),
        json!({"type": "ping"}),
        json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}, "usage": {"output_tokens": 5}}),
        json!({"type": "message_stop"}),
    ];

    let mut translator = StreamTranslator::default();
    let mut events = Vec::new();
    for frame in frames {
        let event: AnthropicStreamEvent =
            serde_json::from_value(frame.clone()).expect("event should deserialize");
        events.extend(translator.translate(event, frame).expect("event should translate").events);
    }

    assert_eq!(
        events,
        vec![
            StreamEvent::usage(Some(10), Some(1)),
            StreamEvent::text("Hi"),
            StreamEvent::tool_call_open("toolu_1", "lookup", ""),
            StreamEvent::argument_delta(Some("toolu_1"), "{\"q\":"),
            StreamEvent::usage(None, Some(5)),
        ]
    );
}

#[test]
fn stream_error_event_becomes_provider_error() {
    let frame = json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}});
    let event: AnthropicStreamEvent =
        serde_json::from_value(frame.clone()).expect("event should deserialize");

    let err = StreamTranslator::default()
        .translate(event, frame)
        .expect_err("error event should fail");
    assert_eq!(err.kind, ProviderErrorKind::Unavailable);
}
