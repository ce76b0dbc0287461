//! Focused unit tests for OpenAI adapter internals.

#![cfg(test)]

use pcommon::ModelConfig;
use serde_json::json;

use crate::{
    Blob, ChatRequest, ChatResponse, Content, FunctionCall, FunctionCallingMode,
    FunctionDeclaration, FunctionResponse, Image, JsonResponse, JsonSchema, Part, Schema,
    StreamEvent,
};

use super::convert::{
    StreamTranslator, build_request, from_wire, parse_response, to_wire,
};
use super::types::{OpenAiContent, OpenAiResponse, OpenAiStreamResponse};

#[test]
fn text_call_and_response_parts_round_trip() {
    let contents = [
        Content::user(vec![Part::text("what is 2+2?")]),
        Content::assistant(vec![
            Part::text("let me check"),
            Part::FunctionCall(FunctionCall::new("c1", "add", r#"{"a": 2, "b": 2}"#)),
        ]),
        Content::user(vec![Part::FunctionResponse(FunctionResponse::new("c1", "4"))]),
        Content::user(vec![
            Part::text("before"),
            Part::FunctionResponse(FunctionResponse::new("c2", "ok")),
            Part::text("after"),
        ]),
    ];

    for content in contents {
        let wire = to_wire(&content);
        assert_eq!(from_wire(&wire), content);
    }
}

#[test]
fn media_parts_round_trip_by_mime_and_bytes() {
    let content = Content::user(vec![
        Part::Image(Image::inline("image/png", vec![1, 2, 3])),
        Part::Blob(Blob::new("application/pdf", b"%PDF-1.7".to_vec())),
    ]);

    let back = from_wire(&to_wire(&content));
    assert_eq!(back.parts.len(), 2);
    for (original, restored) in content.parts.iter().zip(&back.parts) {
        assert_eq!(original.media(), restored.media());
    }
}

#[test]
fn response_only_and_empty_turns_come_back_as_user() {
    let tool_turn = Content::new(
        "tool",
        vec![Part::FunctionResponse(FunctionResponse::new("c1", "4"))],
    );
    let back = from_wire(&to_wire(&tool_turn));
    assert_eq!(back.role, "user");
    assert_eq!(back.parts, tool_turn.parts);

    let empty = to_wire(&Content::assistant(Vec::new()));
    assert!(empty.is_empty());
    assert_eq!(from_wire(&empty), Content::user(Vec::new()));
}

#[test]
fn single_text_part_is_sent_as_plain_string() {
    let messages = to_wire(&Content::user(vec![Part::text("hi")]));
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, Some(OpenAiContent::Text("hi".to_string())));
}

#[test]
fn build_request_maps_settings_tools_and_json_mode() {
    let request = ChatRequest::new("gpt-4o", vec![Part::text("hi")])
        .with_config(
            ModelConfig::default()
                .with_count(2)
                .with_temperature(0.0)
                .with_max_tokens(64),
        )
        .with_functions(
            vec![
                FunctionDeclaration::new("lookup", "find", Schema::object().property("q", Schema::string())),
                FunctionDeclaration::new("broken", "", Schema::string()),
            ],
            FunctionCallingMode::Any,
        )
        .with_json_response(JsonResponse::with_schema(JsonSchema::new(
            "answer",
            "",
            Schema::object(),
        )));

    let built = build_request(&request, false);
    assert_eq!(built.n, Some(2));
    assert_eq!(built.temperature, Some(0.0));
    assert_eq!(built.top_p, None);
    assert_eq!(built.tools.len(), 1);
    assert_eq!(built.tools[0].function.name, "lookup");
    assert_eq!(built.tool_choice.as_deref(), Some("required"));
    assert_eq!(
        built.response_format.as_ref().map(|format| format["type"].clone()),
        Some(json!("json_schema"))
    );

    let streamed = build_request(&request, true);
    assert_eq!(streamed.n, None);
    assert!(streamed.stream);
    assert!(streamed.stream_options.is_some());
}

#[test]
fn parse_response_builds_candidates_and_usage() {
    let raw = json!({
        "id": "chatcmpl-1",
        "model": "gpt-4o-mini",
        "choices": [
            {"index": 1, "message": {"role": "assistant", "content": "second"}},
            {"index": 0, "message": {"role": "assistant", "content": null, "tool_calls": [
                {"id": "call_1", "type": "function", "function": {"name": "lookup", "arguments": "{\"q\":1}"}}
            ]}, "finish_reason": "tool_calls"}
        ],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    });
    let response: OpenAiResponse =
        serde_json::from_value(raw.clone()).expect("response should deserialize");

    let parsed = parse_response(response, raw);
    assert_eq!(parsed.candidates.len(), 2);
    assert_eq!(parsed.function_calls()[0].id, "call_1");
    assert_eq!(parsed.results(), vec!["second"]);
    assert_eq!(parsed.token_count.total, 15);
    assert!(parsed.raw().is_some());
}

#[test]
fn stream_translator_resolves_continuation_ids_by_index() {
    let mut translator = StreamTranslator::default();
    let frames = [
        json!({"choices": [{"index": 0, "delta": {"role": "assistant", "content": "Hel"}}]}),
        json!({"choices": [{"index": 0, "delta": {"tool_calls": [
            {"index": 0, "id": "call_1", "type": "function", "function": {"name": "lookup", "arguments": ""}}
        ]}}]}),
        json!({"choices": [{"index": 0, "delta": {"tool_calls": [
            {"index": 0, "function": {"arguments": "{\"a\":"}}
        ]}}]}),
        json!({"choices": [], "usage": {"prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7}}),
    ];

    let events = frames
        .into_iter()
        .flat_map(|frame| {
            let chunk: OpenAiStreamResponse =
                serde_json::from_value(frame.clone()).expect("chunk should deserialize");
            translator.translate(chunk, frame).events
        })
        .collect::<Vec<_>>();

    assert_eq!(
        events,
        vec![
            StreamEvent::text("Hel"),
            StreamEvent::tool_call_open("call_1", "lookup", ""),
            StreamEvent::argument_delta(Some("call_1"), "{\"a\":"),
            StreamEvent::usage(Some(3), Some(4)),
        ]
    );
}

#[test]
fn stream_flag_is_only_sent_when_streaming() {
    let request = ChatRequest::new("gpt-4o", vec![Part::text("ping")]);

    let plain = serde_json::to_value(build_request(&request, false)).expect("request should serialize");
    assert!(plain.get("stream").is_none());
    assert!(plain.get("stream_options").is_none());

    let streamed = serde_json::to_value(build_request(&request, true)).expect("request should serialize");
    assert_eq!(streamed["stream"], json!(true));
    assert_eq!(streamed["stream_options"], json!({"include_usage": true}));
}
