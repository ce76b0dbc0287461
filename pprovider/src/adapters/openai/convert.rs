//! Conversions between the neutral model and OpenAI wire types.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::adapters::{convert_functions, object_parameters};
use crate::{
    ChatRequest, Content, FunctionCall, FunctionCallingMode, FunctionResponse, Image,
    JsonResponse, ModelResponse, Part, ProviderError, ProviderId, ROLE_USER, StreamChunk,
    StreamEvent, TokenCount,
};

use super::types::{
    OpenAiContent, OpenAiContentPart, OpenAiFile, OpenAiFunction, OpenAiFunctionCall,
    OpenAiImageUrl, OpenAiMessage, OpenAiRequest, OpenAiResponse, OpenAiStreamOptions,
    OpenAiStreamResponse, OpenAiTool, OpenAiToolCall, OpenAiUsage,
};

const ROLE_TOOL: &str = "tool";

/// One Content becomes one or more messages; part order is kept.
///
/// Function responses each become a `tool` message. A call part followed by a
/// non-call part starts a new message so that order survives the round trip.
pub fn to_wire(content: &Content) -> Vec<OpenAiMessage> {
    let mut messages = Vec::new();
    let mut current = MessageDraft::new(&content.role);

    for part in &content.parts {
        match part {
            Part::FunctionResponse(response) => {
                current.flush_into(&mut messages);
                messages.push(OpenAiMessage {
                    role: ROLE_TOOL.to_string(),
                    content: Some(OpenAiContent::Text(response.response.clone())),
                    tool_calls: Vec::new(),
                    tool_call_id: Some(response.id.clone()),
                });
            }
            Part::FunctionCall(call) => {
                current.tool_calls.push(OpenAiToolCall {
                    id: call.id.clone(),
                    kind: "function".to_string(),
                    function: OpenAiFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                });
            }
            other => {
                if !current.tool_calls.is_empty() {
                    current.flush_into(&mut messages);
                }
                if let Some(converted) = content_part(other) {
                    current.parts.push(converted);
                }
            }
        }
    }

    current.flush_into(&mut messages);
    messages
}

/// Inverse of [`to_wire`]: folds the messages of one turn back into one Content.
///
/// The role comes from the first non-`tool` message. A turn made only of
/// function responses, or with no parts at all, has none on the wire and comes
/// back as `user`.
pub fn from_wire(messages: &[OpenAiMessage]) -> Content {
    let role = messages
        .iter()
        .find(|message| message.role != ROLE_TOOL)
        .map(|message| message.role.clone())
        .unwrap_or_else(|| ROLE_USER.to_string());

    let mut parts = Vec::new();
    for message in messages {
        if message.role == ROLE_TOOL {
            parts.push(Part::FunctionResponse(FunctionResponse::new(
                message.tool_call_id.clone().unwrap_or_default(),
                message_text(message.content.as_ref()),
            )));
            continue;
        }

        match &message.content {
            Some(OpenAiContent::Text(text)) => parts.push(Part::Text(text.clone())),
            Some(OpenAiContent::Parts(items)) => parts.extend(items.iter().filter_map(part_from_wire)),
            None => {}
        }

        parts.extend(message.tool_calls.iter().map(|call| {
            Part::FunctionCall(FunctionCall::new(
                call.id.clone(),
                call.function.name.clone(),
                call.function.arguments.clone(),
            ))
        }));
    }

    Content::new(role, parts)
}

struct MessageDraft {
    role: String,
    parts: Vec<OpenAiContentPart>,
    tool_calls: Vec<OpenAiToolCall>,
}

impl MessageDraft {
    fn new(role: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: Vec::new(),
            tool_calls: Vec::new(),
        }
    }

    fn flush_into(&mut self, messages: &mut Vec<OpenAiMessage>) {
        if self.parts.is_empty() && self.tool_calls.is_empty() {
            return;
        }

        let parts = std::mem::take(&mut self.parts);
        let content = match parts.as_slice() {
            [] => None,
            [OpenAiContentPart::Text { text }] => Some(OpenAiContent::Text(text.clone())),
            _ => Some(OpenAiContent::Parts(parts)),
        };

        messages.push(OpenAiMessage {
            role: self.role.clone(),
            content,
            tool_calls: std::mem::take(&mut self.tool_calls),
            tool_call_id: None,
        });
    }
}

fn content_part(part: &Part) -> Option<OpenAiContentPart> {
    match part {
        Part::Text(text) => Some(OpenAiContentPart::Text { text: text.clone() }),
        Part::Image(image) => Some(OpenAiContentPart::ImageUrl {
            image_url: OpenAiImageUrl {
                url: image.data_uri(),
            },
        }),
        Part::Blob(blob) => Some(OpenAiContentPart::File {
            file: OpenAiFile {
                file_data: Image::Inline(blob.clone()).data_uri(),
                filename: None,
            },
        }),
        Part::FunctionCall(_) | Part::FunctionResponse(_) => None,
    }
}

fn part_from_wire(part: &OpenAiContentPart) -> Option<Part> {
    match part {
        OpenAiContentPart::Text { text } => Some(Part::Text(text.clone())),
        OpenAiContentPart::ImageUrl { image_url } => match Image::parse(&image_url.url) {
            Ok(image) => Some(Part::Image(image)),
            Err(err) => {
                tracing::warn!(error = %err, "dropping unreadable image part");
                None
            }
        },
        OpenAiContentPart::File { file } => match Image::parse(&file.file_data) {
            Ok(Image::Inline(blob)) => Some(Part::Blob(blob)),
            Ok(Image::Uri(uri)) => Some(Part::Image(Image::Uri(uri))),
            Err(err) => {
                tracing::warn!(error = %err, "dropping unreadable file part");
                None
            }
        },
    }
}

fn message_text(content: Option<&OpenAiContent>) -> String {
    match content {
        Some(OpenAiContent::Text(text)) => text.clone(),
        Some(OpenAiContent::Parts(parts)) => parts
            .iter()
            .filter_map(|part| match part {
                OpenAiContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect(),
        None => String::new(),
    }
}

pub(crate) fn build_request(request: &ChatRequest, stream: bool) -> OpenAiRequest {
    let messages = request
        .conversation()
        .iter()
        .flat_map(to_wire)
        .collect::<Vec<_>>();

    let tools = convert_functions(ProviderId::OpenAi, &request.functions, |function| {
        Ok::<_, ProviderError>(OpenAiTool {
            kind: "function".to_string(),
            function: OpenAiFunction {
                name: function.name.clone(),
                description: function.description.clone(),
                parameters: object_parameters(&function.parameters)?,
            },
        })
    });

    let tool_choice = if tools.is_empty() {
        None
    } else {
        tool_choice(request.function_calling_mode)
    };

    OpenAiRequest {
        model: request.model.clone(),
        messages,
        tools,
        tool_choice,
        n: if stream { None } else { request.config.count },
        max_tokens: request.config.max_tokens,
        temperature: request.config.temperature,
        top_p: request.config.top_p,
        response_format: request.json_response.as_ref().map(response_format),
        stream,
        stream_options: stream.then_some(OpenAiStreamOptions {
            include_usage: true,
        }),
    }
}

fn tool_choice(mode: FunctionCallingMode) -> Option<String> {
    match mode {
        FunctionCallingMode::Unspecified => None,
        FunctionCallingMode::Auto => Some("auto".to_string()),
        FunctionCallingMode::Any => Some("required".to_string()),
        FunctionCallingMode::None => Some("none".to_string()),
    }
}

fn response_format(json_response: &JsonResponse) -> Value {
    match &json_response.schema {
        Some(schema) if !schema.name.trim().is_empty() => json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "description": schema.description,
                "schema": schema.schema.to_value(),
            }
        }),
        Some(_) => {
            tracing::warn!(
                provider = %ProviderId::OpenAi,
                "json schema without a name, falling back to plain JSON mode"
            );
            json!({"type": "json_object"})
        }
        None => json!({"type": "json_object"}),
    }
}

pub(crate) fn parse_response(response: OpenAiResponse, raw: Value) -> ModelResponse {
    let mut choices = response.choices;
    choices.sort_by_key(|choice| choice.index);

    let candidates = choices
        .into_iter()
        .map(|choice| from_wire(std::slice::from_ref(&choice.message)))
        .collect();

    ModelResponse::new(ProviderId::OpenAi, response.model, candidates)
        .with_token_count(token_count(response.usage))
        .with_raw(raw)
}

fn token_count(usage: Option<OpenAiUsage>) -> TokenCount {
    usage
        .map(|usage| TokenCount::new(usage.prompt_tokens, usage.completion_tokens))
        .unwrap_or_default()
}

/// Turns OpenAI stream chunks into neutral events.
///
/// Continuation deltas only carry the tool-call index; the id seen on the
/// opening delta for that index is attached when known.
#[derive(Debug, Default)]
pub(crate) struct StreamTranslator {
    call_ids: BTreeMap<(u32, u32), String>,
}

impl StreamTranslator {
    pub(crate) fn translate(&mut self, chunk: OpenAiStreamResponse, raw: Value) -> StreamChunk {
        let mut events = Vec::new();

        for choice in chunk.choices {
            if let Some(text) = choice.delta.content
                && !text.is_empty()
            {
                events.push(StreamEvent::text_on(choice.index, text));
            }

            for call in choice.delta.tool_calls {
                let function = call.function.unwrap_or_default();
                let arguments = function.arguments.unwrap_or_default();
                let key = (choice.index, call.index);

                match (call.id, function.name) {
                    (Some(id), Some(name)) => {
                        self.call_ids.insert(key, id.clone());
                        events.push(StreamEvent::tool_call_open(id, name, arguments));
                    }
                    (id, _) => {
                        let id = id.or_else(|| self.call_ids.get(&key).cloned());
                        if !arguments.is_empty() {
                            events.push(StreamEvent::ToolCallArgumentDelta { id, arguments });
                        }
                    }
                }
            }
        }

        if let Some(usage) = chunk.usage {
            events.push(StreamEvent::usage(
                Some(usage.prompt_tokens),
                Some(usage.completion_tokens),
            ));
        }

        StreamChunk::new(events).with_raw(raw)
    }
}
