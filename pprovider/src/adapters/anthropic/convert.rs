//! Conversions between the neutral model and Anthropic wire types.

use std::collections::BTreeMap;

use serde_json::value::RawValue;
use serde_json::{Value, json};

use crate::adapters::{arguments_or_empty_object, convert_functions, object_parameters};
use crate::{
    Blob, ChatRequest, Content, FunctionCall, FunctionCallingMode, FunctionResponse, Image,
    ModelResponse, Part, ProviderError, ProviderId, StreamChunk, StreamEvent, TokenCount,
};

use super::types::{
    AnthropicBlock, AnthropicDelta, AnthropicMessage, AnthropicRequest, AnthropicResponse,
    AnthropicSource, AnthropicStreamBlock, AnthropicStreamEvent, AnthropicTool, AnthropicUsage,
};

const ROLE_SYSTEM: &str = "system";

pub fn to_wire(content: &Content) -> Result<AnthropicMessage, ProviderError> {
    let content_blocks = content
        .parts
        .iter()
        .map(block_from_part)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AnthropicMessage {
        role: content.role.clone(),
        content: content_blocks,
    })
}

pub fn from_wire(message: &AnthropicMessage) -> Content {
    Content::new(
        message.role.clone(),
        message.content.iter().filter_map(part_from_block).collect(),
    )
}

fn block_from_part(part: &Part) -> Result<AnthropicBlock, ProviderError> {
    let block = match part {
        Part::Text(text) => AnthropicBlock::text(text.clone()),
        Part::Image(Image::Inline(blob)) => {
            AnthropicBlock::media(AnthropicBlock::IMAGE, base64_source(blob))
        }
        Part::Image(Image::Uri(url)) => AnthropicBlock::media(
            AnthropicBlock::IMAGE,
            AnthropicSource::Url { url: url.clone() },
        ),
        Part::Blob(blob) => AnthropicBlock::media(AnthropicBlock::DOCUMENT, base64_source(blob)),
        Part::FunctionCall(call) => {
            let input = RawValue::from_string(arguments_or_empty_object(&call.arguments).to_string())
                .map_err(|err| {
                    ProviderError::invalid_request(format!(
                        "arguments of call '{}' are not valid JSON: {err}",
                        call.id
                    ))
                })?;
            AnthropicBlock::tool_use(call.id.clone(), call.name.clone(), input)
        }
        Part::FunctionResponse(response) => {
            AnthropicBlock::tool_result(response.id.clone(), response.response.clone())
        }
    };

    Ok(block)
}

fn base64_source(blob: &Blob) -> AnthropicSource {
    AnthropicSource::Base64 {
        media_type: blob.mime_type.clone(),
        data: blob.to_base64(),
    }
}

fn part_from_block(block: &AnthropicBlock) -> Option<Part> {
    match block.kind.as_str() {
        AnthropicBlock::TEXT => block.text.clone().map(Part::Text),
        AnthropicBlock::IMAGE | AnthropicBlock::DOCUMENT => {
            let media = match block.source.as_ref()? {
                AnthropicSource::Url { url } => return Some(Part::Image(Image::Uri(url.clone()))),
                AnthropicSource::Base64 { media_type, data } => {
                    match Blob::from_base64(media_type.clone(), data) {
                        Ok(blob) => blob,
                        Err(err) => {
                            tracing::warn!(error = %err, "dropping unreadable media block");
                            return None;
                        }
                    }
                }
            };

            if block.kind == AnthropicBlock::IMAGE {
                Some(Part::Image(Image::Inline(media)))
            } else {
                Some(Part::Blob(media))
            }
        }
        AnthropicBlock::TOOL_USE => Some(Part::FunctionCall(FunctionCall::new(
            block.id.clone().unwrap_or_default(),
            block.name.clone().unwrap_or_default(),
            block
                .input
                .as_ref()
                .map(|input| input.get().to_string())
                .unwrap_or_default(),
        ))),
        AnthropicBlock::TOOL_RESULT => Some(Part::FunctionResponse(FunctionResponse::new(
            block.tool_use_id.clone().unwrap_or_default(),
            block.content.clone().unwrap_or_default(),
        ))),
        _ => None,
    }
}

pub(crate) fn build_request(
    request: &ChatRequest,
    stream: bool,
    default_max_tokens: u32,
) -> Result<AnthropicRequest, ProviderError> {
    if request.config.count.is_some_and(|count| count > 1) {
        tracing::warn!(
            provider = %ProviderId::Anthropic,
            "candidate count is not supported and will be ignored"
        );
    }
    if request.json_response.is_some() {
        tracing::warn!(
            provider = %ProviderId::Anthropic,
            "JSON response mode is not supported and will be ignored"
        );
    }

    let mut system = Vec::new();
    let mut messages = Vec::new();
    for content in request.conversation() {
        if content.role == ROLE_SYSTEM {
            system.push(content.text());
        } else if !content.parts.is_empty() {
            messages.push(to_wire(&content)?);
        }
    }

    let tools = convert_functions(ProviderId::Anthropic, &request.functions, |function| {
        Ok::<_, ProviderError>(AnthropicTool {
            name: function.name.clone(),
            description: function.description.clone(),
            input_schema: object_parameters(&function.parameters)?,
        })
    });

    let tool_choice = if tools.is_empty() {
        None
    } else {
        tool_choice(request.function_calling_mode)
    };

    Ok(AnthropicRequest {
        model: request.model.clone(),
        max_tokens: request.config.max_tokens.unwrap_or(default_max_tokens),
        system: (!system.is_empty()).then(|| system.join("\n")),
        messages,
        tools,
        tool_choice,
        temperature: request.config.temperature,
        top_p: request.config.top_p,
        stream,
    })
}

fn tool_choice(mode: FunctionCallingMode) -> Option<Value> {
    match mode {
        FunctionCallingMode::Unspecified => None,
        FunctionCallingMode::Auto => Some(json!({"type": "auto"})),
        FunctionCallingMode::Any => Some(json!({"type": "any"})),
        FunctionCallingMode::None => Some(json!({"type": "none"})),
    }
}

pub(crate) fn parse_response(response: AnthropicResponse, raw: Value) -> ModelResponse {
    let candidate = Content::assistant(response.content.iter().filter_map(part_from_block).collect());

    ModelResponse::new(ProviderId::Anthropic, response.model, vec![candidate])
        .with_token_count(token_count(response.usage))
        .with_raw(raw)
}

fn token_count(usage: Option<AnthropicUsage>) -> TokenCount {
    usage
        .map(|usage| {
            TokenCount::new(
                usage.input_tokens.unwrap_or_default(),
                usage.output_tokens.unwrap_or_default(),
            )
        })
        .unwrap_or_default()
}

/// Turns Anthropic stream events into neutral events.
///
/// `input_json_delta` only names the block index; the id from that block's
/// `content_block_start` is attached.
#[derive(Debug, Default)]
pub(crate) struct StreamTranslator {
    call_ids: BTreeMap<u32, String>,
}

impl StreamTranslator {
    pub(crate) fn translate(
        &mut self,
        event: AnthropicStreamEvent,
        raw: Value,
    ) -> Result<StreamChunk, ProviderError> {
        let events = match event {
            AnthropicStreamEvent::MessageStart { message } => message
                .usage
                .map(|usage| vec![StreamEvent::usage(usage.input_tokens, usage.output_tokens)])
                .unwrap_or_default(),
            AnthropicStreamEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                AnthropicStreamBlock::Text { text } if !text.is_empty() => {
                    vec![StreamEvent::text(text)]
                }
                AnthropicStreamBlock::ToolUse { id, name } => {
                    self.call_ids.insert(index, id.clone());
                    vec![StreamEvent::tool_call_open(id, name, "")]
                }
                _ => Vec::new(),
            },
            AnthropicStreamEvent::ContentBlockDelta { index, delta } => match delta {
                AnthropicDelta::TextDelta { text } if !text.is_empty() => {
                    vec![StreamEvent::text(text)]
                }
                AnthropicDelta::InputJsonDelta { partial_json } if !partial_json.is_empty() => {
                    vec![StreamEvent::ToolCallArgumentDelta {
                        id: self.call_ids.get(&index).cloned(),
                        arguments: partial_json,
                    }]
                }
                _ => Vec::new(),
            },
            AnthropicStreamEvent::MessageDelta { usage } => usage
                .map(|usage| vec![StreamEvent::usage(usage.input_tokens, usage.output_tokens)])
                .unwrap_or_default(),
            AnthropicStreamEvent::Error { error } => {
                let message = format!("{}: {}", error.kind, error.message);
                return Err(match error.kind.as_str() {
                    "overloaded_error" => ProviderError::unavailable(message),
                    "rate_limit_error" => ProviderError::rate_limited(message),
                    "authentication_error" | "permission_error" => {
                        ProviderError::authentication(message)
                    }
                    "invalid_request_error" => ProviderError::invalid_request(message),
                    _ => ProviderError::transport(message),
                });
            }
            AnthropicStreamEvent::ContentBlockStop { .. }
            | AnthropicStreamEvent::MessageStop
            | AnthropicStreamEvent::Ping
            | AnthropicStreamEvent::Unknown => Vec::new(),
        };

        Ok(StreamChunk::new(events).with_raw(raw))
    }
}
