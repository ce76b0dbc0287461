//! Conversions between the neutral model and Gemini wire types.

use std::collections::BTreeMap;

use serde_json::Value;
use serde_json::value::RawValue;

use crate::adapters::{arguments_or_empty_object, convert_functions};
use crate::{
    Blob, ChatRequest, Content, FunctionCall, FunctionCallingMode, FunctionResponse, Image,
    ModelResponse, Part, ProviderError, ProviderId, ROLE_ASSISTANT, Schema, StreamChunk,
    StreamEvent, TokenCount,
};

use super::types::{
    GeminiCandidate, GeminiContent, GeminiFileData, GeminiFunctionCall,
    GeminiFunctionCallingConfig, GeminiFunctionDeclaration, GeminiFunctionResponse,
    GeminiGenerationConfig, GeminiInlineData, GeminiPart, GeminiRequest, GeminiResponse,
    GeminiSchema, GeminiThinkingConfig, GeminiTool, GeminiToolConfig, GeminiUsage,
};

const ROLE_MODEL: &str = "model";
const ROLE_SYSTEM: &str = "system";
const RESPONSE_KEY: &str = "content";
const JSON_MIME_TYPE: &str = "application/json";

/// Converts a single turn. Function responses are named after their id.
pub fn to_wire(content: &Content) -> Result<GeminiContent, ProviderError> {
    content_to_gemini(content, &mut BTreeMap::new())
}

/// Converts a conversation. Function responses take their name from the
/// earlier call with the same id, or fall back to the id itself.
pub fn conversation_to_wire(contents: &[Content]) -> Result<Vec<GeminiContent>, ProviderError> {
    let mut call_names = BTreeMap::new();
    contents
        .iter()
        .map(|content| content_to_gemini(content, &mut call_names))
        .collect()
}

pub fn from_wire(content: &GeminiContent) -> Content {
    let role = if content.role == ROLE_MODEL {
        ROLE_ASSISTANT.to_string()
    } else {
        content.role.clone()
    };

    Content::new(role, content.parts.iter().filter_map(part_from_gemini).collect())
}

fn content_to_gemini(
    content: &Content,
    call_names: &mut BTreeMap<String, String>,
) -> Result<GeminiContent, ProviderError> {
    let role = if content.role == ROLE_ASSISTANT {
        ROLE_MODEL.to_string()
    } else {
        content.role.clone()
    };

    let parts = content
        .parts
        .iter()
        .map(|part| part_to_gemini(part, call_names))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GeminiContent { role, parts })
}

fn part_to_gemini(
    part: &Part,
    call_names: &mut BTreeMap<String, String>,
) -> Result<GeminiPart, ProviderError> {
    let mut wire = GeminiPart::default();
    match part {
        Part::Text(text) => wire.text = Some(text.clone()),
        Part::Image(Image::Inline(blob)) | Part::Blob(blob) => {
            wire.inline_data = Some(GeminiInlineData {
                mime_type: blob.mime_type.clone(),
                data: blob.to_base64(),
            });
        }
        Part::Image(Image::Uri(uri)) => {
            wire.file_data = Some(GeminiFileData {
                mime_type: image_mime_from_uri(uri).unwrap_or_default().to_string(),
                file_uri: uri.clone(),
            });
        }
        Part::FunctionCall(call) => {
            call_names.insert(call.id.clone(), call.name.clone());
            let args = raw_json(arguments_or_empty_object(&call.arguments)).map_err(|err| {
                ProviderError::invalid_request(format!(
                    "arguments of call '{}' are not valid JSON: {err}",
                    call.id
                ))
            })?;
            wire.function_call = Some(GeminiFunctionCall {
                id: optional_id(&call.id, &call.name),
                name: call.name.clone(),
                args: Some(args),
            });
        }
        Part::FunctionResponse(response) => {
            let name = call_names
                .get(&response.id)
                .cloned()
                .unwrap_or_else(|| response.id.clone());
            wire.function_response = Some(GeminiFunctionResponse {
                id: optional_id(&response.id, &name),
                name,
                response: response_object(&response.response)?,
            });
        }
    }

    Ok(wire)
}

/// Ids that merely repeat the function name are not sent; Gemini derives them.
fn optional_id(id: &str, name: &str) -> Option<String> {
    (!id.is_empty() && id != name).then(|| id.to_string())
}

fn raw_json(text: &str) -> Result<Box<RawValue>, serde_json::Error> {
    RawValue::from_string(text.to_string())
}

/// Gemini requires a JSON object; anything else is wrapped as `{"content": ...}`.
fn response_object(response: &str) -> Result<Box<RawValue>, ProviderError> {
    let is_object = serde_json::from_str::<Value>(response).is_ok_and(|value| value.is_object());
    let text = if is_object {
        response.to_string()
    } else {
        serde_json::json!({ RESPONSE_KEY: response }).to_string()
    };

    raw_json(&text).map_err(|err| ProviderError::invalid_request(err.to_string()))
}

fn response_text(response: &RawValue) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(response.get())
        && map.len() == 1
        && let Some(Value::String(text)) = map.get(RESPONSE_KEY)
    {
        return text.clone();
    }

    response.get().to_string()
}

fn image_mime_from_uri(uri: &str) -> Option<&'static str> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    let extension = path.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => return None,
    };

    Some(mime)
}

/// Thought parts never enter a turn; `parse_response` collects them separately.
fn part_from_gemini(part: &GeminiPart) -> Option<Part> {
    if part.thought {
        return None;
    }

    if let Some(text) = &part.text {
        return Some(Part::Text(text.clone()));
    }

    if let Some(inline) = &part.inline_data {
        let blob = match Blob::from_base64(inline.mime_type.clone(), &inline.data) {
            Ok(blob) => blob,
            Err(err) => {
                tracing::warn!(error = %err, "dropping unreadable inline data");
                return None;
            }
        };

        return Some(if blob.mime_type.starts_with("image/") {
            Part::Image(Image::Inline(blob))
        } else {
            Part::Blob(blob)
        });
    }

    if let Some(file) = &part.file_data {
        return Some(Part::Image(Image::Uri(file.file_uri.clone())));
    }

    if let Some(call) = &part.function_call {
        return Some(Part::FunctionCall(function_call(call)));
    }

    part.function_response.as_ref().map(|response| {
        Part::FunctionResponse(FunctionResponse::new(
            response.id.clone().unwrap_or_else(|| response.name.clone()),
            response_text(&response.response),
        ))
    })
}

fn function_call(call: &GeminiFunctionCall) -> FunctionCall {
    FunctionCall::new(
        call.id.clone().unwrap_or_else(|| call.name.clone()),
        call.name.clone(),
        call.args
            .as_ref()
            .map(|args| args.get().to_string())
            .unwrap_or_default(),
    )
}

/// Translates the JSON-Schema subset into Gemini's typed schema.
pub(crate) fn convert_schema(schema: &Schema) -> Result<GeminiSchema, ProviderError> {
    let kind = match schema.kind.to_ascii_lowercase().as_str() {
        "string" => "STRING",
        "number" => "NUMBER",
        "integer" => "INTEGER",
        "boolean" => "BOOLEAN",
        "array" => "ARRAY",
        "object" => "OBJECT",
        _ => "TYPE_UNSPECIFIED",
    };

    let items = match (&schema.items, kind) {
        (Some(items), _) => Some(Box::new(convert_schema(items)?)),
        (None, "ARRAY") => {
            return Err(ProviderError::schema_conversion(
                "array schema must describe its items",
            ));
        }
        (None, _) => None,
    };

    let properties = schema
        .properties
        .iter()
        .map(|(name, property)| Ok((name.clone(), convert_schema(property)?)))
        .collect::<Result<BTreeMap<_, _>, ProviderError>>()?;

    let required = schema
        .required
        .iter()
        .filter(|name| properties.contains_key(name.as_str()))
        .cloned()
        .collect();

    Ok(GeminiSchema {
        kind: kind.to_string(),
        description: schema.description.clone(),
        enum_values: schema.enum_values.clone(),
        format: (!schema.enum_values.is_empty() && kind == "STRING").then(|| "enum".to_string()),
        items,
        properties,
        required,
    })
}

fn function_parameters(schema: &Schema) -> Result<Option<GeminiSchema>, ProviderError> {
    if schema.kind.is_empty() && schema.properties.is_empty() {
        return Ok(None);
    }

    if !schema.kind.eq_ignore_ascii_case("object") {
        return Err(ProviderError::schema_conversion(format!(
            "function parameters must be an object schema, got '{}'",
            schema.kind
        )));
    }

    convert_schema(schema).map(Some)
}

pub(crate) fn build_request(
    request: &ChatRequest,
    stream: bool,
) -> Result<GeminiRequest, ProviderError> {
    let mut system = Vec::new();
    let mut turns = Vec::new();
    for content in request.conversation() {
        if content.role == ROLE_SYSTEM {
            system.extend(content.parts);
        } else if !content.parts.is_empty() {
            turns.push(content);
        }
    }

    let contents = conversation_to_wire(&turns)?;
    let system_instruction = if system.is_empty() {
        None
    } else {
        conversation_to_wire(&[Content::new("", system)])?.pop()
    };

    let declarations = convert_functions(ProviderId::Gemini, &request.functions, |function| {
        Ok::<_, ProviderError>(GeminiFunctionDeclaration {
            name: function.name.clone(),
            description: function.description.clone(),
            parameters: function_parameters(&function.parameters)?,
        })
    });

    let tool_config = match request.function_calling_mode {
        FunctionCallingMode::Unspecified => None,
        _ if declarations.is_empty() => None,
        mode => Some(GeminiToolConfig {
            function_calling_config: GeminiFunctionCallingConfig {
                mode: mode.as_str().to_ascii_uppercase(),
            },
        }),
    };

    let tools = if declarations.is_empty() {
        Vec::new()
    } else {
        vec![GeminiTool {
            function_declarations: declarations,
        }]
    };

    Ok(GeminiRequest {
        model: request.model.clone(),
        contents,
        system_instruction,
        tools,
        tool_config,
        generation_config: generation_config(request, stream)?,
    })
}

fn generation_config(
    request: &ChatRequest,
    stream: bool,
) -> Result<Option<GeminiGenerationConfig>, ProviderError> {
    let config = &request.config;
    let (response_mime_type, response_schema) = match &request.json_response {
        None => (None, None),
        Some(json) => {
            let schema = json
                .schema
                .as_ref()
                .map(|schema| convert_schema(&schema.schema))
                .transpose()?;
            (Some(JSON_MIME_TYPE.to_string()), schema)
        }
    };

    let generation = GeminiGenerationConfig {
        candidate_count: if stream { None } else { config.count },
        max_output_tokens: config.max_tokens,
        temperature: config.temperature,
        top_p: config.top_p,
        response_mime_type,
        response_schema,
        thinking_config: config
            .thinking
            .map(|include_thoughts| GeminiThinkingConfig { include_thoughts }),
    };

    let is_empty = generation.candidate_count.is_none()
        && generation.max_output_tokens.is_none()
        && generation.temperature.is_none()
        && generation.top_p.is_none()
        && generation.response_mime_type.is_none()
        && generation.thinking_config.is_none();

    Ok((!is_empty).then_some(generation))
}

pub(crate) fn parse_response(response: GeminiResponse, model: &str, raw: Value) -> ModelResponse {
    let mut candidates = response.candidates;
    candidates.sort_by_key(|candidate| candidate.index);

    let turns = candidates.iter().map(candidate_turn).collect();
    let thoughts = candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter(|part| part.thought)
        .filter_map(|part| part.text.clone())
        .collect();
    let model = response.model_version.unwrap_or_else(|| model.to_string());

    ModelResponse::new(ProviderId::Gemini, model, turns)
        .with_token_count(token_count(response.usage_metadata))
        .with_thoughts(thoughts)
        .with_raw(raw)
}

fn candidate_turn(candidate: &GeminiCandidate) -> Content {
    match &candidate.content {
        Some(content) => {
            let mut turn = from_wire(content);
            turn.role = ROLE_ASSISTANT.to_string();
            turn
        }
        None => Content::assistant(Vec::new()),
    }
}

fn token_count(usage: Option<GeminiUsage>) -> TokenCount {
    usage
        .map(|usage| {
            TokenCount::new(
                usage.prompt_token_count.unwrap_or_default(),
                usage.candidates_token_count.unwrap_or_default(),
            )
        })
        .unwrap_or_default()
}

/// Gemini streams whole `GenerateContentResponse` documents. Text arrives in
/// pieces, function calls arrive complete in a single chunk.
pub(crate) fn translate_stream_chunk(response: GeminiResponse, raw: Value) -> StreamChunk {
    let mut events = Vec::new();
    for candidate in &response.candidates {
        let Some(content) = &candidate.content else {
            continue;
        };

        for part in &content.parts {
            if part.thought {
                continue;
            }
            if let Some(text) = part.text.as_deref().filter(|text| !text.is_empty()) {
                events.push(StreamEvent::text_on(candidate.index, text));
            }
            if let Some(call) = &part.function_call {
                let call = function_call(call);
                events.push(StreamEvent::tool_call_open(call.id, call.name, call.arguments));
            }
        }
    }

    if let Some(usage) = response.usage_metadata
        && (usage.prompt_token_count.is_some() || usage.candidates_token_count.is_some())
    {
        events.push(StreamEvent::usage(
            usage.prompt_token_count,
            usage.candidates_token_count,
        ));
    }

    StreamChunk::new(events).with_raw(raw)
}
