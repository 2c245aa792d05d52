//! Structured output via forced tool use.
//!
//! The output type's JSON schema is offered as the only tool and the model
//! is forced to call it; the tool input is the structured value.

use log::debug;
use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CrawlerError, Result};
use crate::llm::client::LlmClient;
use crate::llm::types::{CompletionRequest, Message, ToolChoice, ToolDefinition};

/// Types the model can be asked to produce.
///
/// Automatically implemented for any `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Closed, fully inlined JSON schema for this type
    fn tool_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        close_object_schemas(&mut value);
        inline_refs(&mut value);

        if let Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
        }

        value
    }

    /// Tool name the model is forced to call
    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }

    /// Tool definition wrapping the schema
    fn tool_definition() -> ToolDefinition {
        ToolDefinition::new(
            Self::type_name(),
            format!("Respond with a {} value.", Self::type_name()),
            Self::tool_schema(),
        )
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Ask the model for a value of type `T` given the conversation so far.
///
/// A missing tool call or input that does not fit `T` is a
/// `CrawlerError::StructuredOutput`; an empty but well-formed value is not.
pub async fn invoke_structured<T: StructuredOutput>(
    client: &dyn LlmClient,
    messages: Vec<Message>,
) -> Result<T> {
    let tool = T::tool_definition();
    let tool_name = tool.name.clone();

    let request = CompletionRequest::new(messages)
        .with_tools(vec![tool])
        .with_tool_choice(ToolChoice::Tool(tool_name.clone()));

    let response = client.complete(request).await?;

    let call = response
        .tool_calls
        .into_iter()
        .find(|call| call.name == tool_name)
        .ok_or_else(|| {
            CrawlerError::StructuredOutput(format!("No {} tool call in response", tool_name))
        })?;

    debug!("Structured {} response: {}", tool_name, call.input);

    serde_json::from_value(call.input).map_err(|e| {
        CrawlerError::StructuredOutput(format!("Failed to deserialize {}: {}", tool_name, e))
    })
}

fn close_object_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            for (_, v) in map.iter_mut() {
                close_object_schemas(v);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                close_object_schemas(item);
            }
        }
        _ => {}
    }
}

fn inline_refs(value: &mut Value) {
    let definitions = match value {
        Value::Object(map) => map.get("definitions").cloned(),
        _ => None,
    };

    if let Some(defs) = definitions {
        inline_refs_recursive(value, &defs);
    }
}

fn inline_refs_recursive(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
                let type_name = ref_path.trim_start_matches("#/definitions/");
                if let Some(def) = definitions.get(type_name) {
                    *value = def.clone();
                    inline_refs_recursive(value, definitions);
                    return;
                }
            }

            if let Some(Value::Array(all_of)) = map.get("allOf").cloned() {
                if all_of.len() == 1 {
                    let description = map.get("description").cloned();
                    if let Some(single) = all_of.into_iter().next() {
                        *value = single;
                        inline_refs_recursive(value, definitions);
                        if let (Some(desc), Value::Object(inner)) = (description, &mut *value) {
                            inner.insert("description".to_string(), desc);
                        }
                        return;
                    }
                }
            }

            for (key, v) in map.iter_mut() {
                if key != "definitions" {
                    inline_refs_recursive(v, definitions);
                }
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs_recursive(item, definitions);
            }
        }
        _ => {}
    }
}
