//! MCP result shaping: registry metadata for tools/list, and the single
//! content/structuredContent/isError envelope every tools/call response uses.

use serde_json::{Value, json};

use crate::registry::Registry;
use crate::registry::failure::Failure;

pub fn tool_definitions(registry: &Registry) -> Vec<Value> {
    registry
        .list()
        .map(|descriptor| {
            json!({
                "name": descriptor.name,
                "description": descriptor.description,
                "inputSchema": descriptor.schema.to_json(),
            })
        })
        .collect()
}

/// Wraps a handler outcome in the tools/call result envelope. Success text
/// comes from the payload's message when it has one; failures carry their
/// kind and message under structuredContent.error.
pub fn call_result(outcome: Result<Value, Failure>) -> Value {
    match outcome {
        Ok(payload) => {
            let text = payload
                .get("message")
                .and_then(|value| value.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| payload.to_string());
            json!({
                "content": [{"type": "text", "text": text}],
                "structuredContent": payload,
                "isError": false
            })
        }
        Err(failure) => json!({
            "content": [{"type": "text", "text": format!("Error: {}", failure.message)}],
            "structuredContent": {
                "error": {
                    "kind": failure.kind.as_str(),
                    "message": failure.message,
                }
            },
            "isError": true
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::build_registry;

    #[test]
    fn definitions_expose_schemas() {
        let registry = build_registry();
        let definitions = tool_definitions(&registry);
        assert_eq!(definitions.len(), registry.len());

        let batch = definitions
            .iter()
            .find(|tool| tool["name"] == json!("batch_convert"))
            .expect("batch_convert listed");
        assert_eq!(batch["inputSchema"]["type"], json!("object"));
        assert!(
            batch["inputSchema"]["properties"]["from_format"]["enum"]
                .as_array()
                .expect("enum")
                .iter()
                .any(|value| value == &json!("docx"))
        );
    }

    #[test]
    fn success_envelope_prefers_message_text() {
        let result = call_result(Ok(json!({"message": "done", "rows": 3})));
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["text"], json!("done"));
        assert_eq!(result["structuredContent"]["rows"], 3);
    }

    #[test]
    fn failure_envelope_carries_the_kind() {
        let result = call_result(Err(Failure::unknown_tool("no_such_tool")));
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["structuredContent"]["error"]["kind"],
            json!("unknown_tool")
        );
    }
}
