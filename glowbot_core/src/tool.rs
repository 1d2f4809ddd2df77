//! The retrieval tool contract.
//!
//! The composer constrains the model to exactly one fixed tool; there is
//! no open-ended registry. [`ToolSpec`] is what gets serialized into the
//! provider request, and [`ToolInvocation`] is what comes back.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Name of the single retrieval tool.
pub const RAG_SEARCH_TOOL: &str = "rag_search";

#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSpec {
    /// The knowledge-base search tool. Sub-queries may be separated with
    /// `;` inside `user_query`.
    #[must_use]
    pub fn rag_search() -> Self {
        Self {
            name: RAG_SEARCH_TOOL.to_string(),
            description: "Поиск по базе знаний салона: процедуры, цены, противопоказания, адреса."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "user_query": {
                        "type": "string",
                        "description": "Поисковый запрос; несколько подзапросов через ';'"
                    }
                },
                "required": ["user_query"]
            }),
        }
    }

    /// Wire shape expected by OpenAI-compatible chat endpoints.
    #[must_use]
    pub fn definition(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// A model response requesting a tool execution instead of final text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub arguments: Value,
}

impl ToolInvocation {
    /// The `user_query` argument, when present and a string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.arguments.get("user_query").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_has_function_shape() {
        let def = ToolSpec::rag_search().definition();
        assert_eq!(def["type"], "function");
        assert_eq!(def["function"]["name"], RAG_SEARCH_TOOL);
        assert_eq!(
            def["function"]["parameters"]["required"][0],
            "user_query"
        );
    }

    #[test]
    fn invocation_query_extraction() {
        let inv = ToolInvocation {
            tool: RAG_SEARCH_TOOL.to_string(),
            arguments: json!({"user_query": "маникюр; педикюр"}),
        };
        assert_eq!(inv.query(), Some("маникюр; педикюр"));

        let missing = ToolInvocation {
            tool: RAG_SEARCH_TOOL.to_string(),
            arguments: json!({}),
        };
        assert!(missing.query().is_none());
    }
}
