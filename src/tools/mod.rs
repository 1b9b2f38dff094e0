// Copyright 2026 Lectern Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub mod search;

pub use search::SearchTool;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::llm::ToolDefinition;

/// Result of one tool invocation: the text fed back into the conversation
/// plus the provenance labels backing it. Provenance travels with the output
/// instead of living on the tool, so a request can never see a previous
/// request's sources.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub content: String,
    pub sources: Vec<String>,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
        }
    }
}

/// A callable capability the LLM can invoke through its tool-use protocol
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;
    async fn execute(&self, arguments: &Value) -> ToolOutput;
}

/// Mapping from tool name to tool instance, populated once at startup.
/// Duplicate names overwrite silently (last registration wins).
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<(String, Arc<dyn Tool>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        if let Some(slot) = self.tools.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = tool;
        } else {
            self.tools.push((name, tool));
        }
    }

    /// Declared schemas of every registered tool, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|(_, tool)| tool.definition()).collect()
    }

    /// Dispatch an invocation by name. Unknown names come from the model,
    /// so they yield an error string the conversation can recover from,
    /// never an Err.
    pub async fn execute(&self, name: &str, arguments: &Value) -> ToolOutput {
        match self.tools.iter().find(|(existing, _)| existing == name) {
            Some((_, tool)) => tool.execute(arguments).await,
            None => ToolOutput::text(format!("Tool '{}' not found", name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool {
        name: &'static str,
        reply: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name.to_string(),
                description: "Echo for tests".to_string(),
                input_schema: json!({"type": "object"}),
            }
        }

        async fn execute(&self, _arguments: &Value) -> ToolOutput {
            ToolOutput {
                content: self.reply.to_string(),
                sources: vec![format!("{} source", self.name)],
            }
        }
    }

    #[tokio::test]
    async fn test_execute_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool {
            name: "echo",
            reply: "hello",
        }));

        let output = registry.execute("echo", &json!({})).await;
        assert_eq!(output.content, "hello");
        assert_eq!(output.sources, vec!["echo source"]);
    }

    #[tokio::test]
    async fn test_execute_unknown_tool_returns_error_string() {
        let registry = ToolRegistry::new();
        let output = registry.execute("non_existent_tool", &json!({})).await;
        assert_eq!(output.content, "Tool 'non_existent_tool' not found");
        assert!(output.sources.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_registration_last_wins() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool {
            name: "echo",
            reply: "first",
        }));
        registry.register(Arc::new(EchoTool {
            name: "echo",
            reply: "second",
        }));

        assert_eq!(registry.definitions().len(), 1);
        let output = registry.execute("echo", &json!({})).await;
        assert_eq!(output.content, "second");
    }

    #[test]
    fn test_definitions_preserve_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool {
            name: "alpha",
            reply: "",
        }));
        registry.register(Arc::new(EchoTool {
            name: "beta",
            reply: "",
        }));

        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }
}
