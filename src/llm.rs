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

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MESSAGES_API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// A single content block within a message. Replies carry Text blocks for
/// ordinary completions and ToolUse blocks when the model requests a tool
/// invocation; ToolResult blocks only ever travel in the follow-up request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A role-tagged message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }
}

/// Declarative schema of a callable tool, passed verbatim to the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// One "create message" request
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
}

/// Reply from the messages API: content blocks plus a stop-reason
/// discriminator
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

impl MessagesResponse {
    /// Text of the first text block, if any
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn is_tool_use(&self) -> bool {
        self.stop_reason.as_deref() == Some("tool_use")
    }
}

/// LLM transport seam. Production code uses the Anthropic messages API;
/// tests script responses.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn create_message(&self, request: MessagesRequest) -> Result<MessagesResponse>;
}

/// Anthropic messages API client. Transport failures propagate as errors;
/// no retry policy lives here.
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .user_agent("Lectern/0.1")
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: MESSAGES_API_URL.to_string(),
        })
    }

    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var("ANTHROPIC_API_KEY").context("ANTHROPIC_API_KEY is not set")?;
        Self::new(api_key)
    }
}

#[async_trait]
impl ChatModel for AnthropicClient {
    async fn create_message(&self, request: MessagesRequest) -> Result<MessagesResponse> {
        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .context("Failed to reach messages API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Messages API error {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to decode messages API response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization_includes_tool_choice() {
        let request = MessagesRequest {
            model: "test-model".to_string(),
            max_tokens: 800,
            temperature: 0.0,
            system: "system prompt".to_string(),
            messages: vec![Message::user_text("What is Python?")],
            tools: Some(vec![ToolDefinition {
                name: "search_course_content".to_string(),
                description: "Search".to_string(),
                input_schema: json!({"type": "object"}),
            }]),
            tool_choice: Some(json!({"type": "auto"})),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["tool_choice"], json!({"type": "auto"}));
        assert_eq!(value["tools"][0]["name"], "search_course_content");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"][0]["type"], "text");
    }

    #[test]
    fn test_request_serialization_omits_absent_tools() {
        let request = MessagesRequest {
            model: "test-model".to_string(),
            max_tokens: 800,
            temperature: 0.0,
            system: "system prompt".to_string(),
            messages: vec![Message::user_text("hello")],
            tools: None,
            tool_choice: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
    }

    #[test]
    fn test_response_deserialization_tool_use() {
        let raw = json!({
            "content": [
                {"type": "tool_use", "id": "tool_123", "name": "search_course_content",
                 "input": {"query": "Python basics"}}
            ],
            "stop_reason": "tool_use"
        });

        let response: MessagesResponse = serde_json::from_value(raw).unwrap();
        assert!(response.is_tool_use());
        assert!(response.first_text().is_none());
        match &response.content[0] {
            ContentBlock::ToolUse { id, name, input } => {
                assert_eq!(id, "tool_123");
                assert_eq!(name, "search_course_content");
                assert_eq!(input["query"], "Python basics");
            }
            other => panic!("unexpected block: {:?}", other),
        }
    }

    #[test]
    fn test_response_first_text() {
        let raw = json!({
            "content": [{"type": "text", "text": "Direct answer"}],
            "stop_reason": "end_turn"
        });

        let response: MessagesResponse = serde_json::from_value(raw).unwrap();
        assert!(!response.is_tool_use());
        assert_eq!(response.first_text(), Some("Direct answer"));
    }
}
