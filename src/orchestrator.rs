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

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::llm::{ChatModel, ContentBlock, Message, MessagesRequest, MessagesResponse};
use crate::tools::ToolRegistry;

const SYSTEM_PROMPT: &str = "\
You are an AI assistant specialized in course materials and educational content, \
with access to a search tool for course information.

Search tool usage:
- Use the search tool only for questions about specific course content or detailed educational materials
- One search per query maximum
- Synthesize search results into accurate, fact-based responses
- If the search yields no results, state this clearly without offering alternatives

Response protocol:
- General knowledge questions: answer using existing knowledge without searching
- Course-specific questions: search first, then answer
- Never mention the search process or that results came from a tool

All responses must be:
1. Brief and focused - get to the point quickly
2. Educational - maintain instructional value
3. Clear - use accessible language
4. Example-supported - include relevant examples when they aid understanding";

/// Final answer for one orchestrated request, with the provenance captured
/// during that request only
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

/// Drives the LLM request/response cycle, dispatching tool-use requests
/// through the registry. At most one tool round per request: the follow-up
/// call declares no tools, so a second tool_use stop reason is structurally
/// impossible to act on.
pub struct Orchestrator {
    model: Arc<dyn ChatModel>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn ChatModel>, config: &LlmConfig) -> Self {
        Self {
            model,
            model_name: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Answer a query, optionally seeded with a rendered conversation
    /// history. Transport failures propagate: they are fatal for this
    /// request.
    pub async fn generate_response(
        &self,
        query: &str,
        history: Option<&str>,
        registry: &ToolRegistry,
    ) -> Result<Answer> {
        let system = match history {
            Some(history) => format!("{}\n\nPrevious conversation:\n{}", SYSTEM_PROMPT, history),
            None => SYSTEM_PROMPT.to_string(),
        };

        let definitions = registry.definitions();
        let has_tools = !definitions.is_empty();
        let request = MessagesRequest {
            model: self.model_name.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system.clone(),
            messages: vec![Message::user_text(query)],
            tools: has_tools.then_some(definitions),
            tool_choice: has_tools.then(|| json!({"type": "auto"})),
        };

        let reply = self.model.create_message(request).await?;

        if !reply.is_tool_use() {
            return Ok(Answer {
                text: reply.first_text().unwrap_or_default().to_string(),
                sources: Vec::new(),
            });
        }

        self.resolve_tool_round(query, &system, reply, registry)
            .await
    }

    /// Execute every tool-use block from the reply and issue the single
    /// follow-up call. Message history for the follow-up is exactly: original
    /// user message, the assistant's tool-use reply verbatim, and one user
    /// message carrying the ordered tool results tagged by call id.
    async fn resolve_tool_round(
        &self,
        query: &str,
        system: &str,
        reply: MessagesResponse,
        registry: &ToolRegistry,
    ) -> Result<Answer> {
        let mut tool_results = Vec::new();
        let mut sources = Vec::new();

        for block in &reply.content {
            if let ContentBlock::ToolUse { id, name, input } = block {
                let output = registry.execute(name, input).await;
                sources.extend(output.sources);
                tool_results.push(ContentBlock::ToolResult {
                    tool_use_id: id.clone(),
                    content: output.content,
                });
            }
        }

        let mut messages = vec![Message::user_text(query), Message::assistant(reply.content)];
        if !tool_results.is_empty() {
            messages.push(Message::user(tool_results));
        }

        let followup = MessagesRequest {
            model: self.model_name.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system.to_string(),
            messages,
            tools: None,
            tool_choice: None,
        };

        let final_reply = self.model.create_message(followup).await?;

        Ok(Answer {
            text: final_reply.first_text().unwrap_or_default().to_string(),
            sources,
        })
    }
}
