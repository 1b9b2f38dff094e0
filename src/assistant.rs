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
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::index::types::CourseAnalytics;
use crate::index::CourseIndex;
use crate::llm::ChatModel;
use crate::orchestrator::{Answer, Orchestrator};
use crate::session::SessionStore;
use crate::tools::{SearchTool, ToolRegistry};

/// Ties the course index, tool registry, orchestrator and session store
/// together behind the caller-facing query interface. All collaborators are
/// passed in, so several assistants can coexist in one process without
/// shared state.
pub struct CourseAssistant {
    index: Arc<CourseIndex>,
    registry: ToolRegistry,
    orchestrator: Orchestrator,
    sessions: SessionStore,
}

impl CourseAssistant {
    pub fn new(index: Arc<CourseIndex>, model: Arc<dyn ChatModel>, llm: &LlmConfig) -> Self {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(SearchTool::new(index.clone())));

        Self {
            index,
            registry,
            orchestrator: Orchestrator::new(model, llm),
            sessions: SessionStore::new(),
        }
    }

    /// Answer a question, optionally continuing a keyed session. The answer
    /// carries the provenance labels captured during this call only; when a
    /// session key is supplied the exchange is persisted before returning.
    pub async fn query(&self, question: &str, session_key: Option<&str>) -> Result<Answer> {
        let prompt = format!("Answer this question about course materials: {}", question);
        let history = session_key.and_then(|key| self.sessions.history(key));

        let answer = self
            .orchestrator
            .generate_response(&prompt, history.as_deref(), &self.registry)
            .await?;

        if let Some(key) = session_key {
            self.sessions.add_exchange(key, question, &answer.text);
        }

        Ok(answer)
    }

    /// Direct projection of the catalog, no caching
    pub async fn analytics(&self) -> Result<CourseAnalytics> {
        Ok(CourseAnalytics {
            total_courses: self.index.course_count().await?,
            course_titles: self.index.existing_course_titles().await?,
        })
    }

    pub fn index(&self) -> &Arc<CourseIndex> {
        &self.index
    }
}
