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

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::index::types::SearchHit;
use crate::index::CourseIndex;
use crate::llm::ToolDefinition;
use crate::tools::{Tool, ToolOutput};

/// Retrieval tool wrapping the course index behind a declarative schema the
/// LLM can invoke
pub struct SearchTool {
    index: Arc<CourseIndex>,
}

impl SearchTool {
    pub fn new(index: Arc<CourseIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_course_content".to_string(),
            description:
                "Search course materials with smart course name matching and lesson filtering"
                    .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> ToolOutput {
        let query = match arguments.get("query").and_then(|v| v.as_str()) {
            Some(query) => query,
            None => return ToolOutput::text("Missing required parameter: query"),
        };
        let course_name = arguments.get("course_name").and_then(|v| v.as_str());
        let lesson_number = arguments.get("lesson_number").and_then(|v| v.as_i64());

        let results = self
            .index
            .search(query, course_name, lesson_number, None)
            .await;

        // Index-level failures (unresolvable course, backend errors) come
        // back as error strings the model can react to
        if let Some(error) = results.error {
            return ToolOutput::text(error);
        }

        if results.is_empty() {
            return ToolOutput::text(no_results_message(course_name, lesson_number));
        }

        format_results(&results.hits)
    }
}

/// Fixed empty-result message, with a parenthetical describing any active
/// filters for user clarity
fn no_results_message(course_name: Option<&str>, lesson_number: Option<i64>) -> String {
    let mut filter_info = String::new();
    if let Some(course) = course_name {
        filter_info.push_str(&format!(" in course '{}'", course));
    }
    if let Some(lesson) = lesson_number {
        filter_info.push_str(&format!(" in lesson {}", lesson));
    }
    format!("No relevant content found{}.", filter_info)
}

/// Format hits as labeled blocks and collect one provenance label per hit.
/// The label omits the lesson suffix when the hit has no lesson number.
fn format_results(hits: &[SearchHit]) -> ToolOutput {
    let mut blocks = Vec::with_capacity(hits.len());
    let mut sources = Vec::with_capacity(hits.len());

    for hit in hits {
        let label = match hit.lesson_number {
            Some(lesson) => format!("{} - Lesson {}", hit.course_title, lesson),
            None => hit.course_title.clone(),
        };
        blocks.push(format!("[{}]\n{}", label, hit.content));
        sources.push(label);
    }

    ToolOutput {
        content: blocks.join("\n\n"),
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(content: &str, course: &str, lesson: Option<i64>) -> SearchHit {
        SearchHit {
            content: content.to_string(),
            course_title: course.to_string(),
            lesson_number: lesson,
            chunk_index: 0,
            distance: 0.1,
        }
    }

    #[test]
    fn test_format_results_with_lesson_numbers() {
        let hits = vec![
            hit("Python is great", "Python Basics", Some(1)),
            hit("Variables are important", "Python Basics", Some(2)),
        ];

        let output = format_results(&hits);

        assert!(output.content.contains("[Python Basics - Lesson 1]\nPython is great"));
        assert!(output
            .content
            .contains("[Python Basics - Lesson 2]\nVariables are important"));
        assert_eq!(
            output.sources,
            vec!["Python Basics - Lesson 1", "Python Basics - Lesson 2"]
        );
    }

    #[test]
    fn test_format_results_without_lesson_number() {
        let hits = vec![hit("General course info", "Python Basics", None)];

        let output = format_results(&hits);

        assert!(output.content.contains("[Python Basics]\nGeneral course info"));
        assert_eq!(output.sources, vec!["Python Basics"]);
    }

    #[test]
    fn test_provenance_length_matches_hit_count() {
        let hits = vec![
            hit("a", "Course A", Some(1)),
            hit("b", "Course A", None),
            hit("c", "Course B", Some(3)),
        ];

        let output = format_results(&hits);
        assert_eq!(output.sources.len(), hits.len());
    }

    #[test]
    fn test_no_results_message_plain() {
        assert_eq!(no_results_message(None, None), "No relevant content found.");
    }

    #[test]
    fn test_no_results_message_with_filters() {
        assert_eq!(
            no_results_message(Some("Python Basics"), Some(2)),
            "No relevant content found in course 'Python Basics' in lesson 2."
        );
    }
}
