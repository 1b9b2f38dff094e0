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

use serde::{Deserialize, Serialize};

/// A single lesson within a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_number: i64,
    pub title: String,
    #[serde(default)]
    pub lesson_link: Option<String>,
}

/// A course with its ordered lessons. The title is the identity: no two
/// courses in the index may share one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    #[serde(default)]
    pub course_link: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// A chunk of course content. Chunks are immutable once created; a course's
/// chunks are replaced wholesale on re-ingestion, never patched in place.
/// `lesson_number` is None for course-level content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseChunk {
    pub course_title: String,
    #[serde(default)]
    pub lesson_number: Option<i64>,
    pub chunk_index: i32,
    pub content: String,
}

/// One search result with its metadata and distance score
/// (lower distance = more relevant)
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<i64>,
    pub chunk_index: i32,
    pub distance: f32,
}

/// Ordered search results plus an optional in-band error. Recoverable
/// retrieval failures travel here instead of through Result, so callers
/// have a single channel for both.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub error: Option<String>,
}

impl SearchResults {
    /// Empty result set carrying an error message. Error set implies no hits.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            hits: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Full per-course metadata projection from the catalog
#[derive(Debug, Clone, Serialize)]
pub struct CourseMetadata {
    pub title: String,
    pub instructor: Option<String>,
    pub course_link: Option<String>,
    pub lessons: Vec<Lesson>,
}

/// Catalog summary for the analytics read
#[derive(Debug, Clone, Serialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_results_carry_no_hits() {
        let results = SearchResults::error("Search error: backend down");
        assert!(results.is_empty());
        assert_eq!(results.error.as_deref(), Some("Search error: backend down"));
    }

    #[test]
    fn test_default_results_are_empty_without_error() {
        let results = SearchResults::default();
        assert!(results.is_empty());
        assert!(results.error.is_none());
    }

    #[test]
    fn test_course_document_optional_fields_default() {
        let course: Course = serde_json::from_str(r#"{"title": "Python Basics"}"#).unwrap();
        assert_eq!(course.title, "Python Basics");
        assert!(course.instructor.is_none());
        assert!(course.course_link.is_none());
        assert!(course.lessons.is_empty());
    }
}
