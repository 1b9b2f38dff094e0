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
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::index::types::{Course, CourseChunk, Lesson};
use crate::index::CourseIndex;

/// On-disk course document. Parsing raw course material into this shape is
/// an external pipeline's job; this module only deserializes the structured
/// records it hands over.
#[derive(Debug, Deserialize)]
struct CourseDocument {
    title: String,
    #[serde(default)]
    course_link: Option<String>,
    #[serde(default)]
    instructor: Option<String>,
    #[serde(default)]
    lessons: Vec<Lesson>,
    chunks: Vec<ChunkRecord>,
}

#[derive(Debug, Deserialize)]
struct ChunkRecord {
    #[serde(default)]
    lesson_number: Option<i64>,
    chunk_index: i32,
    content: String,
}

/// Outcome of one ingestion pass
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub courses_added: usize,
    pub chunks_added: usize,
}

/// Load one structured course document
pub fn load_course_file(path: &Path) -> Result<(Course, Vec<CourseChunk>)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: CourseDocument = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid course document {}", path.display()))?;

    if document.title.trim().is_empty() {
        anyhow::bail!("Course document {} has an empty title", path.display());
    }

    let course = Course {
        title: document.title.clone(),
        course_link: document.course_link,
        instructor: document.instructor,
        lessons: document.lessons,
    };

    let mut chunks: Vec<CourseChunk> = document
        .chunks
        .into_iter()
        .map(|chunk| CourseChunk {
            course_title: document.title.clone(),
            lesson_number: chunk.lesson_number,
            chunk_index: chunk.chunk_index,
            content: chunk.content,
        })
        .collect();
    chunks.sort_by_key(|chunk| chunk.chunk_index);

    Ok((course, chunks))
}

/// Index a single file or every .json document in a directory. A bad file
/// contributes zero courses and the pass continues; courses whose titles are
/// already cataloged are skipped unless `clear_existing` wiped the index
/// first.
pub async fn ingest_path(
    index: &CourseIndex,
    path: &Path,
    clear_existing: bool,
) -> Result<IngestSummary> {
    if clear_existing {
        info!("Clearing existing course data");
        index.clear_all().await?;
    }

    let files = if path.is_dir() {
        let mut entries: Vec<_> = std::fs::read_dir(path)
            .with_context(|| format!("Failed to read directory {}", path.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        entries.sort();
        entries
    } else {
        vec![path.to_path_buf()]
    };

    let mut existing = index.existing_course_titles().await?;
    let mut summary = IngestSummary::default();

    for file in files {
        let (course, chunks) = match load_course_file(&file) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Skipping {}: {}", file.display(), e);
                continue;
            }
        };

        if existing.contains(&course.title) {
            info!("Course '{}' already indexed, skipping", course.title);
            continue;
        }

        if let Err(e) = index.add_course_metadata(&course).await {
            warn!("Failed to catalog '{}': {}", course.title, e);
            continue;
        }
        if let Err(e) = index.add_content(&chunks).await {
            warn!("Failed to index content for '{}': {}", course.title, e);
            continue;
        }

        info!("Indexed '{}' ({} chunks)", course.title, chunks.len());
        existing.push(course.title);
        summary.courses_added += 1;
        summary.chunks_added += chunks.len();
    }

    Ok(summary)
}
