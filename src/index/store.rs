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
use arrow::record_batch::RecordBatchIterator;
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int32Array, Int64Array, RecordBatch, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use futures::TryStreamExt;
use lancedb::{
    connect,
    query::{ExecutableQuery, QueryBase},
    Connection, DistanceType,
};
use std::iter::once;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::embedding::Embedder;
use crate::index::types::{Course, CourseChunk, CourseMetadata, Lesson, SearchHit, SearchResults};

const CATALOG_TABLE: &str = "course_catalog";
const CONTENT_TABLE: &str = "course_content";

/// Build the metadata filter predicate for a content search.
/// Four cases: no filter, course only, lesson only, or the conjunction of both.
pub fn build_filter(course_title: Option<&str>, lesson_number: Option<i64>) -> Option<String> {
    match (course_title, lesson_number) {
        (None, None) => None,
        (Some(course), None) => Some(format!("course_title = '{}'", quote_literal(course))),
        (None, Some(lesson)) => Some(format!("lesson_number = {}", lesson)),
        (Some(course), Some(lesson)) => Some(format!(
            "course_title = '{}' AND lesson_number = {}",
            quote_literal(course),
            lesson
        )),
    }
}

fn quote_literal(input: &str) -> String {
    input.replace('\'', "''")
}

/// Semantic index over course material, backed by two aligned LanceDB tables:
/// a catalog with one record per course (embedded on title) and a content
/// table with one record per chunk (embedded on chunk text).
pub struct CourseIndex {
    db: Connection,
    embedder: Arc<dyn Embedder>,
    vector_dim: usize,
    max_results: usize,
}

impl CourseIndex {
    pub async fn new(
        db_path: &Path,
        embedder: Arc<dyn Embedder>,
        max_results: usize,
    ) -> Result<Self> {
        std::fs::create_dir_all(db_path)?;

        // Probe the provider once to learn the vector dimension
        let probe = embedder.embed("dimension probe").await?;
        let vector_dim = probe.len();

        let db = connect(
            db_path
                .to_str()
                .context("Index path is not valid UTF-8")?,
        )
        .execute()
        .await?;

        let index = Self {
            db,
            embedder,
            vector_dim,
            max_results,
        };
        index.initialize_tables().await?;

        Ok(index)
    }

    fn catalog_schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("title", DataType::Utf8, false),
            Field::new("instructor", DataType::Utf8, true),
            Field::new("course_link", DataType::Utf8, true),
            Field::new("lessons_json", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.vector_dim as i32,
                ),
                false,
            ),
        ]))
    }

    fn content_schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("course_title", DataType::Utf8, false),
            Field::new("lesson_number", DataType::Int64, true),
            Field::new("chunk_index", DataType::Int32, false),
            Field::new("content", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.vector_dim as i32,
                ),
                false,
            ),
        ]))
    }

    async fn initialize_tables(&self) -> Result<()> {
        let table_names = self.db.table_names().execute().await?;

        for (name, schema) in [
            (CATALOG_TABLE, self.catalog_schema()),
            (CONTENT_TABLE, self.content_schema()),
        ] {
            if !table_names.contains(&name.to_string()) {
                let empty_batch = RecordBatch::new_empty(schema.clone());
                let batch_reader = RecordBatchIterator::new(once(Ok(empty_batch)), schema);
                self.db.create_table(name, batch_reader).execute().await?;
            }
        }

        Ok(())
    }

    fn embedding_array(&self, embeddings: &[Vec<f32>]) -> Result<FixedSizeListArray> {
        let values: Vec<f32> = embeddings.iter().flat_map(|e| e.iter().copied()).collect();
        Ok(FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.vector_dim as i32,
            Arc::new(Float32Array::from(values)),
            None,
        )?)
    }

    /// Upsert a course record into the catalog, keyed by title. An existing
    /// record with the same title is overwritten.
    pub async fn add_course_metadata(&self, course: &Course) -> Result<()> {
        let table = self.db.open_table(CATALOG_TABLE).execute().await?;
        table
            .delete(&format!("title = '{}'", quote_literal(&course.title)))
            .await?;

        let embedding = self.embedder.embed(&course.title).await?;
        let lessons_json = serde_json::to_string(&course.lessons)?;

        let schema = self.catalog_schema();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![course.title.as_str()])),
                Arc::new(StringArray::from(vec![course.instructor.as_deref()])),
                Arc::new(StringArray::from(vec![course.course_link.as_deref()])),
                Arc::new(StringArray::from(vec![lessons_json.as_str()])),
                Arc::new(self.embedding_array(std::slice::from_ref(&embedding))?),
            ],
        )?;

        let batch_reader = RecordBatchIterator::new(once(Ok(batch)), schema);
        table.add(batch_reader).execute().await?;

        debug!("Cataloged course '{}'", course.title);
        Ok(())
    }

    /// Bulk insert content chunks. Chunk order within a course is carried by
    /// chunk_index; insertion order across courses is irrelevant.
    pub async fn add_content(&self, chunks: &[CourseChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(texts).await?;

        let ids: Vec<String> = chunks
            .iter()
            .map(|_| uuid::Uuid::new_v4().to_string())
            .collect();
        let course_titles: Vec<&str> = chunks.iter().map(|c| c.course_title.as_str()).collect();
        let lesson_numbers: Vec<Option<i64>> = chunks.iter().map(|c| c.lesson_number).collect();
        let chunk_indices: Vec<i32> = chunks.iter().map(|c| c.chunk_index).collect();
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();

        let schema = self.content_schema();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(
                    ids.iter().map(|s| s.as_str()).collect::<Vec<&str>>(),
                )),
                Arc::new(StringArray::from(course_titles)),
                Arc::new(Int64Array::from(lesson_numbers)),
                Arc::new(Int32Array::from(chunk_indices)),
                Arc::new(StringArray::from(contents)),
                Arc::new(self.embedding_array(&embeddings)?),
            ],
        )?;

        let table = self.db.open_table(CONTENT_TABLE).execute().await?;
        let batch_reader = RecordBatchIterator::new(once(Ok(batch)), schema);
        table.add(batch_reader).execute().await?;

        debug!("Indexed {} content chunks", chunks.len());
        Ok(())
    }

    /// Resolve a possibly partial or loosely spelled course name to the
    /// closest catalog title. Returns None only when the catalog is empty;
    /// a non-empty catalog always yields its nearest title, and callers
    /// decide acceptability.
    pub async fn resolve_course_name(&self, raw_name: &str) -> Result<Option<String>> {
        let embedding = self.embedder.embed(raw_name).await?;

        let table = self.db.open_table(CATALOG_TABLE).execute().await?;
        let mut results = table
            .vector_search(&embedding[..])?
            .distance_type(DistanceType::Cosine)
            .limit(1)
            .execute()
            .await?;

        while let Some(batch) = results.try_next().await? {
            if batch.num_rows() == 0 {
                continue;
            }
            let titles = str_col(&batch, "title");
            return Ok(Some(titles.value(0).to_string()));
        }

        Ok(None)
    }

    /// Search course content. A supplied course name is resolved against the
    /// catalog first; resolution failure short-circuits without touching the
    /// content table. Underlying query failures are converted into an error
    /// result here rather than propagated - this is the index's failure
    /// boundary.
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<i64>,
        limit: Option<usize>,
    ) -> SearchResults {
        let resolved_title = match course_name {
            Some(name) => match self.resolve_course_name(name).await {
                Ok(Some(title)) => Some(title),
                Ok(None) => {
                    return SearchResults::error(format!("No course found matching '{}'", name))
                }
                Err(e) => return SearchResults::error(format!("Search error: {}", e)),
            },
            None => None,
        };

        match self
            .query_content(query, resolved_title.as_deref(), lesson_number, limit)
            .await
        {
            Ok(results) => results,
            Err(e) => SearchResults::error(format!("Search error: {}", e)),
        }
    }

    async fn query_content(
        &self,
        query: &str,
        course_title: Option<&str>,
        lesson_number: Option<i64>,
        limit: Option<usize>,
    ) -> Result<SearchResults> {
        let embedding = self.embedder.embed(query).await?;

        let table = self.db.open_table(CONTENT_TABLE).execute().await?;
        let mut vector_query = table
            .vector_search(&embedding[..])?
            .distance_type(DistanceType::Cosine)
            .limit(limit.unwrap_or(self.max_results));

        if let Some(predicate) = build_filter(course_title, lesson_number) {
            vector_query = vector_query.only_if(predicate);
        }

        let mut results = vector_query.execute().await?;
        let mut hits = Vec::new();

        while let Some(batch) = results.try_next().await? {
            if batch.num_rows() == 0 {
                continue;
            }

            let course_titles = str_col(&batch, "course_title");
            let lesson_numbers = i64_col(&batch, "lesson_number");
            let chunk_indices = i32_col(&batch, "chunk_index");
            let contents = str_col(&batch, "content");
            let distances = f32_col(&batch, "_distance");

            for i in 0..batch.num_rows() {
                hits.push(SearchHit {
                    content: contents.value(i).to_string(),
                    course_title: course_titles.value(i).to_string(),
                    lesson_number: if lesson_numbers.is_null(i) {
                        None
                    } else {
                        Some(lesson_numbers.value(i))
                    },
                    chunk_index: chunk_indices.value(i),
                    distance: distances.value(i),
                });
            }
        }

        Ok(SearchResults { hits, error: None })
    }

    /// List distinct course titles currently in the catalog
    pub async fn existing_course_titles(&self) -> Result<Vec<String>> {
        let table = self.db.open_table(CATALOG_TABLE).execute().await?;
        let batches: Vec<RecordBatch> = table.query().execute().await?.try_collect().await?;

        let mut titles = Vec::new();
        for batch in batches {
            let column = str_col(&batch, "title");
            for i in 0..batch.num_rows() {
                titles.push(column.value(i).to_string());
            }
        }

        Ok(titles)
    }

    /// Number of courses in the catalog
    pub async fn course_count(&self) -> Result<usize> {
        let table = self.db.open_table(CATALOG_TABLE).execute().await?;
        Ok(table.count_rows(None).await?)
    }

    /// Full metadata projection of every cataloged course
    pub async fn all_courses_metadata(&self) -> Result<Vec<CourseMetadata>> {
        let table = self.db.open_table(CATALOG_TABLE).execute().await?;
        let batches: Vec<RecordBatch> = table.query().execute().await?.try_collect().await?;

        let mut courses = Vec::new();
        for batch in batches {
            let titles = str_col(&batch, "title");
            let instructors = str_col(&batch, "instructor");
            let links = str_col(&batch, "course_link");
            let lessons_json = str_col(&batch, "lessons_json");

            for i in 0..batch.num_rows() {
                let lessons: Vec<Lesson> = serde_json::from_str(lessons_json.value(i))
                    .context("Invalid lesson metadata in catalog")?;
                courses.push(CourseMetadata {
                    title: titles.value(i).to_string(),
                    instructor: opt_str(instructors, i),
                    course_link: opt_str(links, i),
                    lessons,
                });
            }
        }

        Ok(courses)
    }

    /// Link for a course, or None if the course is absent
    pub async fn course_link(&self, title: &str) -> Result<Option<String>> {
        Ok(self
            .catalog_record(title)
            .await?
            .and_then(|course| course.course_link))
    }

    /// Link for a single lesson, or None if the course or lesson is absent
    pub async fn lesson_link(&self, title: &str, lesson_number: i64) -> Result<Option<String>> {
        Ok(self.catalog_record(title).await?.and_then(|course| {
            course
                .lessons
                .into_iter()
                .find(|lesson| lesson.lesson_number == lesson_number)
                .and_then(|lesson| lesson.lesson_link)
        }))
    }

    async fn catalog_record(&self, title: &str) -> Result<Option<CourseMetadata>> {
        let table = self.db.open_table(CATALOG_TABLE).execute().await?;
        let batches: Vec<RecordBatch> = table
            .query()
            .only_if(format!("title = '{}'", quote_literal(title)))
            .limit(1)
            .execute()
            .await?
            .try_collect()
            .await?;

        for batch in batches {
            if batch.num_rows() == 0 {
                continue;
            }
            let titles = str_col(&batch, "title");
            let instructors = str_col(&batch, "instructor");
            let links = str_col(&batch, "course_link");
            let lessons_json = str_col(&batch, "lessons_json");
            let lessons: Vec<Lesson> = serde_json::from_str(lessons_json.value(0))
                .context("Invalid lesson metadata in catalog")?;
            return Ok(Some(CourseMetadata {
                title: titles.value(0).to_string(),
                instructor: opt_str(instructors, 0),
                course_link: opt_str(links, 0),
                lessons,
            }));
        }

        Ok(None)
    }

    /// Empty both collections; used before a full re-ingestion pass
    pub async fn clear_all(&self) -> Result<()> {
        for name in [CATALOG_TABLE, CONTENT_TABLE] {
            let table = self.db.open_table(name).execute().await?;
            table.delete("true").await?;
        }
        Ok(())
    }
}

fn str_col<'a>(batch: &'a RecordBatch, name: &str) -> &'a StringArray {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap()
}

fn i64_col<'a>(batch: &'a RecordBatch, name: &str) -> &'a Int64Array {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
}

fn i32_col<'a>(batch: &'a RecordBatch, name: &str) -> &'a Int32Array {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<Int32Array>()
        .unwrap()
}

fn f32_col<'a>(batch: &'a RecordBatch, name: &str) -> &'a Float32Array {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<Float32Array>()
        .unwrap()
}

fn opt_str(array: &StringArray, index: usize) -> Option<String> {
    if array.is_null(index) {
        None
    } else {
        Some(array.value(index).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_none() {
        assert_eq!(build_filter(None, None), None);
    }

    #[test]
    fn test_build_filter_course_only() {
        assert_eq!(
            build_filter(Some("Python Basics"), None).as_deref(),
            Some("course_title = 'Python Basics'")
        );
    }

    #[test]
    fn test_build_filter_lesson_only() {
        assert_eq!(
            build_filter(None, Some(2)).as_deref(),
            Some("lesson_number = 2")
        );
    }

    #[test]
    fn test_build_filter_combined() {
        assert_eq!(
            build_filter(Some("Python Basics"), Some(2)).as_deref(),
            Some("course_title = 'Python Basics' AND lesson_number = 2")
        );
    }

    #[test]
    fn test_build_filter_escapes_quotes() {
        assert_eq!(
            build_filter(Some("Bob's Course"), None).as_deref(),
            Some("course_title = 'Bob''s Course'")
        );
    }
}
