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
use colored::Colorize;
use std::sync::Arc;

use crate::cli::Commands;
use lectern::assistant::CourseAssistant;
use lectern::config::Config;
use lectern::embedding::ProviderEmbedder;
use lectern::index::CourseIndex;
use lectern::ingest;
use lectern::llm::AnthropicClient;

async fn open_index(config: &Config) -> Result<Arc<CourseIndex>> {
    let embedder = Arc::new(ProviderEmbedder::from_config(config).await?);
    let db_path = lectern::storage::get_index_dir()?;
    let index = CourseIndex::new(&db_path, embedder, config.search.max_results).await?;
    Ok(Arc::new(index))
}

pub async fn execute(config: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::Ask { question, session } => {
            let index = open_index(config).await?;
            let model = Arc::new(AnthropicClient::from_env()?);
            let assistant = CourseAssistant::new(index, model, &config.llm);

            let answer = assistant.query(&question, session.as_deref()).await?;
            println!("{}", answer.text);

            if !answer.sources.is_empty() {
                println!();
                println!("{}", "Sources:".bold());
                for source in answer.sources {
                    println!("  {}", source.bright_black());
                }
            }
        }

        Commands::Ingest { path, clear } => {
            let index = open_index(config).await?;
            let summary = ingest::ingest_path(&index, &path, clear).await?;
            println!(
                "Indexed {} course(s), {} chunk(s)",
                summary.courses_added.to_string().green(),
                summary.chunks_added.to_string().green()
            );
        }

        Commands::Courses => {
            let index = open_index(config).await?;
            let courses = index.all_courses_metadata().await?;

            if courses.is_empty() {
                println!("No courses indexed");
                return Ok(());
            }

            println!("{} course(s) indexed:\n", courses.len());
            for course in courses {
                println!("{}", course.title.blue().bold());
                if let Some(instructor) = &course.instructor {
                    println!("  Instructor: {}", instructor);
                }
                if let Some(link) = &course.course_link {
                    println!("  {}", link.bright_black());
                }
                println!("  {} lesson(s)", course.lessons.len());
            }
        }

        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!("Refusing to clear without --yes");
            }
            let index = open_index(config).await?;
            index.clear_all().await?;
            println!("Course index cleared");
        }
    }

    Ok(())
}
