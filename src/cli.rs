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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(version)]
#[command(about = "Ask questions about indexed course materials", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question about the indexed course materials
    Ask {
        /// The question to answer
        question: String,

        /// Session key for follow-up questions (reuses prior exchanges as context)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Index structured course documents from a JSON file or directory
    Ingest {
        /// Path to a course document or a directory of course documents
        path: PathBuf,

        /// Clear existing data before indexing
        #[arg(long)]
        clear: bool,
    },

    /// List indexed courses
    Courses,

    /// Clear ALL indexed course data
    Clear {
        /// Confirm deletion without prompting
        #[arg(short = 'y', long)]
        yes: bool,
    },
}
