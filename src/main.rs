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
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod commands;

use cli::Cli;
use lectern::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; the API key may come from the real environment
    dotenvy::dotenv().ok();

    // Own logs at info unless RUST_LOG says otherwise
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(concat!(env!("CARGO_PKG_NAME"), "=info")));
    fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    let config = Config::load()?;

    commands::execute(&config, cli.command).await
}
