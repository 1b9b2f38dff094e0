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
use async_trait::async_trait;

// Re-export embedding functionality from octolib
pub use octolib::embedding::{
    parse_provider_model, provider::create_embedding_provider_from_parts,
    provider::EmbeddingProvider, types::InputType,
};

/// Text embedding seam used by the course index. Production code wraps an
/// octolib provider; tests supply a deterministic implementation.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// Embedder backed by an octolib embedding provider
pub struct ProviderEmbedder {
    inner: Box<dyn EmbeddingProvider>,
}

impl ProviderEmbedder {
    /// Create embedding provider from config
    pub async fn from_config(config: &crate::config::Config) -> Result<Self> {
        let (provider, model) = parse_provider_model(&config.embedding.model)?;
        let inner = create_embedding_provider_from_parts(&provider, &model).await?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.inner.generate_embedding(text).await
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.inner
            .generate_embeddings_batch(texts, InputType::None)
            .await
    }
}
