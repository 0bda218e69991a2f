//! Deterministic test doubles for offline retrieval tests.
//!
//! [`HashEmbedder`] derives a stable pseudo-embedding from a SHA-256
//! digest of the input text. It exists so store and retriever behavior
//! can be exercised without a network provider; it is never selectable
//! from application configuration and must not appear on production
//! code paths.

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::embedding::EmbeddingProvider;

/// Hash-derived embedding provider. Same text, same vector, always.
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = Vec::with_capacity(self.dims);
        let mut block: u32 = 0;
        while vector.len() < self.dims {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            hasher.update(block.to_le_bytes());
            let digest = hasher.finalize();
            for byte in digest {
                if vector.len() == self.dims {
                    break;
                }
                // Map each byte into [-1.0, 1.0].
                vector.push(byte as f32 / 127.5 - 1.0);
            }
            block += 1;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash-stub"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
