//! Deterministic local embedding fallback.
//!
//! Projects text into a fixed-dimension vector by hashing terms into
//! buckets and weighting by term frequency. Lower quality than a hosted
//! model, but reproducible, never blocking, and free of external
//! dependencies. It keeps the pipeline functional when no hosted
//! provider is configured.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::embed::Embedder;
use crate::error::EngineError;

pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Hash a term into a bucket index with FNV-1a.
    fn bucket(term: &str, dims: usize) -> usize {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in term.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        (h as usize) % dims
    }

    fn project(&self, text: &str) -> Vec<f32> {
        let terms: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .collect();

        let mut vec = vec![0.0f32; self.dimensions];
        if terms.is_empty() {
            return vec;
        }

        let mut tf: HashMap<&str, f32> = HashMap::new();
        for term in &terms {
            *tf.entry(term.as_str()).or_default() += 1.0;
        }

        let total = terms.len() as f32;
        for (term, count) in &tf {
            vec[Self::bucket(term, self.dimensions)] += count / total;
        }

        // L2 normalize so cosine distance behaves.
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        Ok(self.project(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash-fallback"
    }

    fn is_remote(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deterministic_for_identical_text() {
        let e = HashEmbedder::new(64);
        let a = e.embed("the mitochondria is the powerhouse").await.unwrap();
        let b = e.embed("the mitochondria is the powerhouse").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn produces_requested_dimensions() {
        let e = HashEmbedder::new(256);
        let v = e.embed("hello world").await.unwrap();
        assert_eq!(v.len(), 256);
    }

    #[tokio::test]
    async fn nonempty_text_is_unit_length() {
        let e = HashEmbedder::new(128);
        let v = e.embed("a few distinct words here").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn empty_text_is_the_zero_vector() {
        let e = HashEmbedder::new(32);
        let v = e.embed(" ... ").await.unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn different_texts_differ() {
        let e = HashEmbedder::new(128);
        let a = e.embed("paris is in france").await.unwrap();
        let b = e.embed("tokyo is in japan").await.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn never_advertises_generative_capability() {
        assert!(!HashEmbedder::new(8).is_remote());
    }
}
