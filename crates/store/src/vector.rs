//! Vector similarity utilities and the in-memory book index.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity
//! - Centroid of a set of embeddings (taste profile from liked books)
//! - A small exact k-NN index over book embeddings

use std::collections::HashSet;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Element-wise mean of a set of equal-length vectors.
///
/// Returns `None` for an empty set or mismatched dimensions.
pub fn centroid(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let dim = first.len();
    if vectors.iter().any(|v| v.len() != dim) {
        return None;
    }

    let mut sum = vec![0.0f32; dim];
    for v in vectors {
        for (s, x) in sum.iter_mut().zip(v.iter()) {
            *s += x;
        }
    }

    let n = vectors.len() as f32;
    for s in &mut sum {
        *s /= n;
    }
    Some(sum)
}

/// One indexed item: a book id, its embedding, and a display payload
/// (the title).
#[derive(Debug, Clone)]
pub struct VectorEntry {
    pub id: i64,
    pub embedding: Vec<f32>,
    pub payload: String,
}

/// A scored search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub id: i64,
    pub payload: String,
    pub score: f32,
}

/// An exact-scan k-NN index over book embeddings.
///
/// The catalog is small enough that a linear scan beats maintaining an
/// approximate structure.
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<VectorEntry>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, id: i64, embedding: Vec<f32>, payload: impl Into<String>) {
        self.entries.push(VectorEntry {
            id,
            embedding,
            payload: payload.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `k` entries nearest to `query`, best first, skipping any id in
    /// `exclude`.
    pub fn nearest(&self, query: &[f32], k: usize, exclude: &HashSet<i64>) -> Vec<VectorHit> {
        let mut hits: Vec<VectorHit> = self
            .entries
            .iter()
            .filter(|e| !exclude.contains(&e.id))
            .map(|e| VectorHit {
                id: e.id,
                payload: e.payload.clone(),
                score: cosine_similarity(&e.embedding, query),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        hits
    }

    /// Like `nearest`, but drops hits below `min_score`.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        min_score: f32,
        exclude: &HashSet<i64>,
    ) -> Vec<VectorHit> {
        self.nearest(query, k, exclude)
            .into_iter()
            .filter(|h| h.score >= min_score)
            .collect()
    }
}
