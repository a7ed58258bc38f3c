//! Similarity ranking of profile documents against a query embedding.

use crate::documents::ProfileDocument;
use serde::{Deserialize, Serialize};

/// A document together with its similarity to the current query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: ProfileDocument,
    pub score: f32,
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 for empty, zero-magnitude or length-mismatched vectors.
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

    let score = dot / denom;
    if !score.is_finite() {
        return 0.0;
    }
    score.clamp(-1.0, 1.0) as f32
}

/// Score every document against `query` and sort by descending similarity.
///
/// `embeddings[i]` belongs to `documents[i]`; a document without an embedding
/// scores 0. All documents are returned. The sort is stable, so equal scores
/// keep document order.
pub fn rank(
    query: &[f32],
    documents: Vec<ProfileDocument>,
    embeddings: &[Vec<f32>],
) -> Vec<ScoredDocument> {
    let mut scored: Vec<ScoredDocument> = documents
        .into_iter()
        .enumerate()
        .map(|(i, document)| {
            let score = embeddings
                .get(i)
                .map_or(0.0, |emb| cosine_similarity(query, emb));
            ScoredDocument { document, score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}
