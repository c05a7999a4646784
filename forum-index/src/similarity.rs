//! Cosine similarity and top-K ranking.

use std::cmp::Ordering;

/// Cosine similarity of two vectors.
///
/// Returns exactly `0.0` when either vector has zero magnitude or the
/// dimensions differ, so zero-vector fallbacks never produce NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    let sim = dot / (mag_a * mag_b);
    if sim.is_finite() { sim.clamp(-1.0, 1.0) } else { 0.0 }
}

/// Scores every vector against `query` and returns the best `top_k` as
/// `(position, similarity)`, highest first.
///
/// The sort is stable: equal scores keep their original order.
pub fn rank_top_k(query: &[f32], vectors: &[Vec<f32>], top_k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = vectors
        .iter()
        .enumerate()
        .map(|(i, v)| (i, cosine_similarity(query, v)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    scored
}
