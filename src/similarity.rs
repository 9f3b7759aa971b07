//! Similarity metrics and top-K ranking over alumni candidates.
//!
//! All metrics return a score in [0, 1], 1 meaning identical vectors. Shape
//! problems produce a zero score rather than an error.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, warn};

use crate::confidence::{mean, std_dev};
use crate::models::AlumniCandidate;
use crate::vector::{validate_vector, DIMENSIONS};

const COSINE_WEIGHT: f64 = 0.70;
const EUCLIDEAN_WEIGHT: f64 = 0.30;

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn l2_norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Cosine similarity rescaled from [-1, 1] to [0, 1].
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let value = (dot(a, b) / (norm_a * norm_b) + 1.0) / 2.0;
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let distance = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt();
    if distance.is_nan() {
        return 0.0;
    }
    1.0 / (1.0 + distance)
}

/// Pattern match weighted over magnitude match.
pub fn ensemble(a: &[f64], b: &[f64]) -> f64 {
    COSINE_WEIGHT * cosine(a, b) + EUCLIDEAN_WEIGHT * euclidean(a, b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    Cosine,
    Euclidean,
    #[default]
    Ensemble,
}

impl Metric {
    pub fn score(self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Metric::Cosine => cosine(a, b),
            Metric::Euclidean => euclidean(a, b),
            Metric::Ensemble => ensemble(a, b),
        }
    }
}

/// Bound an externally supplied similarity to [0, 1]. Non-finite values count
/// as no similarity at all.
pub fn bounded_similarity(similarity: f64) -> f64 {
    if similarity.is_finite() {
        similarity.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Similarity descending, then graduation year descending.
fn by_similarity_then_recency(a: &AlumniCandidate, b: &AlumniCandidate) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| b.graduation_year.cmp(&a.graduation_year))
}

pub fn rank_candidates(candidates: &mut [AlumniCandidate]) {
    candidates.sort_by(by_similarity_then_recency);
}

/// Score every candidate against `query`, keep those whose major matches
/// `filter` and return the best `k`. An invalid query yields no matches.
pub fn find_top_k(
    query: &[f64],
    candidates: &[AlumniCandidate],
    filter: Option<&str>,
    k: usize,
    metric: Metric,
) -> Vec<AlumniCandidate> {
    let check = validate_vector(query);
    if !check.is_valid() {
        warn!(
            dimension = query.len(),
            expected = DIMENSIONS,
            finite = check.finite,
            "rejecting similarity query with invalid vector"
        );
        return Vec::new();
    }
    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<AlumniCandidate> = candidates
        .iter()
        .filter(|c| filter.map_or(true, |major| c.major == major))
        .map(|c| AlumniCandidate {
            similarity: metric.score(query, &c.vector),
            ..c.clone()
        })
        .collect();

    rank_candidates(&mut scored);
    scored.truncate(k);

    debug!(
        matches = scored.len(),
        k,
        filter = filter.unwrap_or("none"),
        "ranked alumni candidates"
    );
    scored
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SimilarityStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

pub fn similarity_stats(candidates: &[AlumniCandidate]) -> SimilarityStats {
    if candidates.is_empty() {
        return SimilarityStats::default();
    }
    let scores: Vec<f64> = candidates.iter().map(|c| c.similarity).collect();
    SimilarityStats {
        mean: mean(&scores),
        std_dev: std_dev(&scores),
        min: scores.iter().copied().fold(f64::INFINITY, f64::min),
        max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        count: scores.len(),
    }
}
