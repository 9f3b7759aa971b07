//! Seams to the systems the engine depends on but does not own: the similarity
//! index, the score history store and the skill demand source. Each comes with
//! a simple in-process implementation.

use std::collections::HashMap;
use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{HistoryError, IndexError};
use crate::models::AlumniCandidate;
use crate::similarity::{find_top_k, Metric};
use crate::vector::FeatureVector;

pub trait VectorIndex: Send + Sync {
    /// Nearest alumni to `vector`, best first, optionally limited to one major.
    fn query(
        &self,
        vector: &FeatureVector,
        filter: Option<&str>,
        top_k: usize,
    ) -> impl Future<Output = Result<Vec<AlumniCandidate>, IndexError>> + Send;
}

pub trait ScoreHistoryStore: Send + Sync {
    /// Up to `limit` past scores, newest first.
    fn recent(&self, subject_id: Uuid, limit: usize) -> Result<Vec<f64>, HistoryError>;
}

pub trait SkillDemandProvider: Send + Sync {
    fn weight(&self, skill: &str) -> f64;
}

pub const MARKET_WEIGHTS: [f64; 3] = [0.5, 1.0, 2.0];

/// Anything other than 0.5, 1.0 or 2.0 is treated as medium demand.
pub fn snap_market_weight(weight: f64) -> f64 {
    if MARKET_WEIGHTS.contains(&weight) {
        weight
    } else {
        1.0
    }
}

/// Brute-force index over an in-memory alumni set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
    alumni: Vec<AlumniCandidate>,
    metric: Metric,
}

impl InMemoryIndex {
    pub fn new(alumni: Vec<AlumniCandidate>) -> Self {
        Self {
            alumni,
            metric: Metric::Ensemble,
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn len(&self) -> usize {
        self.alumni.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alumni.is_empty()
    }
}

impl VectorIndex for InMemoryIndex {
    async fn query(
        &self,
        vector: &FeatureVector,
        filter: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<AlumniCandidate>, IndexError> {
        Ok(find_top_k(
            vector.as_slice(),
            &self.alumni,
            filter,
            top_k,
            self.metric,
        ))
    }
}

/// History store for callers that keep no past scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl ScoreHistoryStore for NoHistory {
    fn recent(&self, _subject_id: Uuid, _limit: usize) -> Result<Vec<f64>, HistoryError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    scores: HashMap<Uuid, Vec<(NaiveDate, f64)>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, subject_id: Uuid, calculated_on: NaiveDate, score: f64) {
        self.scores
            .entry(subject_id)
            .or_default()
            .push((calculated_on, score));
    }
}

impl ScoreHistoryStore for InMemoryHistory {
    fn recent(&self, subject_id: Uuid, limit: usize) -> Result<Vec<f64>, HistoryError> {
        let mut entries = self.scores.get(&subject_id).cloned().unwrap_or_default();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries
            .into_iter()
            .take(limit)
            .map(|(_, score)| score)
            .collect())
    }
}

/// Static demand table for well-known skills; unknown skills are medium demand.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSkillDemand;

const HIGH_DEMAND: &[&str] = &[
    "python",
    "react",
    "node.js",
    "aws",
    "docker",
    "kubernetes",
    "machine learning",
    "data science",
    "typescript",
];

const LOW_DEMAND: &[&str] = &["jquery", "flash", "php", "perl"];

impl SkillDemandProvider for DefaultSkillDemand {
    fn weight(&self, skill: &str) -> f64 {
        let key = skill.trim().to_lowercase();
        if HIGH_DEMAND.contains(&key.as_str()) {
            2.0
        } else if LOW_DEMAND.contains(&key.as_str()) {
            0.5
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OutcomeCategory, PlacementStatus};
    use crate::vector::DIMENSIONS;

    fn alumnus(major: &str, value: f64) -> AlumniCandidate {
        AlumniCandidate {
            id: Uuid::new_v4(),
            major: major.to_string(),
            graduation_year: 2023,
            vector: vec![value; DIMENSIONS],
            similarity: 0.0,
            outcome: OutcomeCategory {
                placement: PlacementStatus::NotPlaced,
                tier: None,
            },
            outcome_score: None,
        }
    }

    #[test]
    fn market_weights_snap_to_known_levels() {
        assert_eq!(snap_market_weight(2.0), 2.0);
        assert_eq!(snap_market_weight(0.5), 0.5);
        assert_eq!(snap_market_weight(1.7), 1.0);
        assert_eq!(snap_market_weight(f64::NAN), 1.0);
    }

    #[test]
    fn default_demand_table() {
        let demand = DefaultSkillDemand;
        assert_eq!(demand.weight("Python"), 2.0);
        assert_eq!(demand.weight(" Machine Learning "), 2.0);
        assert_eq!(demand.weight("SQL"), 1.0);
        assert_eq!(demand.weight("PHP"), 0.5);
        assert_eq!(demand.weight("Cobol"), 1.0);
    }

    #[test]
    fn history_is_newest_first_and_limited() {
        let subject = Uuid::new_v4();
        let mut history = InMemoryHistory::new();
        for day in 1..=8 {
            history.record(subject, NaiveDate::from_ymd_opt(2026, 1, day).unwrap(), day as f64);
        }
        assert_eq!(
            history.recent(subject, 3).unwrap(),
            vec![8.0, 7.0, 6.0]
        );
        assert!(history.recent(Uuid::new_v4(), 6).unwrap().is_empty());
        assert!(NoHistory.recent(subject, 6).unwrap().is_empty());
    }

    #[tokio::test]
    async fn in_memory_index_filters_and_ranks() {
        let index = InMemoryIndex::new(vec![
            alumnus("Computer Science", 0.9),
            alumnus("Computer Science", 0.2),
            alumnus("Civil Engineering", 0.9),
        ]);
        let (query, _) = FeatureVector::from_raw(&[0.9; DIMENSIONS]);
        let matches = index.query(&query, Some("Computer Science"), 5).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches[0].similarity > matches[1].similarity);
        assert!((matches[0].similarity - 1.0).abs() < 1e-9);
    }
}
