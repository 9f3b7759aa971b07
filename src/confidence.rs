//! Prediction confidence and score trend.

use serde::Serialize;
use tracing::debug;

use crate::models::{AlumniCandidate, Trend};
use crate::outcome::candidate_outcome;

/// Newest scores averaged against the ones before them.
pub const TREND_WINDOW: usize = 3;
pub const TREND_POINTS: usize = TREND_WINDOW * 2;
const TREND_THRESHOLD: f64 = 1.0;

/// Zero-match predictions never report more than this.
pub const ZERO_MATCH_CEILING: f64 = 0.45;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg) * (v - avg)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Which of the six expected inputs were supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataCompleteness {
    /// Out of gpa, attendance, study hours and project count.
    pub core_fields_present: u8,
    pub has_wellbeing: bool,
    pub has_skills: bool,
}

impl DataCompleteness {
    pub const EXPECTED: u8 = 6;

    pub fn fraction(&self) -> f64 {
        let present = self.core_fields_present.min(4)
            + u8::from(self.has_wellbeing)
            + u8::from(self.has_skills);
        f64::from(present) / f64::from(Self::EXPECTED)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceFactors {
    pub match_count: f64,
    pub similarity_consistency: f64,
    pub outcome_variance: f64,
    pub data_completeness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Confidence {
    pub value: f64,
    pub margin_of_error: f64,
    pub factors: ConfidenceFactors,
}

pub fn match_count_factor(count: usize) -> f64 {
    match count {
        0..=4 => 0.4,
        5..=9 => 0.7,
        _ => 1.0,
    }
}

fn spread_factor(spread: f64, tight: f64, loose: f64) -> f64 {
    if spread < tight {
        1.0
    } else if spread < loose {
        0.7
    } else {
        0.4
    }
}

pub fn estimate_confidence(
    candidates: &[AlumniCandidate],
    completeness: DataCompleteness,
) -> Confidence {
    let (similarity_consistency, outcome_variance) = if candidates.is_empty() {
        (0.4, 0.4)
    } else {
        let similarities: Vec<f64> = candidates.iter().map(|c| c.similarity).collect();
        let outcomes: Vec<f64> = candidates.iter().map(candidate_outcome).collect();
        (
            spread_factor(std_dev(&similarities), 0.1, 0.2),
            spread_factor(std_dev(&outcomes), 10.0, 20.0),
        )
    };

    let factors = ConfidenceFactors {
        match_count: match_count_factor(candidates.len()),
        similarity_consistency,
        outcome_variance,
        data_completeness: completeness.fraction(),
    };

    let mut value = mean(&[
        factors.match_count,
        factors.similarity_consistency,
        factors.outcome_variance,
        factors.data_completeness,
    ]);
    if candidates.is_empty() {
        value = value.min(ZERO_MATCH_CEILING);
    }

    debug!(?factors, confidence = value, "estimated confidence");

    Confidence {
        value,
        margin_of_error: (1.0 - value) * 20.0,
        factors,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendEstimate {
    pub trend: Trend,
    pub velocity: f64,
}

impl TrendEstimate {
    pub const STABLE: TrendEstimate = TrendEstimate {
        trend: Trend::Stable,
        velocity: 0.0,
    };
}

/// `history` is newest first. Fewer than six points is reported as stable.
pub fn estimate_trend(history: &[f64]) -> Option<TrendEstimate> {
    if history.len() < TREND_POINTS {
        return None;
    }
    let recent = mean(&history[..TREND_WINDOW]);
    let previous = mean(&history[TREND_WINDOW..TREND_POINTS]);
    let velocity = (recent - previous) / TREND_WINDOW as f64;

    let trend = if velocity > TREND_THRESHOLD {
        Trend::Improving
    } else if velocity < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    };

    Some(TrendEstimate { trend, velocity })
}
