//! Similarity-weighted aggregation of alumni outcomes into a trajectory score.

use serde::Serialize;
use tracing::{info, warn};

use crate::components::{ComponentScores, MajorWeights};
use crate::models::{AlumniCandidate, Fallback, ScoreResult, Tier, WellbeingSample};
use crate::outcome::candidate_outcome;
use crate::similarity::bounded_similarity;

pub const ZERO_SIMILARITY_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    /// Strong academics on too little sleep.
    BurnoutPenalty,
    /// Heavy screen time dominated by social media and entertainment.
    DistractionPenalty,
    GritBonus,
    /// Every component above 70.
    BalanceBonus,
}

impl Adjustment {
    pub fn points(self) -> f64 {
        match self {
            Adjustment::BurnoutPenalty | Adjustment::DistractionPenalty => -5.0,
            Adjustment::GritBonus | Adjustment::BalanceBonus => 5.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Adjustment::BurnoutPenalty => "burnout penalty",
            Adjustment::DistractionPenalty => "distraction penalty",
            Adjustment::GritBonus => "grit bonus",
            Adjustment::BalanceBonus => "balance bonus",
        }
    }
}

/// `display` holds the 0-100 sub-scores; `latest` is the newest wellbeing sample.
pub fn interaction_adjustments(
    display: &ComponentScores,
    latest: Option<&WellbeingSample>,
) -> Vec<Adjustment> {
    let mut applied = Vec::new();

    if let Some(sample) = latest {
        if display.academic > 80.0 && sample.sleep_or_default() < 6.0 {
            applied.push(Adjustment::BurnoutPenalty);
        }
        if sample.screen_time_or_default() > 8.0
            && sample.distracting_hours() > sample.productive_hours()
        {
            applied.push(Adjustment::DistractionPenalty);
        }
    }
    if display.behavioral > 75.0 {
        applied.push(Adjustment::GritBonus);
    }
    if display.academic > 70.0 && display.behavioral > 70.0 && display.skill > 70.0 {
        applied.push(Adjustment::BalanceBonus);
    }

    for adjustment in &applied {
        info!(adjustment = adjustment.label(), points = adjustment.points(), "applied interaction adjustment");
    }
    applied
}

/// Σ(similarity · outcome) / Σ(similarity), or `None` when the similarities sum to zero.
/// Similarities are bounded to [0, 1] first; a non-finite one weighs nothing.
pub fn weighted_outcome(candidates: &[AlumniCandidate]) -> Option<f64> {
    let (weighted_sum, similarity_sum) = candidates.iter().fold((0.0, 0.0), |(ws, ss), c| {
        let similarity = bounded_similarity(c.similarity);
        (ws + similarity * candidate_outcome(c), ss + similarity)
    });

    if similarity_sum <= 0.0 {
        return None;
    }
    Some(weighted_sum / similarity_sum)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub score: f64,
    pub adjustments: Vec<Adjustment>,
    pub fallbacks: Vec<Fallback>,
}

pub fn aggregate(
    scores: &ComponentScores,
    weights: &MajorWeights,
    candidates: &[AlumniCandidate],
    latest: Option<&WellbeingSample>,
) -> Aggregate {
    if candidates.is_empty() {
        warn!("no similar alumni, scoring from components only");
        return Aggregate {
            score: scores.weighted(weights).clamp(0.0, 100.0),
            adjustments: Vec::new(),
            fallbacks: vec![Fallback::NoCandidates],
        };
    }

    let mut fallbacks = Vec::new();
    let base = weighted_outcome(candidates).unwrap_or_else(|| {
        warn!(
            candidates = candidates.len(),
            "similarity sum is zero, using fallback score"
        );
        fallbacks.push(Fallback::ZeroSimilaritySum);
        ZERO_SIMILARITY_SCORE
    });

    let adjustments = interaction_adjustments(&scores.display(), latest);
    let adjusted = base + adjustments.iter().map(|a| a.points()).sum::<f64>();

    Aggregate {
        score: adjusted.clamp(0.0, 100.0),
        adjustments,
        fallbacks,
    }
}

pub fn predict_tier(score: f64) -> Tier {
    if score >= 71.0 {
        Tier::Tier1
    } else if score >= 41.0 {
        Tier::Tier2
    } else {
        Tier::Tier3
    }
}

pub fn interpret(score: f64) -> &'static str {
    if score >= 71.0 {
        "High employability: strong placement likelihood with top-tier employers"
    } else if score >= 41.0 {
        "Moderate employability: average placement likelihood with mid-tier employers"
    } else {
        "Low employability: at risk, needs improvement in academics, habits or skills"
    }
}

pub fn validate_result(result: &ScoreResult) -> bool {
    if !result.score.is_finite() {
        warn!(score = result.score, "trajectory score is not finite");
        return false;
    }
    if !(0.0..=100.0).contains(&result.score) {
        warn!(score = result.score, "trajectory score out of range");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::weights_for_major;
    use crate::models::{OutcomeCategory, PlacementStatus};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn candidate(similarity: f64, outcome_score: f64) -> AlumniCandidate {
        AlumniCandidate {
            id: Uuid::new_v4(),
            major: "Computer Science".to_string(),
            graduation_year: 2024,
            vector: Vec::new(),
            similarity,
            outcome: OutcomeCategory {
                placement: PlacementStatus::Placed,
                tier: None,
            },
            outcome_score: Some(outcome_score),
        }
    }

    fn scores(academic: f64, behavioral: f64, skill: f64) -> ComponentScores {
        ComponentScores {
            academic,
            behavioral,
            skill,
        }
    }

    fn sample(screen: f64, sleep: f64, productive: f64, distracting: f64) -> WellbeingSample {
        WellbeingSample {
            recorded_on: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            screen_time_hours: Some(screen),
            educational_hours: Some(productive),
            productivity_hours: None,
            social_media_hours: Some(distracting),
            entertainment_hours: None,
            sleep_hours: Some(sleep),
            distraction_level: None,
        }
    }

    #[test]
    fn weighted_outcome_uses_similarity_weights() {
        let candidates = vec![candidate(0.9, 95.0), candidate(0.3, 20.0)];
        let expected = (0.9 * 95.0 + 0.3 * 20.0) / 1.2;
        assert!((weighted_outcome(&candidates).unwrap() - expected).abs() < 1e-9);
        assert_eq!(weighted_outcome(&[candidate(0.0, 90.0)]), None);
    }

    #[test]
    fn unusable_similarities_carry_no_weight() {
        let candidates = vec![
            candidate(f64::NAN, 95.0),
            candidate(0.5, 60.0),
            candidate(f64::INFINITY, 20.0),
        ];
        assert_eq!(weighted_outcome(&candidates), Some(60.0));
        assert_eq!(weighted_outcome(&[candidate(f64::NAN, 95.0)]), None);

        let over = vec![candidate(3.0, 95.0), candidate(1.0, 20.0)];
        assert!((weighted_outcome(&over).unwrap() - 57.5).abs() < 1e-9);
    }

    #[test]
    fn no_candidates_uses_weighted_components() {
        let s = scores(0.6, 0.5, 0.4);
        let weights = weights_for_major("Civil Engineering");
        let result = aggregate(&s, &weights, &[], Some(&sample(10.0, 4.0, 0.0, 6.0)));
        assert!((result.score - (0.6 * 0.40 + 0.5 * 0.35 + 0.4 * 0.25) * 100.0).abs() < 1e-9);
        assert!(result.adjustments.is_empty());
        assert_eq!(result.fallbacks, vec![Fallback::NoCandidates]);
    }

    #[test]
    fn zero_similarity_falls_back_to_fifty() {
        let result = aggregate(
            &scores(0.5, 0.5, 0.5),
            &weights_for_major("default"),
            &[candidate(0.0, 95.0)],
            None,
        );
        assert_eq!(result.score, ZERO_SIMILARITY_SCORE);
        assert_eq!(result.fallbacks, vec![Fallback::ZeroSimilaritySum]);
    }

    #[test]
    fn burnout_and_distraction_penalties() {
        let display = scores(85.0, 50.0, 50.0);
        let applied = interaction_adjustments(&display, Some(&sample(9.0, 5.0, 1.0, 4.0)));
        assert_eq!(
            applied,
            vec![Adjustment::BurnoutPenalty, Adjustment::DistractionPenalty]
        );
    }

    #[test]
    fn penalties_need_wellbeing() {
        let display = scores(85.0, 50.0, 50.0);
        assert!(interaction_adjustments(&display, None).is_empty());
    }

    #[test]
    fn grit_and_balance_bonuses() {
        let display = scores(75.0, 80.0, 72.0);
        let applied = interaction_adjustments(&display, None);
        assert_eq!(applied, vec![Adjustment::GritBonus, Adjustment::BalanceBonus]);
    }

    #[test]
    fn adjusted_score_is_clamped() {
        let result = aggregate(
            &scores(0.9, 0.9, 0.9),
            &weights_for_major("default"),
            &[candidate(0.95, 98.0)],
            None,
        );
        assert_eq!(result.score, 100.0);

        let result = aggregate(
            &scores(0.85, 0.2, 0.2),
            &weights_for_major("default"),
            &[candidate(0.95, 3.0)],
            Some(&sample(10.0, 4.0, 0.0, 6.0)),
        );
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(predict_tier(71.0), Tier::Tier1);
        assert_eq!(predict_tier(70.9), Tier::Tier2);
        assert_eq!(predict_tier(41.0), Tier::Tier2);
        assert_eq!(predict_tier(40.9), Tier::Tier3);
        assert!(interpret(90.0).starts_with("High"));
        assert!(interpret(50.0).starts_with("Moderate"));
        assert!(interpret(10.0).starts_with("Low"));
    }
}
