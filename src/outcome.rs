use crate::models::{AlumniCandidate, OutcomeCategory, PlacementStatus, Tier};

pub const NOT_PLACED_SCORE: f64 = 20.0;
pub const TIER1_SCORE: f64 = 95.0;
pub const TIER2_SCORE: f64 = 72.5;
pub const TIER3_SCORE: f64 = 57.5;
pub const UNKNOWN_TIER_SCORE: f64 = 70.0;

/// Midpoint of each tier's outcome band.
pub fn category_score(category: &OutcomeCategory) -> f64 {
    match (category.placement, category.tier) {
        (PlacementStatus::NotPlaced, _) => NOT_PLACED_SCORE,
        (PlacementStatus::Placed, Some(Tier::Tier1)) => TIER1_SCORE,
        (PlacementStatus::Placed, Some(Tier::Tier2)) => TIER2_SCORE,
        (PlacementStatus::Placed, Some(Tier::Tier3)) => TIER3_SCORE,
        (PlacementStatus::Placed, None) => UNKNOWN_TIER_SCORE,
    }
}

/// A positive precomputed score is taken as authoritative and skips the
/// category mapping.
pub fn outcome_score(category: &OutcomeCategory, precomputed: Option<f64>) -> f64 {
    match precomputed {
        Some(score) if score.is_finite() && score > 0.0 => score.min(100.0),
        _ => category_score(category),
    }
}

pub fn candidate_outcome(candidate: &AlumniCandidate) -> f64 {
    outcome_score(&candidate.outcome, candidate.outcome_score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(placement: PlacementStatus, tier: Option<Tier>) -> OutcomeCategory {
        OutcomeCategory { placement, tier }
    }

    #[test]
    fn not_placed_maps_to_twenty() {
        assert_eq!(category_score(&category(PlacementStatus::NotPlaced, None)), 20.0);
        assert_eq!(
            category_score(&category(PlacementStatus::NotPlaced, Some(Tier::Tier1))),
            20.0
        );
    }

    #[test]
    fn placed_tiers_map_to_band_midpoints() {
        let placed = |tier| category_score(&category(PlacementStatus::Placed, tier));
        assert_eq!(placed(Some(Tier::Tier1)), 95.0);
        assert_eq!(placed(Some(Tier::Tier2)), 72.5);
        assert_eq!(placed(Some(Tier::Tier3)), 57.5);
        assert_eq!(placed(None), 70.0);
    }

    #[test]
    fn positive_precomputed_score_passes_through() {
        let not_placed = category(PlacementStatus::NotPlaced, None);
        assert_eq!(outcome_score(&not_placed, Some(88.0)), 88.0);
        assert_eq!(outcome_score(&not_placed, Some(0.0)), 20.0);
        assert_eq!(outcome_score(&not_placed, Some(-4.0)), 20.0);
        assert_eq!(outcome_score(&not_placed, Some(f64::NAN)), 20.0);
        assert_eq!(outcome_score(&not_placed, None), 20.0);
    }
}
