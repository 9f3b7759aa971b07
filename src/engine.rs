//! Scoring pipeline: profile → vector → similar alumni → aggregate → confidence
//! and trend.
//!
//! Collaborators are injected at construction. A failing or slow similarity
//! index degrades the prediction to the component-only path instead of
//! failing it, and every such path is recorded in `ScoreResult::fallbacks`.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::collaborators::{
    snap_market_weight, DefaultSkillDemand, NoHistory, ScoreHistoryStore, SkillDemandProvider,
    VectorIndex,
};
use crate::components::{self, contributions, weights_for_major};
use crate::confidence::{estimate_confidence, estimate_trend, DataCompleteness, TrendEstimate};
use crate::config::EngineConfig;
use crate::error::{EngineError, IndexError};
use crate::models::{
    AlumniCandidate, Fallback, MatchSummary, Profile, ScoreResult, ScoringRequest, SkillRecord,
    WellbeingSample, DEFAULT_MAJOR,
};
use crate::outcome::candidate_outcome;
use crate::similarity::{bounded_similarity, rank_candidates, similarity_stats};
use crate::trajectory::{self, interpret, predict_tier, validate_result};
use crate::vector::{FeatureVector, VectorBuilder};
use uuid::Uuid;

/// A request after the fill-missing pass, ready for scoring.
#[derive(Debug, Clone)]
pub struct PreparedSubject {
    pub subject_id: Uuid,
    pub profile: Profile,
    /// Newest first.
    pub wellbeing: Vec<WellbeingSample>,
    pub skills: Vec<SkillRecord>,
    pub vector: FeatureVector,
}

impl PreparedSubject {
    pub fn latest_wellbeing(&self) -> Option<&WellbeingSample> {
        self.wellbeing.first()
    }

    fn completeness(&self) -> DataCompleteness {
        DataCompleteness {
            core_fields_present: self.profile.core_fields_present,
            has_wellbeing: !self.wellbeing.is_empty(),
            has_skills: !self.skills.is_empty(),
        }
    }
}

pub struct TrajectoryEngine<I, H = NoHistory, D = DefaultSkillDemand> {
    index: I,
    history: H,
    demand: D,
    config: EngineConfig,
    builder: VectorBuilder,
}

impl<I: VectorIndex> TrajectoryEngine<I> {
    pub fn new(index: I, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            index,
            history: NoHistory,
            demand: DefaultSkillDemand,
            builder: VectorBuilder::new(config.decay_rate),
            config,
        })
    }
}

impl<I, H, D> TrajectoryEngine<I, H, D> {
    pub fn with_history<H2: ScoreHistoryStore>(self, history: H2) -> TrajectoryEngine<I, H2, D> {
        TrajectoryEngine {
            index: self.index,
            history,
            demand: self.demand,
            config: self.config,
            builder: self.builder,
        }
    }

    pub fn with_skill_demand<D2: SkillDemandProvider>(
        self,
        demand: D2,
    ) -> TrajectoryEngine<I, H, D2> {
        TrajectoryEngine {
            index: self.index,
            history: self.history,
            demand,
            config: self.config,
            builder: self.builder,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl<I, H, D> TrajectoryEngine<I, H, D>
where
    I: VectorIndex,
    H: ScoreHistoryStore,
    D: SkillDemandProvider,
{
    /// Fill missing values, order wellbeing newest first, attach market
    /// weights and build the feature vector.
    pub fn prepare(&self, request: &ScoringRequest) -> PreparedSubject {
        let profile = request.profile.resolve();

        let mut wellbeing = request.wellbeing.clone();
        wellbeing.sort_by(|a, b| b.recorded_on.cmp(&a.recorded_on));

        let skills: Vec<SkillRecord> = request
            .skills
            .iter()
            .map(|skill| {
                let name = skill.name.trim().to_string();
                let market_weight = snap_market_weight(
                    skill
                        .market_weight
                        .unwrap_or_else(|| self.demand.weight(&name)),
                );
                SkillRecord {
                    proficiency: skill.resolved_proficiency(),
                    market_weight,
                    name,
                }
            })
            .collect();

        let vector = self
            .builder
            .build(&profile, &wellbeing, &skills, request.as_of);

        PreparedSubject {
            subject_id: request.subject_id,
            profile,
            wellbeing,
            skills,
            vector,
        }
    }

    pub async fn predict(&self, request: &ScoringRequest) -> ScoreResult {
        let subject = self.prepare(request);
        let mut fallbacks = Vec::new();
        if subject.profile.core_fields_present < 4 {
            fallbacks.push(Fallback::ProfileDefaults);
        }

        let filter = self
            .config
            .filter_by_major
            .then_some(subject.profile.major.as_str())
            .filter(|major| *major != DEFAULT_MAJOR);

        let candidates = match self.query_index(&subject.vector, filter).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(subject = %subject.subject_id, error = %err, "similarity index failed, degrading to component score");
                fallbacks.push(match err {
                    IndexError::Timeout(_) => Fallback::IndexTimeout,
                    IndexError::Unavailable(_) => Fallback::IndexUnavailable,
                });
                Vec::new()
            }
        };

        let (candidates, repaired) = self.sanitize_candidates(candidates);
        if repaired {
            fallbacks.push(Fallback::VectorRepaired);
        }

        let history = match self
            .history
            .recent(subject.subject_id, self.config.history_limit)
        {
            Ok(scores) => scores.into_iter().filter(|s| s.is_finite()).collect(),
            Err(err) => {
                warn!(subject = %subject.subject_id, error = %err, "score history unavailable, reporting stable trend");
                fallbacks.push(Fallback::HistoryUnavailable);
                Vec::new()
            }
        };

        self.score(&subject, &candidates, &history, fallbacks)
    }

    async fn query_index(
        &self,
        vector: &FeatureVector,
        filter: Option<&str>,
    ) -> Result<Vec<AlumniCandidate>, IndexError> {
        let timeout = self.config.index_timeout;
        match tokio::time::timeout(timeout, self.index.query(vector, filter, self.config.top_k))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(IndexError::Timeout(timeout)),
        }
    }

    /// Repair malformed candidate vectors, bound similarities to [0, 1] and
    /// re-rank, keeping at most `top_k`.
    fn sanitize_candidates(
        &self,
        candidates: Vec<AlumniCandidate>,
    ) -> (Vec<AlumniCandidate>, bool) {
        let mut any_repaired = false;
        let mut cleaned: Vec<AlumniCandidate> = candidates
            .into_iter()
            .map(|mut candidate| {
                let (vector, repaired) = FeatureVector::from_raw(&candidate.vector);
                if repaired {
                    debug!(alumni = %candidate.id, "repaired candidate vector");
                    any_repaired = true;
                    candidate.vector = vector.into();
                }
                candidate.similarity = bounded_similarity(candidate.similarity);
                candidate
            })
            .collect();

        if any_repaired {
            warn!("similarity index returned malformed vectors, repaired with neutral values");
        }

        rank_candidates(&mut cleaned);
        cleaned.truncate(self.config.top_k);
        (cleaned, any_repaired)
    }

    /// Pure scoring over already-retrieved candidates and history. Candidate
    /// similarities are bounded to [0, 1] here as well, so callers that skip
    /// `predict` still get a finite, in-range score.
    pub fn score(
        &self,
        subject: &PreparedSubject,
        candidates: &[AlumniCandidate],
        history: &[f64],
        mut fallbacks: Vec<Fallback>,
    ) -> ScoreResult {
        let candidates: Vec<AlumniCandidate> = candidates
            .iter()
            .map(|candidate| AlumniCandidate {
                similarity: bounded_similarity(candidate.similarity),
                ..candidate.clone()
            })
            .collect();
        let candidates = candidates.as_slice();
        let latest = subject.latest_wellbeing();
        let scores = components::score_components(&subject.profile, latest, &subject.skills);
        let weights = weights_for_major(&subject.profile.major);

        let aggregate = trajectory::aggregate(&scores, &weights, candidates, latest);
        fallbacks.extend(aggregate.fallbacks.iter().copied());

        let confidence = estimate_confidence(candidates, subject.completeness());

        let trend = estimate_trend(history).unwrap_or_else(|| {
            debug!(points = history.len(), "not enough history for a trend");
            if !fallbacks.contains(&Fallback::HistoryUnavailable) {
                fallbacks.push(Fallback::InsufficientHistory);
            }
            TrendEstimate::STABLE
        });

        let mut unique = Vec::with_capacity(fallbacks.len());
        for fallback in fallbacks {
            if !unique.contains(&fallback) {
                unique.push(fallback);
            }
        }

        let display = scores.display();
        let result = ScoreResult {
            subject_id: subject.subject_id,
            score: aggregate.score,
            academic_score: display.academic,
            behavioral_score: display.behavioral,
            skill_score: display.skill,
            weights,
            contributions: contributions(&scores, &weights),
            confidence: confidence.value,
            margin_of_error: confidence.margin_of_error,
            trend: trend.trend,
            velocity: trend.velocity,
            predicted_tier: predict_tier(aggregate.score),
            match_count: candidates.len(),
            interpretation: interpret(aggregate.score),
            adjustments: aggregate.adjustments,
            matches: candidates
                .iter()
                .map(|c| MatchSummary {
                    id: c.id,
                    major: c.major.clone(),
                    graduation_year: c.graduation_year,
                    similarity: c.similarity,
                    outcome_score: candidate_outcome(c),
                })
                .collect(),
            similarity_stats: similarity_stats(candidates),
            fallbacks: unique,
        };

        if !validate_result(&result) {
            warn!(subject = %result.subject_id, "trajectory result failed validation");
        }

        info!(
            subject = %result.subject_id,
            score = result.score,
            tier = %result.predicted_tier,
            matches = result.match_count,
            confidence = result.confidence,
            trend = %result.trend,
            degraded = result.is_degraded(),
            "scored subject"
        );

        result
    }
}

impl<I, H, D> TrajectoryEngine<I, H, D>
where
    I: VectorIndex + 'static,
    H: ScoreHistoryStore + 'static,
    D: SkillDemandProvider + 'static,
{
    /// Score independent subjects concurrently. Results keep input order.
    pub async fn predict_batch(
        self: Arc<Self>,
        requests: Vec<ScoringRequest>,
    ) -> Result<Vec<ScoreResult>, EngineError> {
        let total = requests.len();
        let mut tasks = JoinSet::new();
        for (position, request) in requests.into_iter().enumerate() {
            let engine = Arc::clone(&self);
            tasks.spawn(async move { (position, engine.predict(&request).await) });
        }

        let mut slots: Vec<Option<ScoreResult>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            let (position, result) =
                joined.map_err(|err| EngineError::Task(err.to_string()))?;
            slots[position] = Some(result);
        }

        info!(subjects = total, "scored batch");
        Ok(slots.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::InMemoryIndex;
    use crate::models::{ProfileInput, SkillInput};
    use chrono::NaiveDate;

    fn request(skills: Vec<SkillInput>) -> ScoringRequest {
        ScoringRequest {
            subject_id: Uuid::new_v4(),
            as_of: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            profile: ProfileInput {
                gpa: Some(8.0),
                attendance: Some(90.0),
                study_hours_per_week: Some(20.0),
                project_count: Some(4),
                major: Some("Computer Science".to_string()),
                ..Default::default()
            },
            wellbeing: vec![
                WellbeingSample {
                    recorded_on: NaiveDate::from_ymd_opt(2026, 5, 30).unwrap(),
                    screen_time_hours: Some(5.0),
                    educational_hours: None,
                    productivity_hours: None,
                    social_media_hours: None,
                    entertainment_hours: None,
                    sleep_hours: Some(7.0),
                    distraction_level: None,
                },
                WellbeingSample {
                    recorded_on: NaiveDate::from_ymd_opt(2026, 5, 31).unwrap(),
                    screen_time_hours: Some(3.0),
                    educational_hours: None,
                    productivity_hours: None,
                    social_media_hours: None,
                    entertainment_hours: None,
                    sleep_hours: Some(8.0),
                    distraction_level: None,
                },
            ],
            skills,
        }
    }

    fn engine() -> TrajectoryEngine<InMemoryIndex> {
        TrajectoryEngine::new(InMemoryIndex::default(), EngineConfig::default()).unwrap()
    }

    #[test]
    fn rejects_zero_top_k() {
        let config = EngineConfig {
            top_k: 0,
            ..Default::default()
        };
        assert!(matches!(
            TrajectoryEngine::new(InMemoryIndex::default(), config),
            Err(EngineError::InvalidTopK)
        ));
    }

    #[test]
    fn prepare_orders_wellbeing_newest_first() {
        let subject = engine().prepare(&request(Vec::new()));
        assert_eq!(
            subject.latest_wellbeing().map(|s| s.recorded_on),
            NaiveDate::from_ymd_opt(2026, 5, 31)
        );
    }

    #[test]
    fn prepare_attaches_market_weights() {
        let skills = vec![
            SkillInput {
                name: " Python ".to_string(),
                quiz_score: Some(90.0),
                ..Default::default()
            },
            SkillInput {
                name: "perl".to_string(),
                proficiency: Some(60.0),
                market_weight: Some(1.5),
                ..Default::default()
            },
        ];
        let subject = engine().prepare(&request(skills));
        assert_eq!(subject.skills[0].name, "Python");
        assert_eq!(subject.skills[0].market_weight, 2.0);
        assert_eq!(subject.skills[0].proficiency, 90.0);
        assert_eq!(subject.skills[1].market_weight, 1.0);
    }

    #[test]
    fn score_bounds_raw_candidate_similarities() {
        use crate::models::{OutcomeCategory, PlacementStatus, Tier};

        let engine = engine();
        let subject = engine.prepare(&request(Vec::new()));
        let raw = |similarity: f64, tier: Tier| AlumniCandidate {
            id: Uuid::new_v4(),
            major: "Computer Science".to_string(),
            graduation_year: 2024,
            vector: vec![0.5; crate::vector::DIMENSIONS],
            similarity,
            outcome: OutcomeCategory {
                placement: PlacementStatus::Placed,
                tier: Some(tier),
            },
            outcome_score: None,
        };

        let result = engine.score(&subject, &[raw(f64::NAN, Tier::Tier1)], &[], Vec::new());
        assert!(result.score.is_finite());
        assert!((0.0..=100.0).contains(&result.score));
        assert!(result.fallbacks.contains(&Fallback::ZeroSimilaritySum));
        assert_eq!(result.matches[0].similarity, 0.0);
        assert!(validate_result(&result));

        let result = engine.score(
            &subject,
            &[raw(f64::NAN, Tier::Tier1), raw(0.8, Tier::Tier3)],
            &[],
            Vec::new(),
        );
        let adjustment: f64 = result.adjustments.iter().map(|a| a.points()).sum();
        assert!((result.score - (57.5 + adjustment).clamp(0.0, 100.0)).abs() < 1e-9);
        assert!(result.similarity_stats.max <= 1.0);
    }

    #[tokio::test]
    async fn empty_index_degrades_to_component_score() {
        let engine = engine();
        let req = request(Vec::new());
        let result = engine.predict(&req).await;
        let subject = engine.prepare(&req);
        let scores = components::score_components(
            &subject.profile,
            subject.latest_wellbeing(),
            &subject.skills,
        );
        let expected = scores.weighted(&weights_for_major("Computer Science"));

        assert!((result.score - expected).abs() < 1e-9);
        assert_eq!(result.match_count, 0);
        assert!(result.confidence < 0.5);
        assert!(result.fallbacks.contains(&Fallback::NoCandidates));
        assert!(result.is_degraded());
    }
}
