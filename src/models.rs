use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::components::{ComponentContributions, MajorWeights};
use crate::similarity::SimilarityStats;
use crate::trajectory::Adjustment;

pub const DEFAULT_MAJOR: &str = "default";

/// Profile as supplied by the caller. Every field is optional; `resolve` fills
/// the gaps with neutral defaults before any formula runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileInput {
    pub gpa: Option<f64>,
    pub attendance: Option<f64>,
    pub internal_marks: Option<f64>,
    pub backlogs: Option<u32>,
    pub study_hours_per_week: Option<f64>,
    pub practice_hours_per_day: Option<f64>,
    pub project_count: Option<u32>,
    pub deployed: Option<bool>,
    pub internship: Option<bool>,
    pub consistency: Option<u8>,
    pub problem_solving: Option<u8>,
    pub communication: Option<u8>,
    pub teamwork: Option<u8>,
    pub career_clarity: Option<u8>,
    pub languages: Vec<String>,
    pub major: Option<String>,
}

/// Fully populated profile. Built once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub gpa: f64,
    pub attendance: f64,
    pub internal_marks: f64,
    pub backlogs: u32,
    pub study_hours_per_week: f64,
    pub practice_hours_per_day: f64,
    pub project_count: u32,
    pub deployed: bool,
    pub internship: bool,
    pub consistency: u8,
    pub problem_solving: u8,
    pub communication: u8,
    pub teamwork: u8,
    pub career_clarity: u8,
    pub language_count: usize,
    pub major: String,
    /// How many of gpa, attendance, study hours and project count were supplied.
    pub core_fields_present: u8,
    pub defaulted: Vec<&'static str>,
}

impl Profile {
    pub fn study_hours_per_day(&self) -> f64 {
        self.study_hours_per_week / 7.0
    }
}

impl ProfileInput {
    pub fn resolve(&self) -> Profile {
        let mut defaulted = Vec::new();
        let mut core_fields_present = 0u8;

        let mut number = |name: &'static str, value: Option<f64>, fallback: f64, core: bool| {
            match value.filter(|v| v.is_finite()) {
                Some(v) => {
                    if core {
                        core_fields_present += 1;
                    }
                    v
                }
                None => {
                    defaulted.push(name);
                    fallback
                }
            }
        };

        let gpa = number("gpa", self.gpa, 5.0, true);
        let attendance = number("attendance", self.attendance, 75.0, true);
        let study_hours_per_week =
            number("study_hours_per_week", self.study_hours_per_week, 15.0, true);
        let project_count = number(
            "project_count",
            self.project_count.map(f64::from),
            0.0,
            true,
        ) as u32;
        let internal_marks = number("internal_marks", self.internal_marks, 75.0, false);
        let practice_hours_per_day =
            number("practice_hours_per_day", self.practice_hours_per_day, 0.0, false);

        let mut rating = |name: &'static str, value: Option<u8>| match value {
            Some(v) => v.clamp(1, 5),
            None => {
                defaulted.push(name);
                3
            }
        };

        let consistency = rating("consistency", self.consistency);
        let problem_solving = rating("problem_solving", self.problem_solving);
        let communication = rating("communication", self.communication);
        let teamwork = rating("teamwork", self.teamwork);
        let career_clarity = rating("career_clarity", self.career_clarity);

        let major = match self.major.as_deref().map(str::trim) {
            Some(major) if !major.is_empty() => major.to_string(),
            _ => {
                defaulted.push("major");
                DEFAULT_MAJOR.to_string()
            }
        };

        let language_count = self
            .languages
            .iter()
            .flat_map(|entry| entry.split(','))
            .filter(|lang| !lang.trim().is_empty())
            .count();

        if !defaulted.is_empty() {
            debug!(fields = ?defaulted, "filled missing profile fields with defaults");
        }

        Profile {
            gpa,
            attendance,
            internal_marks,
            backlogs: self.backlogs.unwrap_or(0),
            study_hours_per_week,
            practice_hours_per_day,
            project_count,
            deployed: self.deployed.unwrap_or(false),
            internship: self.internship.unwrap_or(false),
            consistency,
            problem_solving,
            communication,
            teamwork,
            career_clarity,
            language_count,
            major,
            core_fields_present,
            defaulted,
        }
    }
}

/// One day of device usage. Hours are per usage category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellbeingSample {
    pub recorded_on: NaiveDate,
    #[serde(default)]
    pub screen_time_hours: Option<f64>,
    #[serde(default)]
    pub educational_hours: Option<f64>,
    #[serde(default)]
    pub productivity_hours: Option<f64>,
    #[serde(default)]
    pub social_media_hours: Option<f64>,
    #[serde(default)]
    pub entertainment_hours: Option<f64>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
    /// Self-reported, 1 (focused) to 5 (constantly distracted).
    #[serde(default)]
    pub distraction_level: Option<u8>,
}

impl WellbeingSample {
    pub fn days_ago(&self, as_of: NaiveDate) -> f64 {
        (as_of - self.recorded_on).num_days().max(0) as f64
    }

    pub fn screen_time_or_default(&self) -> f64 {
        finite_or(self.screen_time_hours, 6.0)
    }

    pub fn sleep_or_default(&self) -> f64 {
        finite_or(self.sleep_hours, 7.0)
    }

    pub fn productive_hours(&self) -> f64 {
        finite_or(self.educational_hours, 0.0) + finite_or(self.productivity_hours, 0.0)
    }

    pub fn distracting_hours(&self) -> f64 {
        finite_or(self.social_media_hours, 0.0) + finite_or(self.entertainment_hours, 0.0)
    }
}

fn finite_or(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(fallback)
}

/// Skill as supplied by the caller, before assessments are combined and a
/// market weight is attached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillInput {
    pub name: String,
    pub proficiency: Option<f64>,
    pub quiz_score: Option<f64>,
    pub voice_score: Option<f64>,
    pub market_weight: Option<f64>,
}

impl SkillInput {
    /// Explicit proficiency wins; otherwise quiz and voice assessments are
    /// blended 60/40, and a lone assessment passes through unchanged.
    pub fn resolved_proficiency(&self) -> f64 {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        let value = match (
            finite(self.proficiency),
            finite(self.quiz_score),
            finite(self.voice_score),
        ) {
            (Some(p), _, _) => p,
            (None, Some(quiz), Some(voice)) => quiz * 0.60 + voice * 0.40,
            (None, Some(quiz), None) => quiz,
            (None, None, Some(voice)) => voice,
            (None, None, None) => 50.0,
        };
        value.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub name: String,
    /// 0 to 100.
    pub proficiency: f64,
    /// One of 0.5, 1.0 or 2.0.
    pub market_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub subject_id: Uuid,
    /// Reference date for wellbeing recency.
    pub as_of: NaiveDate,
    pub profile: ProfileInput,
    #[serde(default)]
    pub wellbeing: Vec<WellbeingSample>,
    #[serde(default)]
    pub skills: Vec<SkillInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementStatus {
    Placed,
    #[serde(rename = "Not Placed", alias = "NotPlaced")]
    NotPlaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Tier1,
    Tier2,
    Tier3,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Tier::Tier1 => "Tier1",
            Tier::Tier2 => "Tier2",
            Tier::Tier3 => "Tier3",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCategory {
    pub placement: PlacementStatus,
    pub tier: Option<Tier>,
}

/// A historical graduate returned by the similarity index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlumniCandidate {
    pub id: Uuid,
    pub major: String,
    pub graduation_year: i32,
    pub vector: Vec<f64>,
    /// Assigned at query time.
    pub similarity: f64,
    pub outcome: OutcomeCategory,
    /// Precomputed outcome score; a positive value bypasses tier mapping.
    pub outcome_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        };
        f.write_str(label)
    }
}

/// Degraded paths taken while scoring. Callers use these to tell a full
/// prediction from a fallback one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    IndexUnavailable,
    IndexTimeout,
    NoCandidates,
    ZeroSimilaritySum,
    VectorRepaired,
    HistoryUnavailable,
    InsufficientHistory,
    ProfileDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub id: Uuid,
    pub major: String,
    pub graduation_year: i32,
    pub similarity: f64,
    pub outcome_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub subject_id: Uuid,
    pub score: f64,
    pub academic_score: f64,
    pub behavioral_score: f64,
    pub skill_score: f64,
    pub weights: MajorWeights,
    pub contributions: ComponentContributions,
    pub confidence: f64,
    pub margin_of_error: f64,
    pub trend: Trend,
    pub velocity: f64,
    pub predicted_tier: Tier,
    pub match_count: usize,
    pub interpretation: &'static str,
    pub adjustments: Vec<Adjustment>,
    pub matches: Vec<MatchSummary>,
    pub similarity_stats: SimilarityStats,
    pub fallbacks: Vec<Fallback>,
}

impl ScoreResult {
    /// True when any fallback beyond missing trend history was taken.
    pub fn is_degraded(&self) -> bool {
        self.fallbacks
            .iter()
            .any(|f| *f != Fallback::InsufficientHistory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_resolves_to_defaults() {
        let profile = ProfileInput::default().resolve();
        assert_eq!(profile.gpa, 5.0);
        assert_eq!(profile.attendance, 75.0);
        assert_eq!(profile.internal_marks, 75.0);
        assert_eq!(profile.study_hours_per_week, 15.0);
        assert_eq!(profile.project_count, 0);
        assert_eq!(profile.consistency, 3);
        assert_eq!(profile.major, DEFAULT_MAJOR);
        assert_eq!(profile.core_fields_present, 0);
        assert!(profile.defaulted.contains(&"gpa"));
    }

    #[test]
    fn non_finite_values_count_as_missing() {
        let input = ProfileInput {
            gpa: Some(f64::NAN),
            attendance: Some(90.0),
            ..Default::default()
        };
        let profile = input.resolve();
        assert_eq!(profile.gpa, 5.0);
        assert_eq!(profile.attendance, 90.0);
        assert_eq!(profile.core_fields_present, 1);
    }

    #[test]
    fn ratings_are_clamped() {
        let input = ProfileInput {
            consistency: Some(9),
            teamwork: Some(0),
            ..Default::default()
        };
        let profile = input.resolve();
        assert_eq!(profile.consistency, 5);
        assert_eq!(profile.teamwork, 1);
    }

    #[test]
    fn languages_accept_comma_lists() {
        let input = ProfileInput {
            languages: vec!["Python, Java".to_string(), "Rust".to_string(), " ".to_string()],
            ..Default::default()
        };
        assert_eq!(input.resolve().language_count, 3);
    }

    #[test]
    fn quiz_only_skill_passes_through() {
        let skill = SkillInput {
            name: "python".to_string(),
            quiz_score: Some(90.0),
            ..Default::default()
        };
        assert_eq!(skill.resolved_proficiency(), 90.0);
    }

    #[test]
    fn quiz_and_voice_are_blended() {
        let skill = SkillInput {
            name: "python".to_string(),
            quiz_score: Some(80.0),
            voice_score: Some(60.0),
            ..Default::default()
        };
        assert!((skill.resolved_proficiency() - 72.0).abs() < 1e-9);
    }

    #[test]
    fn days_ago_is_floored_at_zero() {
        let sample = WellbeingSample {
            recorded_on: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            screen_time_hours: None,
            educational_hours: None,
            productivity_hours: None,
            social_media_hours: None,
            entertainment_hours: None,
            sleep_hours: None,
            distraction_level: None,
        };
        let before = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let after = NaiveDate::from_ymd_opt(2026, 3, 13).unwrap();
        assert_eq!(sample.days_ago(before), 0.0);
        assert_eq!(sample.days_ago(after), 3.0);
        assert_eq!(sample.screen_time_or_default(), 6.0);
        assert_eq!(sample.sleep_or_default(), 7.0);
    }

    #[test]
    fn placement_status_reads_spaced_label() {
        let status: PlacementStatus = serde_json::from_str("\"Not Placed\"").unwrap();
        assert_eq!(status, PlacementStatus::NotPlaced);
    }
}
