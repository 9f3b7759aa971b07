//! Academic, behavioral and skill sub-scores plus the per-major weight table.
//!
//! Sub-scores are computed in [0, 1] and scaled by 100 for display.

use serde::Serialize;
use tracing::debug;

use crate::models::{Profile, SkillRecord, WellbeingSample};
use crate::normalize::{self, clamp_unit, NEUTRAL};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MajorWeights {
    pub academic: f64,
    pub behavioral: f64,
    pub skill: f64,
}

impl MajorWeights {
    pub const fn new(academic: f64, behavioral: f64, skill: f64) -> Self {
        Self {
            academic,
            behavioral,
            skill,
        }
    }

    pub fn sum(&self) -> f64 {
        self.academic + self.behavioral + self.skill
    }
}

pub const DEFAULT_WEIGHTS: MajorWeights = MajorWeights::new(0.30, 0.40, 0.30);

pub const MAJOR_WEIGHTS: &[(&str, MajorWeights)] = &[
    ("Computer Science", MajorWeights::new(0.25, 0.35, 0.40)),
    ("Mechanical Engineering", MajorWeights::new(0.40, 0.30, 0.30)),
    ("Business Administration", MajorWeights::new(0.20, 0.50, 0.30)),
    ("Electrical Engineering", MajorWeights::new(0.35, 0.30, 0.35)),
    ("Civil Engineering", MajorWeights::new(0.40, 0.35, 0.25)),
];

/// Unrecognized majors fall back to `DEFAULT_WEIGHTS`.
pub fn weights_for_major(major: &str) -> MajorWeights {
    MAJOR_WEIGHTS
        .iter()
        .find(|(name, _)| *name == major)
        .map(|(_, weights)| *weights)
        .unwrap_or(DEFAULT_WEIGHTS)
}

/// Sub-scores in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentScores {
    pub academic: f64,
    pub behavioral: f64,
    pub skill: f64,
}

impl ComponentScores {
    pub fn display(&self) -> ComponentScores {
        ComponentScores {
            academic: self.academic * 100.0,
            behavioral: self.behavioral * 100.0,
            skill: self.skill * 100.0,
        }
    }

    /// Weighted blend on the 0-100 scale.
    pub fn weighted(&self, weights: &MajorWeights) -> f64 {
        (self.academic * weights.academic
            + self.behavioral * weights.behavioral
            + self.skill * weights.skill)
            * 100.0
    }
}

/// How much each display sub-score adds to the weighted blend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentContributions {
    pub academic: f64,
    pub behavioral: f64,
    pub skill: f64,
}

pub fn contributions(scores: &ComponentScores, weights: &MajorWeights) -> ComponentContributions {
    let display = scores.display();
    ComponentContributions {
        academic: display.academic * weights.academic,
        behavioral: display.behavioral * weights.behavioral,
        skill: display.skill * weights.skill,
    }
}

fn rating_unit(rating: u8) -> f64 {
    (f64::from(rating) - 1.0) / 4.0
}

fn projects_unit(projects: u32) -> f64 {
    (f64::from(projects) / 10.0).min(1.0)
}

fn study_unit(hours_per_day: f64) -> f64 {
    (hours_per_day / 8.0).min(1.0)
}

pub fn academic_score(profile: &Profile) -> f64 {
    let gpa = normalize::sigmoid(profile.gpa / 10.0, 0.7, 8.0);
    let attendance = normalize::standard(profile.attendance, 0.0, 100.0);
    let internal = normalize::standard(profile.internal_marks, 0.0, 100.0);
    let backlogs = 1.0 - normalize::standard(f64::from(profile.backlogs), 0.0, 5.0);

    clamp_unit(0.50 * gpa + 0.25 * attendance + 0.15 * internal + 0.10 * backlogs)
}

pub fn grit(consistency: u8, problem_solving: u8, projects: u32, study_hours_per_day: f64) -> f64 {
    clamp_unit(
        0.30 * (f64::from(consistency) / 5.0)
            + 0.30 * (f64::from(problem_solving) / 5.0)
            + 0.20 * projects_unit(projects)
            + 0.20 * study_unit(study_hours_per_day),
    )
}

/// Wellbeing terms read the latest sample; a missing sample or field leaves
/// that term at the neutral value.
pub fn behavioral_score(profile: &Profile, latest: Option<&WellbeingSample>) -> f64 {
    let study_per_day = profile.study_hours_per_day();
    let term = |value: Option<f64>, f: fn(f64) -> f64| {
        value.filter(|v| v.is_finite()).map(f).unwrap_or(NEUTRAL)
    };

    let screen = term(latest.and_then(|s| s.screen_time_hours), |v| {
        normalize::inverse(v, 0.0, 12.0)
    });
    let social = term(latest.and_then(|s| s.social_media_hours), |v| {
        normalize::inverse(v, 0.0, 6.0)
    });
    let distraction = term(
        latest.and_then(|s| s.distraction_level).map(f64::from),
        |v| 1.0 - (v.clamp(1.0, 5.0) - 1.0) / 4.0,
    );
    let sleep = term(latest.and_then(|s| s.sleep_hours), |v| {
        clamp_unit(1.0 - (v - 7.5).abs() / 7.5)
    });

    let grit = grit(
        profile.consistency,
        profile.problem_solving,
        profile.project_count,
        study_per_day,
    );

    clamp_unit(
        0.20 * study_unit(study_per_day)
            + 0.15 * (profile.practice_hours_per_day / 6.0).min(1.0)
            + 0.15 * screen
            + 0.10 * social
            + 0.15 * distraction
            + 0.10 * sleep
            + 0.15 * grit,
    )
}

pub fn skill_base_score(profile: &Profile) -> f64 {
    let deployed = if profile.deployed { 0.20 } else { 0.0 };
    let internship = if profile.internship { 0.15 } else { 0.0 };

    clamp_unit(
        0.15 * (profile.language_count as f64 / 8.0).min(1.0)
            + 0.15 * rating_unit(profile.problem_solving)
            + 0.10 * rating_unit(profile.communication)
            + 0.10 * rating_unit(profile.teamwork)
            + 0.15 * projects_unit(profile.project_count)
            + deployed
            + internship
            + 0.10 * rating_unit(profile.career_clarity),
    )
}

/// Half profile-based, half market-weighted proficiency when skills are known.
pub fn skill_score(profile: &Profile, skills: &[SkillRecord]) -> f64 {
    let base = skill_base_score(profile);
    if skills.is_empty() {
        return base;
    }

    let (weighted_sum, weight_sum) = skills.iter().fold((0.0, 0.0), |(ws, w), skill| {
        (
            ws + (skill.proficiency / 100.0) * skill.market_weight,
            w + skill.market_weight,
        )
    });

    if weight_sum <= 0.0 {
        debug!("skills carry no market weight, using profile-based skill score");
        return base;
    }

    let weighted = weighted_sum / weight_sum;
    debug!(base, weighted, "combined skill score");
    clamp_unit(0.5 * base + 0.5 * weighted)
}

pub fn score_components(
    profile: &Profile,
    latest: Option<&WellbeingSample>,
    skills: &[SkillRecord],
) -> ComponentScores {
    ComponentScores {
        academic: academic_score(profile),
        behavioral: behavioral_score(profile, latest),
        skill: skill_score(profile, skills),
    }
}
