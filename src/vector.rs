//! Fixed 15-slot feature vector used for similarity retrieval.
//!
//! | Slot  | Feature |
//! |-------|---------|
//! | 0     | GPA (sigmoid, midpoint 7.0) |
//! | 1     | attendance |
//! | 2     | study hours per week |
//! | 3     | project count |
//! | 4     | decayed screen time, inverted |
//! | 5     | focus ratio of the latest sample |
//! | 6     | decayed sleep |
//! | 7..15 | up to 8 skills, highest market weight first |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Profile, SkillRecord, WellbeingSample};
use crate::normalize::{self, NEUTRAL};

pub const DIMENSIONS: usize = 15;
pub const SKILL_SLOTS: usize = 8;
pub const WELLBEING_WINDOW: usize = 7;
const SKILL_OFFSET: usize = DIMENSIONS - SKILL_SLOTS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; DIMENSIONS]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Coerce an arbitrary slice into a valid vector. Missing slots are padded
    /// with the neutral value, extra slots are dropped and every component is
    /// sanitized. The flag reports whether anything had to change.
    pub fn from_raw(raw: &[f64]) -> (Self, bool) {
        let mut slots = [NEUTRAL; DIMENSIONS];
        let mut repaired = raw.len() != DIMENSIONS;

        for (slot, value) in slots.iter_mut().zip(raw.iter()) {
            let clean = sanitize(*value);
            if clean.to_bits() != value.to_bits() {
                repaired = true;
            }
            *slot = clean;
        }

        (Self(slots), repaired)
    }

    fn from_slots(mut slots: [f64; DIMENSIONS]) -> Self {
        for slot in slots.iter_mut() {
            *slot = sanitize(*slot);
        }
        Self(slots)
    }
}

impl From<FeatureVector> for Vec<f64> {
    fn from(vector: FeatureVector) -> Self {
        vector.0.to_vec()
    }
}

/// NaN becomes neutral, infinities saturate, everything else is clipped to [0, 1].
fn sanitize(value: f64) -> f64 {
    if value.is_nan() {
        NEUTRAL
    } else if value == f64::INFINITY {
        1.0
    } else if value == f64::NEG_INFINITY {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VectorBuilder {
    decay_rate: f64,
}

impl Default for VectorBuilder {
    fn default() -> Self {
        Self { decay_rate: 0.1 }
    }
}

impl VectorBuilder {
    pub fn new(decay_rate: f64) -> Self {
        Self { decay_rate }
    }

    /// `wellbeing` must be ordered newest first; only the newest
    /// `WELLBEING_WINDOW` samples are read.
    pub fn build(
        &self,
        profile: &Profile,
        wellbeing: &[WellbeingSample],
        skills: &[SkillRecord],
        as_of: NaiveDate,
    ) -> FeatureVector {
        let mut slots = [NEUTRAL; DIMENSIONS];

        slots[0] = normalize::sigmoid(profile.gpa, 7.0, 0.5);
        slots[1] = normalize::standard(profile.attendance, 0.0, 100.0);
        slots[2] = normalize::standard(profile.study_hours_per_week, 0.0, 40.0);
        slots[3] = normalize::standard(f64::from(profile.project_count), 0.0, 10.0);

        let window = &wellbeing[..wellbeing.len().min(WELLBEING_WINDOW)];
        if let Some(latest) = window.first() {
            let screen: Vec<(f64, f64)> = window
                .iter()
                .map(|s| (s.screen_time_or_default(), s.days_ago(as_of)))
                .collect();
            let sleep: Vec<(f64, f64)> = window
                .iter()
                .map(|s| (s.sleep_or_default(), s.days_ago(as_of)))
                .collect();

            let avg_screen = normalize::decayed_average(&screen, self.decay_rate);
            let avg_sleep = normalize::decayed_average(&sleep, self.decay_rate);

            slots[4] = normalize::inverse(avg_screen, 0.0, 12.0);
            slots[5] = normalize::focus_ratio(latest.productive_hours(), latest.distracting_hours());
            slots[6] = normalize::standard(avg_sleep, 4.0, 10.0);
        }

        for (slot, skill) in slots[SKILL_OFFSET..]
            .iter_mut()
            .zip(ranked_skills(skills).into_iter())
        {
            *slot = normalize::sigmoid(skill.proficiency * skill.market_weight, 70.0, 0.02);
        }

        FeatureVector::from_slots(slots)
    }

    /// Graduates carry no live wellbeing data, so those slots stay neutral.
    pub fn build_alumni(&self, profile: &Profile, skills: &[SkillRecord]) -> FeatureVector {
        self.build(profile, &[], skills, NaiveDate::MIN)
    }
}

/// Skills ordered by market weight, highest first, keeping input order on ties.
fn ranked_skills(skills: &[SkillRecord]) -> Vec<&SkillRecord> {
    let mut ranked: Vec<&SkillRecord> = skills.iter().collect();
    ranked.sort_by(|a, b| b.market_weight.total_cmp(&a.market_weight));
    ranked.truncate(SKILL_SLOTS);
    ranked
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VectorCheck {
    pub dimension_ok: bool,
    pub finite: bool,
    pub in_range: bool,
}

impl VectorCheck {
    pub fn is_valid(&self) -> bool {
        self.dimension_ok && self.finite
    }
}

/// Report on a raw vector's shape. Out-of-range values do not make a vector
/// invalid; they are clipped when the vector is repaired.
pub fn validate_vector(raw: &[f64]) -> VectorCheck {
    VectorCheck {
        dimension_ok: raw.len() == DIMENSIONS,
        finite: !raw.is_empty() && raw.iter().all(|v| v.is_finite()),
        in_range: raw.iter().all(|v| (0.0..=1.0).contains(v)),
    }
}
