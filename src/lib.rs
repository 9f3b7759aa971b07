//! Employability trajectory scoring.
//!
//! A subject's profile, recent wellbeing samples and skills are turned into a
//! 15-slot feature vector, matched against historical alumni outcomes and
//! blended into a 0-100 trajectory score with a confidence estimate and trend.

pub mod collaborators;
pub mod components;
pub mod confidence;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod normalize;
pub mod outcome;
pub mod similarity;
pub mod trajectory;
pub mod vector;

pub use collaborators::{
    DefaultSkillDemand, InMemoryHistory, InMemoryIndex, NoHistory, ScoreHistoryStore,
    SkillDemandProvider, VectorIndex,
};
pub use config::EngineConfig;
pub use engine::{PreparedSubject, TrajectoryEngine};
pub use error::{ConfigError, EngineError, HistoryError, IndexError};
pub use models::{
    AlumniCandidate, Fallback, OutcomeCategory, PlacementStatus, ProfileInput, ScoreResult,
    ScoringRequest, SkillInput, Tier, Trend, WellbeingSample,
};
pub use vector::FeatureVector;
