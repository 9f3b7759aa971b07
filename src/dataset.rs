use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use uuid::Uuid;

use trajectory_engine::collaborators::InMemoryHistory;
use trajectory_engine::models::{
    AlumniCandidate, OutcomeCategory, PlacementStatus, ProfileInput, ScoringRequest, Tier,
};
use trajectory_engine::vector::VectorBuilder;

/// Alumni outcome set. Vectors are built from the recorded profile fields.
pub fn load_alumni(csv_path: &Path, builder: &VectorBuilder) -> anyhow::Result<Vec<AlumniCandidate>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        id: Option<Uuid>,
        major: String,
        graduation_year: i32,
        gpa: Option<f64>,
        attendance: Option<f64>,
        study_hours_per_week: Option<f64>,
        project_count: Option<u32>,
        placement_status: PlacementStatus,
        company_tier: Option<Tier>,
        outcome_score: Option<f64>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open alumni file {}", csv_path.display()))?;
    let mut alumni = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid alumni row {}", line + 1))?;
        let profile = ProfileInput {
            gpa: row.gpa,
            attendance: row.attendance,
            study_hours_per_week: row.study_hours_per_week,
            project_count: row.project_count,
            major: Some(row.major.clone()),
            ..Default::default()
        }
        .resolve();

        alumni.push(AlumniCandidate {
            id: row.id.unwrap_or_else(Uuid::new_v4),
            vector: builder.build_alumni(&profile, &[]).into(),
            major: row.major,
            graduation_year: row.graduation_year,
            similarity: 0.0,
            outcome: OutcomeCategory {
                placement: row.placement_status,
                tier: row.company_tier,
            },
            outcome_score: row.outcome_score,
        });
    }

    Ok(alumni)
}

pub fn load_history(csv_path: &Path) -> anyhow::Result<InMemoryHistory> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        subject_id: Uuid,
        score: f64,
        calculated_on: NaiveDate,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open history file {}", csv_path.display()))?;
    let mut history = InMemoryHistory::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        history.record(row.subject_id, row.calculated_on, row.score);
    }

    Ok(history)
}

/// A request file holds either one request or an array of them.
pub fn load_requests(json_path: &Path) -> anyhow::Result<Vec<ScoringRequest>> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum RequestFile {
        Many(Vec<ScoringRequest>),
        One(Box<ScoringRequest>),
    }

    let raw = std::fs::read_to_string(json_path)
        .with_context(|| format!("failed to read request file {}", json_path.display()))?;
    let parsed: RequestFile = serde_json::from_str(&raw)
        .with_context(|| format!("invalid scoring request in {}", json_path.display()))?;

    Ok(match parsed {
        RequestFile::Many(requests) => requests,
        RequestFile::One(request) => vec![*request],
    })
}
