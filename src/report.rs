use std::fmt::Write;

use trajectory_engine::models::{Fallback, ScoreResult};

fn fallback_note(fallback: Fallback) -> &'static str {
    match fallback {
        Fallback::IndexUnavailable => "similarity index unavailable, scored from components only",
        Fallback::IndexTimeout => "similarity index timed out, scored from components only",
        Fallback::NoCandidates => "no comparable alumni found, scored from components only",
        Fallback::ZeroSimilaritySum => "matched alumni had zero similarity, used the neutral score",
        Fallback::VectorRepaired => "some alumni vectors were malformed and repaired",
        Fallback::HistoryUnavailable => "score history unavailable, trend assumed stable",
        Fallback::InsufficientHistory => "fewer than six past scores, trend assumed stable",
        Fallback::ProfileDefaults => "core profile fields missing, defaults used",
    }
}

pub fn build_report(label: Option<&str>, results: &[ScoreResult]) -> String {
    let mut output = String::new();
    let label = label.unwrap_or("all subjects");

    let _ = writeln!(output, "# Employability Trajectory Report");
    let _ = writeln!(output, "Generated for {} ({} subjects)", label, results.len());

    if results.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No subjects scored.");
        return output;
    }

    let mut ranked: Vec<&ScoreResult> = results.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    for result in ranked.iter() {
        let _ = writeln!(
            output,
            "- {} score {:.1} ±{:.1} ({}, {}, confidence {:.2})",
            result.subject_id,
            result.score,
            result.margin_of_error,
            result.predicted_tier,
            result.trend,
            result.confidence
        );
    }

    for result in ranked {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Subject {}", result.subject_id);
        let _ = writeln!(
            output,
            "Score {:.1} ({}), {}",
            result.score, result.predicted_tier, result.interpretation
        );
        let _ = writeln!(
            output,
            "Trend {} at {:+.2} points per period",
            result.trend, result.velocity
        );

        let _ = writeln!(output);
        let _ = writeln!(output, "### Components");
        let components = [
            ("Academic", result.academic_score, result.weights.academic, result.contributions.academic),
            ("Behavioral", result.behavioral_score, result.weights.behavioral, result.contributions.behavioral),
            ("Skills", result.skill_score, result.weights.skill, result.contributions.skill),
        ];
        for (name, score, weight, contribution) in components {
            let _ = writeln!(
                output,
                "- {}: {:.1} (weight {:.2}, contributes {:.1})",
                name, score, weight, contribution
            );
        }

        if !result.adjustments.is_empty() {
            let _ = writeln!(output);
            let _ = writeln!(output, "### Adjustments");
            for adjustment in &result.adjustments {
                let _ = writeln!(output, "- {} ({:+.0})", adjustment.label(), adjustment.points());
            }
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "### Closest Alumni");
        if result.matches.is_empty() {
            let _ = writeln!(output, "No comparable alumni.");
        } else {
            let stats = &result.similarity_stats;
            let _ = writeln!(
                output,
                "{} matches, similarity {:.2} to {:.2} (mean {:.2})",
                stats.count, stats.min, stats.max, stats.mean
            );
            for matched in result.matches.iter().take(5) {
                let _ = writeln!(
                    output,
                    "- {} ({}, {}) similarity {:.3}, outcome {:.1}",
                    matched.id,
                    matched.major,
                    matched.graduation_year,
                    matched.similarity,
                    matched.outcome_score
                );
            }
        }

        if !result.fallbacks.is_empty() {
            let _ = writeln!(output);
            let _ = writeln!(output, "### Caveats");
            for fallback in &result.fallbacks {
                let _ = writeln!(output, "- {}", fallback_note(*fallback));
            }
        }
    }

    output
}
