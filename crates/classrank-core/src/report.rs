//! Analysis report snapshot with JSON persistence.
//!
//! The report is the plain-data form of one analysis run: everything the
//! engines computed, detached from the live `ClassResult`.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::{
    AnalyticsEngine, ClassSummary, GradeCount, PassFailRates, PerformanceInsights,
    SubjectStatistics,
};
use crate::model::ClassResult;
use crate::ranking::{
    calculate_rank_distribution, percentile_for_rank, rank_by_percentage, RankDistribution,
};
use crate::values::Grade;

/// A complete analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub summary: ClassSummary,
    pub pass_fail: PassFailRates,
    pub subject_statistics: Vec<SubjectStatistics>,
    pub grade_distribution: Vec<GradeCount>,
    pub rank_distribution: RankDistribution,
    /// Every student in rank order.
    pub student_rankings: Vec<StudentRanking>,
    pub insights: PerformanceInsights,
}

/// One row of the ranking table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRanking {
    pub rank: u32,
    pub name: String,
    pub roll_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub total_marks: f64,
    pub percentage: f64,
    pub grade: Grade,
    pub percentile: f64,
}

impl AnalysisReport {
    /// Run the ranking and analytics engines over `result` and capture the
    /// output.
    pub fn build(result: &ClassResult, engine: &AnalyticsEngine) -> Self {
        let scale = &engine.config().grade_scale;
        let ranked = rank_by_percentage(result.students());
        let population = ranked.len();
        let student_rankings = ranked
            .iter()
            .map(|r| StudentRanking {
                rank: r.rank,
                name: r.student.name().to_string(),
                roll_number: r.student.roll_number().to_string(),
                section: r.student.student().section.clone(),
                total_marks: r.student.total_marks(),
                percentage: r.student.percentage().value(),
                grade: r.student.grade(scale),
                percentile: percentile_for_rank(r.rank, population),
            })
            .collect();

        let report = AnalysisReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            title: result.label().unwrap_or("Result Analysis").to_string(),
            summary: engine.calculate_class_summary(result),
            pass_fail: engine.calculate_pass_fail_rates(result),
            subject_statistics: engine.calculate_subject_statistics(result),
            grade_distribution: engine.calculate_grade_distribution(result),
            rank_distribution: calculate_rank_distribution(result),
            student_rankings,
            insights: engine.generate_performance_insights(result),
        };
        tracing::info!(
            report_id = %report.id,
            students = report.summary.total_students,
            "built analysis report"
        );
        report
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AnalysisReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Look up a student's row by roll number.
    pub fn ranking_for(&self, roll_number: &str) -> Option<&StudentRanking> {
        self.student_rankings
            .iter()
            .find(|r| r.roll_number == roll_number)
    }
}
