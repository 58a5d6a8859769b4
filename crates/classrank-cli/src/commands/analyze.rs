//! The `classrank analyze` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use classrank_core::analytics::AnalyticsEngine;
use classrank_core::config::load_config_from;
use classrank_core::report::AnalysisReport;
use classrank_core::sheet::load_sheet;

pub fn execute(
    sheet: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let result = load_sheet(&sheet)?;
    let engine = AnalyticsEngine::new(config);

    let report = AnalysisReport::build(&result, &engine);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text(&report),
    }

    if let Some(dir) = output {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
        let path = dir.join(format!("report-{timestamp}.json"));
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_text(report: &AnalysisReport) {
    let summary = &report.summary;
    println!("{}", report.title);
    println!(
        "Students: {}  Subjects: {}  Class average: {:.2}%",
        summary.total_students, summary.total_subjects, summary.class_average
    );
    println!(
        "Passed: {} ({})  Failed: {} ({})",
        report.pass_fail.passed,
        report.pass_fail.pass_percentage,
        report.pass_fail.failed,
        report.pass_fail.fail_percentage
    );
    println!(
        "Highest: {:.2}%  Lowest: {:.2}%",
        summary.highest_percentage, summary.lowest_percentage
    );

    if !report.subject_statistics.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            "Subject", "Students", "Average", "Highest", "Lowest", "Pass Rate", "Difficulty",
        ]);
        for s in &report.subject_statistics {
            table.add_row(vec![
                Cell::new(&s.subject_name),
                Cell::new(s.students_count),
                Cell::new(format!("{:.2}", s.average_marks)),
                Cell::new(s.highest_marks),
                Cell::new(s.lowest_marks),
                Cell::new(s.pass_rate),
                Cell::new(s.difficulty),
            ]);
        }
        println!("\n{table}");
    }

    let grades: Vec<String> = report
        .grade_distribution
        .iter()
        .map(|g| format!("{}: {}", g.grade, g.count))
        .collect();
    println!("\nGrades: {}", grades.join("  "));

    let insights = &report.insights;
    println!("\nClass performance: {}", insights.class_performance);
    if !insights.key_insights.is_empty() {
        println!("\nKey insights:");
        for line in &insights.key_insights {
            println!("  - {line}");
        }
    }
    if !insights.recommendations.is_empty() {
        println!("\nRecommendations:");
        for line in &insights.recommendations {
            println!("  - {line}");
        }
    }
}
