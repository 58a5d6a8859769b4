//! The `classrank rank` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use classrank_core::config::{load_config_from, GradeScale};
use classrank_core::model::ClassResult;
use classrank_core::ranking::{
    calculate_percentile, get_bottom_students, get_students_by_rank_range, get_top_students,
    rank_by_percentage, rank_by_subject, RankedStudent,
};
use classrank_core::sheet::load_sheet;

/// Which slice of the ranking to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    Top(usize),
    Bottom(usize),
    Range { from: u32, to: u32 },
}

impl Selection {
    pub fn new(
        top: Option<usize>,
        bottom: Option<usize>,
        from: Option<u32>,
        to: Option<u32>,
    ) -> Self {
        match (top, bottom, from, to) {
            (Some(n), _, _, _) => Selection::Top(n),
            (_, Some(n), _, _) => Selection::Bottom(n),
            (_, _, None, None) => Selection::All,
            (_, _, from, to) => Selection::Range {
                from: from.unwrap_or(1),
                to: to.unwrap_or(u32::MAX),
            },
        }
    }
}

pub fn execute(
    sheet: PathBuf,
    selection: Selection,
    subject: Option<String>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let result = load_sheet(&sheet)?;

    if result.is_empty() {
        println!("No students in {}", sheet.display());
        return Ok(());
    }

    match subject {
        Some(subject) => print_subject_ranking(&result, &subject, selection),
        None => {
            print_overall_ranking(&result, selection, &config.grade_scale);
            Ok(())
        }
    }
}

fn print_overall_ranking(result: &ClassResult, selection: Selection, scale: &GradeScale) {
    let population = rank_by_percentage(result.students());
    let rows: Vec<RankedStudent<'_>> = match selection {
        Selection::All => population.clone(),
        Selection::Top(n) => get_top_students(result, n),
        Selection::Bottom(n) => get_bottom_students(result, n),
        Selection::Range { from, to } => get_students_by_rank_range(result, from, to),
    };

    let mut table = Table::new();
    table.set_header(vec![
        "Rank", "Roll No", "Name", "Total", "Percentage", "Grade", "Percentile",
    ]);
    for r in &rows {
        table.add_row(vec![
            Cell::new(r.rank),
            Cell::new(r.student.roll_number()),
            Cell::new(r.student.name()),
            Cell::new(r.student.total_marks()),
            Cell::new(r.student.percentage()),
            Cell::new(r.student.grade(scale)),
            Cell::new(format!("{:.1}", calculate_percentile(r, &population))),
        ]);
    }
    println!("{table}");
    println!("{} of {} students shown", rows.len(), population.len());
}

fn print_subject_ranking(result: &ClassResult, subject: &str, selection: Selection) -> Result<()> {
    if !result.subjects().iter().any(|s| s.name() == subject) {
        let known: Vec<&str> = result.subjects().iter().map(|s| s.name()).collect();
        anyhow::bail!("unknown subject '{subject}' (sheet has: {})", known.join(", "));
    }

    let ranked = rank_by_subject(result.students(), subject);
    let total = ranked.len();
    let rows: Vec<_> = match selection {
        Selection::All => ranked,
        Selection::Top(n) => ranked.into_iter().take(n).collect(),
        Selection::Bottom(n) => ranked.into_iter().rev().take(n).collect(),
        Selection::Range { from, to } => ranked
            .into_iter()
            .filter(|r| (from..=to).contains(&r.subject_rank))
            .collect(),
    };

    let mut table = Table::new();
    table.set_header(vec!["Rank", "Roll No", "Name", subject]);
    for r in &rows {
        table.add_row(vec![
            Cell::new(r.subject_rank),
            Cell::new(r.student.roll_number()),
            Cell::new(r.student.name()),
            Cell::new(r.marks),
        ]);
    }
    println!("{table}");
    println!("{} of {} students shown", rows.len(), total);
    Ok(())
}
