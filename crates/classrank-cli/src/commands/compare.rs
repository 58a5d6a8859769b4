//! The `classrank compare` command.

use std::path::PathBuf;

use anyhow::Result;

use classrank_core::ranking::{compare_with_previous_result, RankChange};
use classrank_core::sheet::load_sheet;

pub fn execute(previous_path: PathBuf, current_path: PathBuf, format: String) -> Result<()> {
    let previous = load_sheet(&previous_path)?;
    let current = load_sheet(&current_path)?;

    let comparison = compare_with_previous_result(&current, &previous);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
        _ => {
            println!(
                "Comparison: {} improved, {} declined, {} maintained",
                comparison.improved.len(),
                comparison.declined.len(),
                comparison.maintained.len()
            );
            print_changes("Improved", &comparison.improved, '+');
            print_changes("Declined", &comparison.declined, '-');

            let unmatched = current.student_count()
                - (comparison.improved.len()
                    + comparison.declined.len()
                    + comparison.maintained.len());
            if unmatched > 0 {
                println!("\n{unmatched} student(s) not in the previous result");
            }
        }
    }

    Ok(())
}

fn print_changes(heading: &str, changes: &[RankChange<'_>], sign: char) {
    if changes.is_empty() {
        return;
    }
    println!("\n{heading}:");
    for c in changes {
        println!(
            "  {} ({}) #{} -> #{} ({sign}{})",
            c.student.name(),
            c.student.roll_number(),
            c.previous_rank,
            c.current_rank,
            c.rank_change
        );
    }
}
