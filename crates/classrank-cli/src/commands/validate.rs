//! The `classrank validate` command.

use std::path::PathBuf;

use anyhow::Result;

use classrank_core::sheet::{read_sheet_directory, read_sheet_file, validate_sheet};

pub fn execute(sheet_path: PathBuf) -> Result<()> {
    let sheets = if sheet_path.is_dir() {
        read_sheet_directory(&sheet_path)?
    } else {
        vec![(sheet_path.clone(), read_sheet_file(&sheet_path)?)]
    };

    let mut total_warnings = 0;
    let mut invalid = 0;

    for (path, sheet) in &sheets {
        let title = sheet
            .sheet
            .title
            .clone()
            .unwrap_or_else(|| path.display().to_string());
        println!(
            "Sheet: {title} ({} students, {} subjects)",
            sheet.students.len(),
            sheet.sheet.subjects.len()
        );

        let warnings = validate_sheet(sheet);
        for w in &warnings {
            let prefix = w
                .roll_number
                .as_ref()
                .map(|roll| format!("  [{roll}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();

        if let Err(e) = sheet.clone().into_result(None) {
            println!("  ERROR: {e:#}");
            invalid += 1;
        }
    }

    if invalid > 0 {
        anyhow::bail!("{invalid} sheet(s) failed validation");
    }
    if total_warnings == 0 {
        println!("All sheets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
