//! The `classrank init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("classrank.toml").exists() {
        println!("classrank.toml already exists, skipping.");
    } else {
        std::fs::write("classrank.toml", SAMPLE_CONFIG)?;
        println!("Created classrank.toml");
    }

    std::fs::create_dir_all("sheets")?;
    let example_path = std::path::Path::new("sheets/example.toml");
    if example_path.exists() {
        println!("sheets/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_SHEET)?;
        println!("Created sheets/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Adjust the thresholds in classrank.toml");
    println!("  2. Run: classrank validate --sheet sheets/example.toml");
    println!("  3. Run: classrank analyze --sheet sheets/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# classrank configuration

max_marks = 100
passing_percentage = 40
passing_marks = 40
excellence_threshold = 85
min_failures = 2
variance_threshold = 5
trend_threshold = 5
trend_spread_threshold = 10

[performance_bands]
excellent = 85
good = 70
average = 55
below_average = 40

[difficulty.easy]
min_pass_rate = 90
min_average = 75

[difficulty.moderate]
min_pass_rate = 75
min_average = 60

[difficulty.difficult]
min_pass_rate = 50
min_average = 45

[insights]
curriculum_review_below = 60
advanced_learning_ratio = 0.3
"#;

const EXAMPLE_SHEET: &str = r#"[sheet]
title = "Example Class"
max_marks = 100
subjects = ["Mathematics", "Science", "English"]

[[students]]
name = "Aarav Shah"
roll_number = "001"
section = "A"
marks = { Mathematics = 92, Science = 88, English = 79 }

[[students]]
name = "Bea Lopez"
roll_number = "002"
section = "A"
marks = { Mathematics = 67, Science = 72, English = 81 }

[[students]]
name = "Chidi Okafor"
roll_number = "003"
section = "B"
marks = { Mathematics = 35, Science = 38, English = 52 }
"#;
