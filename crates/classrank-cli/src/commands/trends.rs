//! The `classrank trends` command.

use std::path::PathBuf;

use anyhow::Result;

use classrank_core::analytics::AnalyticsEngine;
use classrank_core::config::load_config_from;
use classrank_core::model::ClassResult;
use classrank_core::ranking::find_consistent_performers;
use classrank_core::sheet::load_sheet;

pub fn execute(
    sheets: Vec<PathBuf>,
    variance_threshold: Option<f64>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let threshold = variance_threshold.unwrap_or(config.variance_threshold);
    anyhow::ensure!(threshold >= 0.0, "variance threshold cannot be negative");

    let results = sheets
        .iter()
        .map(|p| load_sheet(p))
        .collect::<Result<Vec<ClassResult>>>()?;

    tracing::debug!(periods = results.len(), threshold, "loaded results for trends");

    let engine = AnalyticsEngine::new(config);
    let trend = engine.analyze_performance_trends(&results);

    println!("Trend: {} ({:+.2})", trend.trend, trend.average_change);
    for (result, average) in results.iter().zip(&trend.period_averages) {
        println!("  {}: {average:.2}%", result.label().unwrap_or("(untitled)"));
    }
    for line in &trend.insights {
        println!("  - {line}");
    }

    let performers = find_consistent_performers(&results, threshold);
    if performers.is_empty() {
        println!("\nNo consistent performers (variance <= {threshold}).");
    } else {
        println!("\nConsistent performers (variance <= {threshold}):");
        for p in &performers {
            let ranks: Vec<String> = p.ranks.iter().map(|r| format!("#{r}")).collect();
            println!(
                "  {} ({}) ranks {} variance {:.2}",
                p.name,
                p.roll_number,
                ranks.join(", "),
                p.variance
            );
        }
    }

    Ok(())
}
