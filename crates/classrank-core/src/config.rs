//! Analysis configuration.
//!
//! Every threshold the engines use lives here, so the pass mark applied by
//! pass/fail rates is the same one the insights generator reuses.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::values::Grade;

/// Minimum percentage for one letter grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBoundary {
    pub grade: Grade,
    pub min_percentage: f64,
}

/// Letter-grade table, highest boundary first. Percentages below every
/// boundary map to `F`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeScale {
    boundaries: Vec<GradeBoundary>,
}

impl GradeScale {
    pub fn new(boundaries: Vec<GradeBoundary>) -> Self {
        Self { boundaries }
    }

    pub fn boundaries(&self) -> &[GradeBoundary] {
        &self.boundaries
    }

    pub fn grade_for(&self, percentage: f64) -> Grade {
        self.boundaries
            .iter()
            .find(|b| percentage >= b.min_percentage)
            .map(|b| b.grade)
            .unwrap_or(Grade::F)
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        let boundary = |grade, min_percentage| GradeBoundary {
            grade,
            min_percentage,
        };
        Self::new(vec![
            boundary(Grade::APlus, 90.0),
            boundary(Grade::A, 80.0),
            boundary(Grade::B, 70.0),
            boundary(Grade::C, 60.0),
            boundary(Grade::D, 40.0),
        ])
    }
}

/// Minimum pass rate and average marks for one difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyBand {
    pub min_pass_rate: f64,
    pub min_average: f64,
}

/// Joint (pass rate, average) cut-offs; a subject meeting none of them is
/// "Very Difficult".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyThresholds {
    #[serde(default = "default_easy")]
    pub easy: DifficultyBand,
    #[serde(default = "default_moderate")]
    pub moderate: DifficultyBand,
    #[serde(default = "default_difficult")]
    pub difficult: DifficultyBand,
}

fn default_easy() -> DifficultyBand {
    DifficultyBand {
        min_pass_rate: 90.0,
        min_average: 75.0,
    }
}
fn default_moderate() -> DifficultyBand {
    DifficultyBand {
        min_pass_rate: 75.0,
        min_average: 60.0,
    }
}
fn default_difficult() -> DifficultyBand {
    DifficultyBand {
        min_pass_rate: 50.0,
        min_average: 45.0,
    }
}

impl Default for DifficultyThresholds {
    fn default() -> Self {
        Self {
            easy: default_easy(),
            moderate: default_moderate(),
            difficult: default_difficult(),
        }
    }
}

/// Class-average cut-offs for the qualitative performance band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBands {
    #[serde(default = "default_excellent")]
    pub excellent: f64,
    #[serde(default = "default_good")]
    pub good: f64,
    #[serde(default = "default_average")]
    pub average: f64,
    #[serde(default = "default_below_average")]
    pub below_average: f64,
}

fn default_excellent() -> f64 {
    85.0
}
fn default_good() -> f64 {
    70.0
}
fn default_average() -> f64 {
    55.0
}
fn default_below_average() -> f64 {
    40.0
}

impl Default for PerformanceBands {
    fn default() -> Self {
        Self {
            excellent: default_excellent(),
            good: default_good(),
            average: default_average(),
            below_average: default_below_average(),
        }
    }
}

/// Triggers for the optional recommendation strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightThresholds {
    /// Class averages below this add curriculum-review recommendations.
    #[serde(default = "default_review_below")]
    pub curriculum_review_below: f64,
    /// Share of high performers (0..1) above which advanced learning is suggested.
    #[serde(default = "default_advanced_ratio")]
    pub advanced_learning_ratio: f64,
}

fn default_review_below() -> f64 {
    60.0
}
fn default_advanced_ratio() -> f64 {
    0.3
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            curriculum_review_below: default_review_below(),
            advanced_learning_ratio: default_advanced_ratio(),
        }
    }
}

/// Top-level classrank configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum marks per subject.
    #[serde(default = "default_max_marks")]
    pub max_marks: f64,
    /// Overall percentage needed to pass.
    #[serde(default = "default_pass")]
    pub passing_percentage: f64,
    /// Subject marks needed to pass that subject.
    #[serde(default = "default_pass")]
    pub passing_marks: f64,
    /// Subject marks counted as excellent.
    #[serde(default = "default_excellence")]
    pub excellence_threshold: f64,
    /// Failed subjects needed to flag a student as struggling.
    #[serde(default = "default_min_failures")]
    pub min_failures: usize,
    /// Maximum rank variance for a consistent performer.
    #[serde(default = "default_variance")]
    pub variance_threshold: f64,
    /// Change in class average (percentage points) that counts as a trend.
    #[serde(default = "default_trend")]
    pub trend_threshold: f64,
    /// Spread between best and worst period averages flagged as high variance.
    #[serde(default = "default_spread")]
    pub trend_spread_threshold: f64,
    #[serde(default)]
    pub grade_scale: GradeScale,
    #[serde(default)]
    pub difficulty: DifficultyThresholds,
    #[serde(default)]
    pub performance_bands: PerformanceBands,
    #[serde(default)]
    pub insights: InsightThresholds,
}

fn default_max_marks() -> f64 {
    100.0
}
fn default_pass() -> f64 {
    40.0
}
fn default_excellence() -> f64 {
    85.0
}
fn default_min_failures() -> usize {
    2
}
fn default_variance() -> f64 {
    5.0
}
fn default_trend() -> f64 {
    5.0
}
fn default_spread() -> f64 {
    10.0
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_marks: default_max_marks(),
            passing_percentage: default_pass(),
            passing_marks: default_pass(),
            excellence_threshold: default_excellence(),
            min_failures: default_min_failures(),
            variance_threshold: default_variance(),
            trend_threshold: default_trend(),
            trend_spread_threshold: default_spread(),
            grade_scale: GradeScale::default(),
            difficulty: DifficultyThresholds::default(),
            performance_bands: PerformanceBands::default(),
            insights: InsightThresholds::default(),
        }
    }
}

impl AnalysisConfig {
    /// Check that thresholds are in range and tables are ordered.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.max_marks.is_finite() && self.max_marks > 0.0,
            "max_marks must be positive, got {}",
            self.max_marks
        );
        for (name, value) in [
            ("passing_percentage", self.passing_percentage),
            ("trend_threshold", self.trend_threshold),
            ("trend_spread_threshold", self.trend_spread_threshold),
        ] {
            anyhow::ensure!(
                (0.0..=100.0).contains(&value),
                "{name} must be between 0 and 100, got {value}"
            );
        }
        for (name, value) in [
            ("passing_marks", self.passing_marks),
            ("excellence_threshold", self.excellence_threshold),
        ] {
            anyhow::ensure!(
                (0.0..=self.max_marks).contains(&value),
                "{name} must be between 0 and max_marks ({}), got {value}",
                self.max_marks
            );
        }
        anyhow::ensure!(
            self.variance_threshold >= 0.0,
            "variance_threshold cannot be negative"
        );
        anyhow::ensure!(
            self.grade_scale
                .boundaries()
                .windows(2)
                .all(|w| w[0].min_percentage > w[1].min_percentage),
            "grade_scale boundaries must be strictly descending"
        );

        let bands = &self.performance_bands;
        anyhow::ensure!(
            bands.excellent > bands.good
                && bands.good > bands.average
                && bands.average > bands.below_average,
            "performance_bands must be strictly descending"
        );

        let d = &self.difficulty;
        for (name, band) in [
            ("easy", d.easy),
            ("moderate", d.moderate),
            ("difficult", d.difficult),
        ] {
            anyhow::ensure!(
                (0.0..=100.0).contains(&band.min_pass_rate),
                "difficulty.{name}.min_pass_rate must be between 0 and 100, got {}",
                band.min_pass_rate
            );
        }
        anyhow::ensure!(
            d.easy.min_pass_rate >= d.moderate.min_pass_rate
                && d.moderate.min_pass_rate >= d.difficult.min_pass_rate
                && d.easy.min_average >= d.moderate.min_average
                && d.moderate.min_average >= d.difficult.min_average,
            "difficulty bands must not loosen from easy to difficult"
        );
        Ok(())
    }
}

const PASSING_MARKS_ENV: &str = "CLASSRANK_PASSING_MARKS";
const PASSING_PERCENTAGE_ENV: &str = "CLASSRANK_PASSING_PERCENTAGE";
const EXCELLENCE_ENV: &str = "CLASSRANK_EXCELLENCE_THRESHOLD";

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `classrank.toml` in the current directory
/// 2. `~/.config/classrank/config.toml`
///
/// Environment variable overrides: `CLASSRANK_PASSING_MARKS`,
/// `CLASSRANK_PASSING_PERCENTAGE`, `CLASSRANK_EXCELLENCE_THRESHOLD`.
pub fn load_config() -> Result<AnalysisConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AnalysisConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("classrank.toml");
        if local.exists() {
            Some(local)
        } else {
            config_dir()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Parse a TOML string into an `AnalysisConfig`.
pub fn parse_config_str(content: &str) -> Result<AnalysisConfig> {
    Ok(toml::from_str::<AnalysisConfig>(content)?)
}

fn apply_env_overrides(config: &mut AnalysisConfig) -> Result<()> {
    if let Some(v) = env_f64(PASSING_MARKS_ENV)? {
        config.passing_marks = v;
    }
    if let Some(v) = env_f64(PASSING_PERCENTAGE_ENV)? {
        config.passing_percentage = v;
    }
    if let Some(v) = env_f64(EXCELLENCE_ENV)? {
        config.excellence_threshold = v;
    }
    Ok(())
}

fn env_f64(name: &str) -> Result<Option<f64>> {
    match std::env::var(name) {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse::<f64>()
                .with_context(|| format!("{name} must be a number, got '{raw}'"))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("classrank"))
}
