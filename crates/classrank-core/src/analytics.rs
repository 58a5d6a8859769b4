//! Analytics engine.
//!
//! Pass/fail rates, subject difficulty, struggling and high-performing
//! students, narrative insights, and trends across results. Every operation
//! is a pure function of a [`ClassResult`] and the engine's
//! [`AnalysisConfig`]; empty inputs produce zeroed outputs, never errors.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{AnalysisConfig, DifficultyBand};
use crate::model::{ClassResult, StudentResult, Subject};
use crate::values::{round2, Grade, Percentage};

/// Overall pass/fail counts for a class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassFailRates {
    pub total_students: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_percentage: Percentage,
    pub fail_percentage: Percentage,
}

/// Pass/fail counts for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectPassFailRate {
    pub subject_name: String,
    pub total_students: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_percentage: Percentage,
}

/// A student failing at least `min_failures` subjects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrugglingStudent<'a> {
    pub student: &'a StudentResult,
    pub failed_subjects: Vec<String>,
    pub total_failures: usize,
}

/// A student excelling in at least half their subjects, or graded A/A+.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighPerformer<'a> {
    pub student: &'a StudentResult,
    pub excellent_subjects: Vec<String>,
    pub overall_grade: Grade,
}

/// Subject difficulty, easiest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Moderate,
    Difficult,
    #[serde(rename = "Very Difficult")]
    VeryDifficult,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Moderate => write!(f, "Moderate"),
            Difficulty::Difficult => write!(f, "Difficult"),
            Difficulty::VeryDifficult => write!(f, "Very Difficult"),
        }
    }
}

/// Difficulty classification for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectDifficulty {
    pub subject_name: String,
    /// Mean marks over the students who sat the subject.
    pub average_marks: f64,
    pub pass_rate: Percentage,
    pub difficulty: Difficulty,
    /// Students with a mark for the subject.
    pub students_count: usize,
}

/// Per-subject figures for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStatistics {
    pub subject_name: String,
    pub students_count: usize,
    pub average_marks: f64,
    pub highest_marks: f64,
    pub lowest_marks: f64,
    pub pass_rate: Percentage,
    pub difficulty: Difficulty,
}

/// Headline figures for a class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub total_students: usize,
    pub total_subjects: usize,
    pub class_average: f64,
    pub pass_percentage: Percentage,
    pub highest_percentage: f64,
    pub lowest_percentage: f64,
}

/// Number of students holding one letter grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeCount {
    pub grade: Grade,
    pub count: usize,
}

/// Qualitative band for a class average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassPerformance {
    Excellent,
    Good,
    Average,
    #[serde(rename = "Below Average")]
    BelowAverage,
    Poor,
}

impl fmt::Display for ClassPerformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassPerformance::Excellent => write!(f, "Excellent"),
            ClassPerformance::Good => write!(f, "Good"),
            ClassPerformance::Average => write!(f, "Average"),
            ClassPerformance::BelowAverage => write!(f, "Below Average"),
            ClassPerformance::Poor => write!(f, "Poor"),
        }
    }
}

/// Figures behind the insight strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightStatistics {
    pub total_students: usize,
    pub class_average: f64,
    pub top_performers: usize,
    pub struggling_students: usize,
    pub most_difficult_subject: Option<String>,
    pub easiest_subject: Option<String>,
}

/// Narrative summary of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceInsights {
    pub class_performance: ClassPerformance,
    pub key_insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub statistics: InsightStatistics,
}

/// Direction of class averages over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Improving => write!(f, "Improving"),
            Trend::Declining => write!(f, "Declining"),
            Trend::Stable => write!(f, "Stable"),
        }
    }
}

/// Trend across an ordered series of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceTrend {
    pub trend: Trend,
    /// Last average minus first average, rounded to two decimals.
    pub average_change: f64,
    /// Class average of each result, in input order.
    pub period_averages: Vec<f64>,
    pub insights: Vec<String>,
}

/// Per-subject aggregates shared by difficulty and statistics.
struct SubjectFigures {
    takers: usize,
    passed: usize,
    average: f64,
    highest: f64,
    lowest: f64,
}

/// Stateless analytics over class results, driven by one configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    config: AnalysisConfig,
}

impl AnalyticsEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Students at or above `passing_percentage` overall pass.
    pub fn calculate_pass_fail_rates(&self, result: &ClassResult) -> PassFailRates {
        let total_students = result.student_count();
        if total_students == 0 {
            return PassFailRates::default();
        }
        let passed = result
            .students()
            .iter()
            .filter(|s| s.percentage().value() >= self.config.passing_percentage)
            .count();
        let failed = total_students - passed;
        PassFailRates {
            total_students,
            passed,
            failed,
            pass_percentage: Percentage::from_fraction(passed as f64, total_students as f64),
            fail_percentage: Percentage::from_fraction(failed as f64, total_students as f64),
        }
    }

    /// Pass/fail per declared subject. A missing mark counts as not passed.
    pub fn calculate_subject_pass_fail_rates(
        &self,
        result: &ClassResult,
    ) -> BTreeMap<String, SubjectPassFailRate> {
        let total_students = result.student_count();
        result
            .subjects()
            .iter()
            .map(|subject| {
                let name = subject.name();
                let passed = result
                    .students()
                    .iter()
                    .filter(|s| {
                        s.marks_for(name)
                            .is_some_and(|m| m.value() >= self.config.passing_marks)
                    })
                    .count();
                let rate = SubjectPassFailRate {
                    subject_name: name.to_string(),
                    total_students,
                    passed,
                    failed: total_students - passed,
                    pass_percentage: Percentage::from_fraction(
                        passed as f64,
                        total_students as f64,
                    ),
                };
                (name.to_string(), rate)
            })
            .collect()
    }

    /// Students with at least `min_failures` subjects below `passing_marks`,
    /// most failures first.
    pub fn identify_struggling_students<'a>(
        &self,
        result: &'a ClassResult,
    ) -> Vec<StrugglingStudent<'a>> {
        let mut struggling: Vec<StrugglingStudent<'a>> = result
            .students()
            .iter()
            .filter_map(|student| {
                let failed_subjects = subjects_where(result.subjects(), student, |marks| {
                    marks < self.config.passing_marks
                });
                (failed_subjects.len() >= self.config.min_failures).then(|| StrugglingStudent {
                    student,
                    total_failures: failed_subjects.len(),
                    failed_subjects,
                })
            })
            .collect();
        struggling.sort_by(|a, b| b.total_failures.cmp(&a.total_failures));
        struggling
    }

    /// Students excelling (marks ≥ `excellence_threshold`) in at least half of
    /// their subjects, or with an overall A/A+ grade. Highest percentage first.
    pub fn identify_high_performers<'a>(&self, result: &'a ClassResult) -> Vec<HighPerformer<'a>> {
        let mut performers: Vec<HighPerformer<'a>> = result
            .students()
            .iter()
            .filter_map(|student| {
                let excellent_subjects = subjects_where(result.subjects(), student, |marks| {
                    marks >= self.config.excellence_threshold
                });
                let total_subjects = student.marks().len();
                let overall_grade = student.grade(&self.config.grade_scale);
                let excels_in_half =
                    total_subjects > 0 && excellent_subjects.len() >= total_subjects.div_ceil(2);
                (excels_in_half || overall_grade.is_top_grade()).then(|| HighPerformer {
                    student,
                    excellent_subjects,
                    overall_grade,
                })
            })
            .collect();
        performers.sort_by(|a, b| {
            b.student
                .percentage()
                .value()
                .total_cmp(&a.student.percentage().value())
        });
        performers
    }

    /// Classify each subject by pass rate and average marks. Sorted easiest
    /// first; subjects at the same level keep their declared order.
    pub fn analyze_subject_difficulty(&self, result: &ClassResult) -> Vec<SubjectDifficulty> {
        let mut analysis: Vec<SubjectDifficulty> = result
            .subjects()
            .iter()
            .map(|subject| {
                let figures = self.subject_figures(result, subject);
                let pass_rate =
                    Percentage::from_fraction(figures.passed as f64, figures.takers as f64);
                SubjectDifficulty {
                    subject_name: subject.name().to_string(),
                    average_marks: round2(figures.average),
                    pass_rate,
                    difficulty: self.classify_difficulty(pass_rate.value(), figures.average),
                    students_count: figures.takers,
                }
            })
            .collect();
        analysis.sort_by_key(|a| a.difficulty);
        analysis
    }

    /// Average, extremes, pass rate and difficulty per subject, in declared
    /// order.
    pub fn calculate_subject_statistics(&self, result: &ClassResult) -> Vec<SubjectStatistics> {
        result
            .subjects()
            .iter()
            .map(|subject| {
                let figures = self.subject_figures(result, subject);
                let pass_rate =
                    Percentage::from_fraction(figures.passed as f64, figures.takers as f64);
                SubjectStatistics {
                    subject_name: subject.name().to_string(),
                    students_count: figures.takers,
                    average_marks: round2(figures.average),
                    highest_marks: figures.highest,
                    lowest_marks: figures.lowest,
                    pass_rate,
                    difficulty: self.classify_difficulty(pass_rate.value(), figures.average),
                }
            })
            .collect()
    }

    /// Headline figures: class size, average, pass rate, best and worst
    /// percentage.
    pub fn calculate_class_summary(&self, result: &ClassResult) -> ClassSummary {
        if result.is_empty() {
            return ClassSummary {
                total_subjects: result.subject_count(),
                ..ClassSummary::default()
            };
        }
        let percentages = result.students().iter().map(|s| s.percentage().value());
        ClassSummary {
            total_students: result.student_count(),
            total_subjects: result.subject_count(),
            class_average: round2(result.class_average()),
            pass_percentage: self.calculate_pass_fail_rates(result).pass_percentage,
            highest_percentage: percentages.clone().fold(f64::MIN, f64::max),
            lowest_percentage: percentages.fold(f64::MAX, f64::min),
        }
    }

    /// Students per letter grade, best grade first. Grades nobody holds are
    /// listed with a zero count.
    pub fn calculate_grade_distribution(&self, result: &ClassResult) -> Vec<GradeCount> {
        let mut counts: BTreeMap<Grade, usize> = Grade::ALL.iter().map(|g| (*g, 0)).collect();
        for student in result.students() {
            *counts.entry(student.grade(&self.config.grade_scale)).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(grade, count)| GradeCount { grade, count })
            .collect()
    }

    /// Band, headline insights, and recommendations for a class.
    pub fn generate_performance_insights(&self, result: &ClassResult) -> PerformanceInsights {
        let total_students = result.student_count();
        if total_students == 0 {
            return PerformanceInsights {
                class_performance: ClassPerformance::Poor,
                key_insights: vec!["No student data available".to_string()],
                recommendations: vec!["Upload student results to get insights".to_string()],
                statistics: InsightStatistics::default(),
            };
        }

        let class_average = result.class_average();
        let class_performance = self.performance_band(class_average);
        let top_performers = self.identify_high_performers(result).len();
        let struggling_students = self.identify_struggling_students(result).len();

        let difficulty = self.analyze_subject_difficulty(result);
        let most_difficult_subject = difficulty.last().map(|d| d.subject_name.clone());
        let easiest_subject = difficulty.first().map(|d| d.subject_name.clone());

        let share = |count: usize| (count as f64 / total_students as f64 * 100.0).round();

        let mut key_insights = vec![format!(
            "Class average is {class_average:.1}% ({class_performance})"
        )];
        let mut recommendations = Vec::new();

        if top_performers > 0 {
            key_insights.push(format!(
                "{top_performers} students ({}%) are high performers",
                share(top_performers)
            ));
        }
        if struggling_students > 0 {
            key_insights.push(format!(
                "{struggling_students} students ({}%) need additional support",
                share(struggling_students)
            ));
            recommendations.push("Provide extra coaching for struggling students".to_string());
        }
        if let Some(subject) = &most_difficult_subject {
            key_insights.push(format!("{subject} is the most challenging subject for students"));
            recommendations.push(format!("Focus on improving teaching methods for {subject}"));
        }
        if class_average < self.config.insights.curriculum_review_below {
            recommendations
                .push("Consider reviewing curriculum difficulty and teaching pace".to_string());
            recommendations.push("Implement regular assessment and feedback cycles".to_string());
        }
        let advanced_cutoff = total_students as f64 * self.config.insights.advanced_learning_ratio;
        if top_performers as f64 > advanced_cutoff {
            recommendations
                .push("Consider advanced learning opportunities for high performers".to_string());
        }

        tracing::debug!(
            students = total_students,
            class_average,
            top_performers,
            struggling_students,
            "generated performance insights"
        );

        PerformanceInsights {
            class_performance,
            key_insights,
            recommendations,
            statistics: InsightStatistics {
                total_students,
                class_average: round2(class_average),
                top_performers,
                struggling_students,
                most_difficult_subject,
                easiest_subject,
            },
        }
    }

    /// Compare the first and last class averages of an ordered series.
    pub fn analyze_performance_trends(&self, results: &[ClassResult]) -> PerformanceTrend {
        if results.len() < 2 {
            return PerformanceTrend {
                trend: Trend::Stable,
                average_change: 0.0,
                period_averages: results.iter().map(|r| round2(r.class_average())).collect(),
                insights: vec!["Need at least two results to analyze trends".to_string()],
            };
        }

        let averages: Vec<f64> = results.iter().map(ClassResult::class_average).collect();
        let first = averages[0];
        let last = averages[averages.len() - 1];
        let change = last - first;

        let trend = if change > self.config.trend_threshold {
            Trend::Improving
        } else if change < -self.config.trend_threshold {
            Trend::Declining
        } else {
            Trend::Stable
        };

        let mut insights = vec![match trend {
            Trend::Improving => format!("Class performance has improved by {change:.1}% over time"),
            Trend::Declining => format!(
                "Class performance has declined by {:.1}% over time",
                change.abs()
            ),
            Trend::Stable => "Class performance has remained relatively stable".to_string(),
        }];

        let max = averages.iter().copied().fold(f64::MIN, f64::max);
        let min = averages.iter().copied().fold(f64::MAX, f64::min);
        if max - min > self.config.trend_spread_threshold {
            insights.push(format!(
                "Performance varies significantly across periods ({min:.1}% to {max:.1}%)"
            ));
        }

        tracing::debug!(periods = results.len(), change, %trend, "analyzed performance trend");

        PerformanceTrend {
            trend,
            average_change: round2(change),
            period_averages: averages.into_iter().map(round2).collect(),
            insights,
        }
    }

    fn subject_figures(&self, result: &ClassResult, subject: &Subject) -> SubjectFigures {
        let marks: Vec<f64> = result
            .students()
            .iter()
            .filter_map(|s| s.marks_for(subject.name()))
            .map(|m| m.value())
            .collect();
        if marks.is_empty() {
            return SubjectFigures {
                takers: 0,
                passed: 0,
                average: 0.0,
                highest: 0.0,
                lowest: 0.0,
            };
        }
        SubjectFigures {
            takers: marks.len(),
            passed: marks
                .iter()
                .filter(|&&m| m >= self.config.passing_marks)
                .count(),
            average: marks.iter().sum::<f64>() / marks.len() as f64,
            highest: marks.iter().copied().fold(f64::MIN, f64::max),
            lowest: marks.iter().copied().fold(f64::MAX, f64::min),
        }
    }

    fn classify_difficulty(&self, pass_rate: f64, average: f64) -> Difficulty {
        let bands = &self.config.difficulty;
        let meets = |band: &DifficultyBand| {
            pass_rate >= band.min_pass_rate && average >= band.min_average
        };
        if meets(&bands.easy) {
            Difficulty::Easy
        } else if meets(&bands.moderate) {
            Difficulty::Moderate
        } else if meets(&bands.difficult) {
            Difficulty::Difficult
        } else {
            Difficulty::VeryDifficult
        }
    }

    fn performance_band(&self, class_average: f64) -> ClassPerformance {
        let bands = &self.config.performance_bands;
        if class_average >= bands.excellent {
            ClassPerformance::Excellent
        } else if class_average >= bands.good {
            ClassPerformance::Good
        } else if class_average >= bands.average {
            ClassPerformance::Average
        } else if class_average >= bands.below_average {
            ClassPerformance::BelowAverage
        } else {
            ClassPerformance::Poor
        }
    }
}

/// Declared subjects, in order, where the student's mark satisfies `pred`.
fn subjects_where(
    subjects: &[Subject],
    student: &StudentResult,
    pred: impl Fn(f64) -> bool,
) -> Vec<String> {
    subjects
        .iter()
        .filter(|subject| {
            student
                .marks_for(subject.name())
                .is_some_and(|m| pred(m.value()))
        })
        .map(|subject| subject.name().to_string())
        .collect()
}
