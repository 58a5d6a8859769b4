//! Ranking engine.
//!
//! Dense ranking over a [`ClassResult`]: students tied on the ranking key
//! share a rank, and the next distinct key gets the shared rank + 1. Ranks
//! are returned as new views over the students; the result itself is never
//! mutated.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{ClassResult, StudentId, StudentResult};
use crate::values::{round2, Marks};

/// A student paired with their overall rank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedStudent<'a> {
    pub student: &'a StudentResult,
    pub rank: u32,
}

/// A student paired with their rank in one subject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubjectRankedStudent<'a> {
    pub student: &'a StudentResult,
    pub marks: Marks,
    pub subject_rank: u32,
}

/// Assign dense ranks to an already sorted sequence. `same_key` decides
/// whether two neighbours tie.
fn dense_ranks<T>(sorted: &[T], same_key: impl Fn(&T, &T) -> bool) -> Vec<u32> {
    let mut ranks = Vec::with_capacity(sorted.len());
    let mut current = 1;
    for (i, item) in sorted.iter().enumerate() {
        if i > 0 && !same_key(&sorted[i - 1], item) {
            current += 1;
        }
        ranks.push(current);
    }
    ranks
}

fn by_percentage_then_total(a: &StudentResult, b: &StudentResult) -> Ordering {
    b.percentage()
        .value()
        .total_cmp(&a.percentage().value())
        .then_with(|| b.total_marks().total_cmp(&a.total_marks()))
}

/// Rank by overall percentage (descending), then total marks (descending).
///
/// Two students share a rank only when both percentage and total marks are
/// equal.
pub fn rank_by_percentage(students: &[StudentResult]) -> Vec<RankedStudent<'_>> {
    let mut sorted: Vec<&StudentResult> = students.iter().collect();
    sorted.sort_by(|a, b| by_percentage_then_total(a, b));

    let ranks = dense_ranks(&sorted, |a, b| by_percentage_then_total(a, b) == Ordering::Equal);
    sorted
        .into_iter()
        .zip(ranks)
        .map(|(student, rank)| RankedStudent { student, rank })
        .collect()
}

/// Rank the students who sat `subject` by their marks in it. Students
/// without a mark for the subject are left out.
pub fn rank_by_subject<'a>(
    students: &'a [StudentResult],
    subject: &str,
) -> Vec<SubjectRankedStudent<'a>> {
    let mut with_subject: Vec<(&StudentResult, Marks)> = students
        .iter()
        .filter_map(|s| s.marks_for(subject).map(|m| (s, m)))
        .collect();
    with_subject.sort_by(|a, b| b.1.value().total_cmp(&a.1.value()));

    let ranks = dense_ranks(&with_subject, |a, b| a.1.value() == b.1.value());
    with_subject
        .into_iter()
        .zip(ranks)
        .map(|((student, marks), subject_rank)| SubjectRankedStudent {
            student,
            marks,
            subject_rank,
        })
        .collect()
}

/// The first `count` students by overall rank.
pub fn get_top_students(result: &ClassResult, count: usize) -> Vec<RankedStudent<'_>> {
    let mut ranked = rank_by_percentage(result.students());
    ranked.truncate(count);
    ranked
}

/// The last `count` students by overall rank, worst first.
pub fn get_bottom_students(result: &ClassResult, count: usize) -> Vec<RankedStudent<'_>> {
    let ranked = rank_by_percentage(result.students());
    let start = ranked.len().saturating_sub(count);
    ranked[start..].iter().rev().copied().collect()
}

/// Students whose dense rank lies in `[start, end]`. Ties at the edges are
/// all included, so the length can exceed `end - start + 1`.
pub fn get_students_by_rank_range(
    result: &ClassResult,
    start: u32,
    end: u32,
) -> Vec<RankedStudent<'_>> {
    rank_by_percentage(result.students())
        .into_iter()
        .filter(|r| (start..=end).contains(&r.rank))
        .collect()
}

/// `((N - rank + 1) / N) × 100`. Zero when the population is empty or the
/// rank is unset.
pub fn calculate_percentile(student: &RankedStudent<'_>, population: &[RankedStudent<'_>]) -> f64 {
    percentile_for_rank(student.rank, population.len())
}

pub(crate) fn percentile_for_rank(rank: u32, population: usize) -> f64 {
    if population == 0 || rank == 0 {
        return 0.0;
    }
    let n = population as f64;
    (n - rank as f64 + 1.0) / n * 100.0
}

/// A student's rank movement between two results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankChange<'a> {
    pub student: &'a StudentResult,
    pub previous_rank: u32,
    pub current_rank: u32,
    /// Size of the movement; always non-negative. Zero for `maintained`.
    pub rank_change: u32,
}

/// Students partitioned by how their rank moved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankComparison<'a> {
    pub improved: Vec<RankChange<'a>>,
    pub declined: Vec<RankChange<'a>>,
    pub maintained: Vec<RankChange<'a>>,
}

/// Match students by roll number and compare their overall ranks. Students
/// present in only one result are left out. Buckets follow the current
/// result's rank order.
pub fn compare_with_previous_result<'a>(
    current: &'a ClassResult,
    previous: &ClassResult,
) -> RankComparison<'a> {
    let previous_ranks: HashMap<&StudentId, u32> = rank_by_percentage(previous.students())
        .into_iter()
        .map(|r| (r.student.roll_number(), r.rank))
        .collect();

    let mut comparison = RankComparison::default();
    for ranked in rank_by_percentage(current.students()) {
        let Some(&previous_rank) = previous_ranks.get(ranked.student.roll_number()) else {
            continue;
        };
        let delta = previous_rank as i64 - ranked.rank as i64;
        let change = RankChange {
            student: ranked.student,
            previous_rank,
            current_rank: ranked.rank,
            rank_change: delta.unsigned_abs() as u32,
        };
        match delta.cmp(&0) {
            Ordering::Greater => comparison.improved.push(change),
            Ordering::Less => comparison.declined.push(change),
            Ordering::Equal => comparison.maintained.push(change),
        }
    }
    comparison
}

/// A student whose rank barely moved across a series of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistentPerformer {
    pub roll_number: String,
    pub name: String,
    /// Rank in each result, in input order.
    pub ranks: Vec<u32>,
    /// Population variance of `ranks`, rounded to two decimals.
    pub variance: f64,
}

/// Students present in every result whose rank variance is at most
/// `variance_threshold`, most consistent first. Fewer than two results
/// yields nothing.
pub fn find_consistent_performers(
    results: &[ClassResult],
    variance_threshold: f64,
) -> Vec<ConsistentPerformer> {
    if results.len() < 2 {
        return Vec::new();
    }

    let rankings: Vec<HashMap<&StudentId, u32>> = results
        .iter()
        .map(|r| {
            rank_by_percentage(r.students())
                .into_iter()
                .map(|rs| (rs.student.roll_number(), rs.rank))
                .collect()
        })
        .collect();

    let mut performers: Vec<ConsistentPerformer> = rank_by_percentage(results[0].students())
        .into_iter()
        .filter_map(|first| {
            let id = first.student.roll_number();
            let ranks = rankings
                .iter()
                .map(|ranking| ranking.get(id).copied())
                .collect::<Option<Vec<u32>>>()?;
            let variance = rank_variance(&ranks);
            (variance <= variance_threshold).then(|| ConsistentPerformer {
                roll_number: id.to_string(),
                name: first.student.name().to_string(),
                ranks,
                variance: round2(variance),
            })
        })
        .collect();

    performers.sort_by(|a, b| a.variance.total_cmp(&b.variance));
    performers
}

fn rank_variance(ranks: &[u32]) -> f64 {
    if ranks.is_empty() {
        return 0.0;
    }
    let n = ranks.len() as f64;
    let mean = ranks.iter().map(|&r| r as f64).sum::<f64>() / n;
    ranks
        .iter()
        .map(|&r| (r as f64 - mean).powi(2))
        .sum::<f64>()
        / n
}

/// Student counts per quartile of the ranked population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankDistribution {
    pub top_quartile: usize,
    pub second_quartile: usize,
    pub third_quartile: usize,
    pub bottom_quartile: usize,
}

impl RankDistribution {
    pub fn total(&self) -> usize {
        self.top_quartile + self.second_quartile + self.third_quartile + self.bottom_quartile
    }
}

/// Split the class into four ceiling-sized quartile buckets, clamped so the
/// buckets never sum to more than the class size.
pub fn calculate_rank_distribution(result: &ClassResult) -> RankDistribution {
    let total = result.student_count();
    if total == 0 {
        return RankDistribution::default();
    }
    let size = total.div_ceil(4);
    let bucket = |filled: usize| size.min(total.saturating_sub(filled * size));
    RankDistribution {
        top_quartile: bucket(0),
        second_quartile: bucket(1),
        third_quartile: bucket(2),
        bottom_quartile: bucket(3),
    }
}
