//! The result aggregate: subjects, students, and their mark sheets.
//!
//! A `ClassResult` is built once per analysis run and never mutated
//! afterwards. Rankings are computed as separate views over it (see
//! [`crate::ranking`]), so nothing here carries a rank.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::config::GradeScale;
use crate::error::ValidationError;
use crate::values::{round2, Grade, Marks, Percentage};

/// A gradable topic, unique by name within a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Subject(String);

impl Subject {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptySubjectName);
        }
        Ok(Self(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identity of a student across independently built results.
///
/// Wraps the roll number. Surrounding whitespace is trimmed on construction;
/// matching is otherwise exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    pub fn new(roll_number: impl Into<String>) -> Result<Self, ValidationError> {
        let roll_number = roll_number.into().trim().to_string();
        if roll_number.is_empty() {
            return Err(ValidationError::EmptyRollNumber);
        }
        Ok(Self(roll_number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StudentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who a student is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub name: String,
    pub roll_number: StudentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl Student {
    pub fn new(name: impl Into<String>, roll_number: StudentId) -> Self {
        Self {
            name: name.into(),
            roll_number,
            section: None,
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}

/// One student's marks and the values derived from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentResult {
    student: Student,
    marks: BTreeMap<String, Marks>,
    total_marks: f64,
    max_marks: f64,
    percentage: Percentage,
}

impl StudentResult {
    /// Build a student result. `max_marks` is the per-subject maximum; the
    /// percentage is taken over the subjects the student actually has marks
    /// for.
    pub fn new(
        student: Student,
        marks: BTreeMap<String, Marks>,
        max_marks: f64,
    ) -> Result<Self, ValidationError> {
        if !max_marks.is_finite() || max_marks <= 0.0 {
            return Err(ValidationError::InvalidMaximum(max_marks));
        }
        if let Some(over) = marks.values().find(|m| m.value() > max_marks) {
            return Err(ValidationError::MarksAboveMaximum {
                value: over.value(),
                maximum: max_marks,
            });
        }
        let total_marks = round2(marks.values().map(Marks::value).sum());
        let percentage = Percentage::from_fraction(total_marks, marks.len() as f64 * max_marks);
        Ok(Self {
            student,
            marks,
            total_marks,
            max_marks,
            percentage,
        })
    }

    pub fn student(&self) -> &Student {
        &self.student
    }

    pub fn name(&self) -> &str {
        &self.student.name
    }

    pub fn roll_number(&self) -> &StudentId {
        &self.student.roll_number
    }

    pub fn marks(&self) -> &BTreeMap<String, Marks> {
        &self.marks
    }

    pub fn marks_for(&self, subject: &str) -> Option<Marks> {
        self.marks.get(subject).copied()
    }

    pub fn total_marks(&self) -> f64 {
        self.total_marks
    }

    pub fn max_marks(&self) -> f64 {
        self.max_marks
    }

    pub fn percentage(&self) -> Percentage {
        self.percentage
    }

    pub fn grade(&self, scale: &GradeScale) -> Grade {
        self.percentage.letter_grade(scale)
    }

    fn restricted_to(self, declared: &HashSet<&str>) -> Result<Self, ValidationError> {
        if self.marks.keys().all(|s| declared.contains(s.as_str())) {
            return Ok(self);
        }
        let (kept, dropped): (BTreeMap<_, _>, BTreeMap<_, _>) = self
            .marks
            .into_iter()
            .partition(|(subject, _)| declared.contains(subject.as_str()));
        tracing::debug!(
            "ignoring marks for undeclared subjects {:?} (roll number {})",
            dropped.keys().collect::<Vec<_>>(),
            self.student.roll_number
        );
        StudentResult::new(self.student, kept, self.max_marks)
    }
}

/// One analysis run: declared subjects plus every student's result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    subjects: Vec<Subject>,
    students: Vec<StudentResult>,
}

impl ClassResult {
    /// Assemble a result. Subject names and roll numbers must be unique;
    /// marks for subjects that are not declared are dropped.
    pub fn new(
        subjects: Vec<Subject>,
        students: Vec<StudentResult>,
    ) -> Result<Self, ValidationError> {
        let mut declared = HashSet::new();
        for subject in &subjects {
            if !declared.insert(subject.name()) {
                return Err(ValidationError::DuplicateSubject(subject.name().to_string()));
            }
        }

        let mut seen = HashSet::new();
        for s in &students {
            if !seen.insert(s.roll_number().as_str()) {
                return Err(ValidationError::DuplicateRollNumber(
                    s.roll_number().to_string(),
                ));
            }
        }

        let students = students
            .into_iter()
            .map(|s| s.restricted_to(&declared))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            label: None,
            subjects,
            students,
        })
    }

    /// Attach a display label such as "Term 1".
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn students(&self) -> &[StudentResult] {
        &self.students
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn find_student(&self, roll_number: &str) -> Option<&StudentResult> {
        self.students
            .iter()
            .find(|s| s.roll_number().as_str() == roll_number)
    }

    /// Mean overall percentage, or 0 for an empty result.
    pub fn class_average(&self) -> f64 {
        if self.students.is_empty() {
            return 0.0;
        }
        self.students
            .iter()
            .map(|s| s.percentage().value())
            .sum::<f64>()
            / self.students.len() as f64
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build a result where every student has one mark per listed subject.
    pub fn class(subjects: &[&str], rows: &[(&str, &str, &[f64])]) -> ClassResult {
        let subject_list = subjects
            .iter()
            .map(|s| Subject::new(*s).unwrap())
            .collect::<Vec<_>>();
        let students = rows
            .iter()
            .map(|(name, roll, marks)| {
                let sheet = subjects
                    .iter()
                    .zip(marks.iter())
                    .map(|(s, m)| (s.to_string(), Marks::new(*m).unwrap()))
                    .collect();
                StudentResult::new(
                    Student::new(*name, StudentId::new(*roll).unwrap()),
                    sheet,
                    100.0,
                )
                .unwrap()
            })
            .collect();
        ClassResult::new(subject_list, students).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks(pairs: &[(&str, f64)]) -> BTreeMap<String, Marks> {
        pairs
            .iter()
            .map(|(s, m)| (s.to_string(), Marks::new(*m).unwrap()))
            .collect()
    }

    fn student(roll: &str) -> Student {
        Student::new(format!("Student {roll}"), StudentId::new(roll).unwrap())
    }

    #[test]
    fn student_id_is_trimmed_and_case_sensitive() {
        assert_eq!(StudentId::new("  042 ").unwrap().as_str(), "042");
        assert_ne!(StudentId::new("a1").unwrap(), StudentId::new("A1").unwrap());
        assert_eq!(StudentId::new("   "), Err(ValidationError::EmptyRollNumber));
    }

    #[test]
    fn subject_rejects_blank_name() {
        assert_eq!(Subject::new(" "), Err(ValidationError::EmptySubjectName));
        assert_eq!(Subject::new(" Math ").unwrap().name(), "Math");
    }

    #[test]
    fn student_result_derives_totals() {
        let sr = StudentResult::new(
            student("1"),
            marks(&[("Math", 90.0), ("Science", 80.0), ("English", 70.0)]),
            100.0,
        )
        .unwrap();
        assert_eq!(sr.total_marks(), 240.0);
        assert_eq!(sr.percentage().value(), 80.0);
        assert_eq!(sr.grade(&GradeScale::default()), Grade::A);
    }

    #[test]
    fn student_result_without_marks_is_zero() {
        let sr = StudentResult::new(student("1"), BTreeMap::new(), 100.0).unwrap();
        assert_eq!(sr.total_marks(), 0.0);
        assert_eq!(sr.percentage(), Percentage::zero());
    }

    #[test]
    fn student_result_rejects_marks_above_maximum() {
        let err = StudentResult::new(student("1"), marks(&[("Math", 55.0)]), 50.0).unwrap_err();
        assert!(matches!(err, ValidationError::MarksAboveMaximum { .. }));
    }

    #[test]
    fn class_result_rejects_duplicates() {
        let subjects = vec![Subject::new("Math").unwrap(), Subject::new("Math").unwrap()];
        assert_eq!(
            ClassResult::new(subjects, vec![]),
            Err(ValidationError::DuplicateSubject("Math".into()))
        );

        let subjects = vec![Subject::new("Math").unwrap()];
        let a = StudentResult::new(student("7"), marks(&[("Math", 50.0)]), 100.0).unwrap();
        let b = StudentResult::new(student("7"), marks(&[("Math", 60.0)]), 100.0).unwrap();
        assert_eq!(
            ClassResult::new(subjects, vec![a, b]),
            Err(ValidationError::DuplicateRollNumber("7".into()))
        );
    }

    #[test]
    fn class_result_drops_undeclared_subjects() {
        let subjects = vec![Subject::new("Math").unwrap()];
        let sr = StudentResult::new(
            student("1"),
            marks(&[("Math", 80.0), ("Art", 20.0)]),
            100.0,
        )
        .unwrap();
        assert_eq!(sr.percentage().value(), 50.0);

        let result = ClassResult::new(subjects, vec![sr]).unwrap();
        let kept = &result.students()[0];
        assert!(kept.marks_for("Art").is_none());
        assert_eq!(kept.total_marks(), 80.0);
        assert_eq!(kept.percentage().value(), 80.0);
    }

    #[test]
    fn class_average_of_empty_result_is_zero() {
        let result = ClassResult::new(vec![], vec![]).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.class_average(), 0.0);
    }

    #[test]
    fn find_student_by_roll_number() {
        let result = fixtures::class(
            &["Math"],
            &[("Asha", "001", &[70.0]), ("Ben", "002", &[60.0])],
        );
        assert_eq!(result.find_student("002").unwrap().name(), "Ben");
        assert!(result.find_student("003").is_none());
        assert_eq!(result.class_average(), 65.0);
    }
}
