//! Immutable numeric value types: marks, percentages, and letter grades.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::GradeScale;
use crate::error::ValidationError;

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A validated score for one (student, subject) pair.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Marks(f64);

impl Marks {
    /// Build a mark from a raw value. Fails on negative or non-finite input.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteMarks);
        }
        if value < 0.0 {
            return Err(ValidationError::NegativeMarks(value));
        }
        Ok(Self(value))
    }

    /// Build a mark that must also not exceed `maximum`.
    pub fn with_maximum(value: f64, maximum: f64) -> Result<Self, ValidationError> {
        if !maximum.is_finite() || maximum <= 0.0 {
            return Err(ValidationError::InvalidMaximum(maximum));
        }
        let marks = Self::new(value)?;
        if value > maximum {
            return Err(ValidationError::MarksAboveMaximum { value, maximum });
        }
        Ok(marks)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl FromStr for Marks {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: f64 = trimmed
            .parse()
            .map_err(|_| ValidationError::NonNumericMarks(trimmed.to_string()))?;
        Marks::new(value)
    }
}

impl fmt::Display for Marks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value in [0, 100], rounded to two decimals when derived from a fraction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(f64);

impl Percentage {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(ValidationError::PercentageOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn zero() -> Self {
        Self(0.0)
    }

    /// `numerator / denominator × 100`, rounded to two decimals and clamped
    /// to [0, 100]. A zero (or negative) denominator yields zero.
    pub fn from_fraction(numerator: f64, denominator: f64) -> Self {
        if denominator <= 0.0 || !denominator.is_finite() || !numerator.is_finite() {
            return Self::zero();
        }
        Self(round2(numerator / denominator * 100.0).clamp(0.0, 100.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Letter grade under the given scale.
    pub fn letter_grade(&self, scale: &GradeScale) -> Grade {
        scale.grade_for(self.0)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

/// Letter grades, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// All grades in descending order.
    pub const ALL: [Grade; 6] = [Grade::APlus, Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    /// A or A+.
    pub fn is_top_grade(&self) -> bool {
        matches!(self, Grade::APlus | Grade::A)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::APlus => write!(f, "A+"),
            Grade::A => write!(f, "A"),
            Grade::B => write!(f, "B"),
            Grade::C => write!(f, "C"),
            Grade::D => write!(f, "D"),
            Grade::F => write!(f, "F"),
        }
    }
}
