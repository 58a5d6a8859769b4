//! Mark-sheet loader.
//!
//! Reads already-normalized mark sheets (subjects plus per-student marks)
//! from TOML or JSON and turns them into a [`ClassResult`]. Column mapping of
//! raw spreadsheets happens upstream; this only accepts the normalized shape.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::{ClassResult, Student, StudentId, StudentResult, Subject};
use crate::values::Marks;

/// On-disk representation of a mark sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetFile {
    pub sheet: SheetHeader,
    #[serde(default)]
    pub students: Vec<SheetStudent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetHeader {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_max_marks")]
    pub max_marks: f64,
    #[serde(default)]
    pub subjects: Vec<String>,
}

fn default_max_marks() -> f64 {
    100.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetStudent {
    pub name: String,
    pub roll_number: RawText,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub marks: BTreeMap<String, RawMark>,
}

/// A roll number written either as text or as a bare integer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawText {
    Text(String),
    Number(i64),
}

impl RawText {
    fn as_string(&self) -> String {
        match self {
            RawText::Text(s) => s.clone(),
            RawText::Number(n) => n.to_string(),
        }
    }
}

/// A mark as it appears in the file: a number, or text that should hold one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawMark {
    Number(f64),
    Text(String),
}

impl RawMark {
    fn to_marks(&self, maximum: f64) -> Result<Marks, ValidationError> {
        let marks = match self {
            RawMark::Number(n) => Marks::new(*n)?,
            RawMark::Text(s) => s.parse::<Marks>()?,
        };
        Marks::with_maximum(marks.value(), maximum)
    }
}

/// File formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Toml,
    Json,
}

impl SheetFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(SheetFormat::Toml),
            "json" => Some(SheetFormat::Json),
            _ => None,
        }
    }
}

impl SheetFile {
    /// Build the result aggregate, failing on the first invalid value.
    pub fn into_result(self, fallback_label: Option<&str>) -> Result<ClassResult> {
        let max_marks = self.sheet.max_marks;
        let subjects = self
            .sheet
            .subjects
            .iter()
            .map(|s| Subject::new(s.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let students = self
            .students
            .into_iter()
            .map(|s| {
                let roll = s.roll_number.as_string();
                let id = StudentId::new(roll.as_str())
                    .with_context(|| format!("student '{}'", s.name))?;
                let marks = s
                    .marks
                    .iter()
                    .map(|(subject, raw)| {
                        raw.to_marks(max_marks)
                            .map(|m| (subject.clone(), m))
                            .with_context(|| format!("student {roll}: invalid marks for {subject}"))
                    })
                    .collect::<Result<BTreeMap<_, _>>>()?;
                let student = match s.section {
                    Some(section) => Student::new(s.name, id).with_section(section),
                    None => Student::new(s.name, id),
                };
                Ok(StudentResult::new(student, marks, max_marks)?)
            })
            .collect::<Result<Vec<_>>>()?;

        let result = ClassResult::new(subjects, students)?;
        Ok(match self.sheet.title.as_deref().or(fallback_label) {
            Some(label) => result.with_label(label),
            None => result,
        })
    }
}

/// Read a sheet file without building the result.
pub fn read_sheet_file(path: &Path) -> Result<SheetFile> {
    let format = SheetFormat::from_path(path).with_context(|| {
        format!(
            "unsupported sheet format (expected .toml or .json): {}",
            path.display()
        )
    })?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read sheet: {}", path.display()))?;
    parse_sheet_str(&content, format)
        .with_context(|| format!("failed to parse sheet: {}", path.display()))
}

/// Parse sheet content in the given format (useful for testing).
pub fn parse_sheet_str(content: &str, format: SheetFormat) -> Result<SheetFile> {
    Ok(match format {
        SheetFormat::Toml => toml::from_str(content)?,
        SheetFormat::Json => serde_json::from_str(content)?,
    })
}

/// Load a sheet and build its result. The file stem labels sheets without a
/// title.
pub fn load_sheet(path: &Path) -> Result<ClassResult> {
    let stem = path.file_stem().and_then(|s| s.to_str());
    read_sheet_file(path)?
        .into_result(stem)
        .with_context(|| format!("invalid sheet: {}", path.display()))
}

/// Recursively read every `.toml`/`.json` sheet under `dir`, sorted by path.
/// Files that fail to parse are skipped with a warning.
pub fn read_sheet_directory(dir: &Path) -> Result<Vec<(PathBuf, SheetFile)>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    collect_sheet_paths(dir, &mut paths)?;
    paths.sort();

    let mut sheets = Vec::new();
    for path in paths {
        match read_sheet_file(&path) {
            Ok(sheet) => sheets.push((path, sheet)),
            Err(e) => tracing::warn!("skipping {}: {:#}", path.display(), e),
        }
    }
    Ok(sheets)
}

fn collect_sheet_paths(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            collect_sheet_paths(&path, out)?;
        } else if SheetFormat::from_path(&path).is_some() {
            out.push(path);
        }
    }
    Ok(())
}

/// A non-fatal issue found in a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetWarning {
    /// The student's roll number (if applicable).
    pub roll_number: Option<String>,
    pub message: String,
}

/// Check a sheet for issues that do not stop it from loading.
pub fn validate_sheet(sheet: &SheetFile) -> Vec<SheetWarning> {
    let mut warnings = Vec::new();

    if sheet.sheet.subjects.is_empty() {
        warnings.push(SheetWarning {
            roll_number: None,
            message: "no subjects declared".into(),
        });
    }
    if sheet.students.is_empty() {
        warnings.push(SheetWarning {
            roll_number: None,
            message: "no students listed".into(),
        });
    }

    let declared: HashSet<&str> = sheet.sheet.subjects.iter().map(|s| s.trim()).collect();
    for student in &sheet.students {
        let roll = student.roll_number.as_string();

        let missing: Vec<&str> = sheet
            .sheet
            .subjects
            .iter()
            .map(|s| s.trim())
            .filter(|s| !student.marks.contains_key(*s))
            .collect();
        if !missing.is_empty() {
            warnings.push(SheetWarning {
                roll_number: Some(roll.clone()),
                message: format!("missing marks for {}", missing.join(", ")),
            });
        }

        for subject in student.marks.keys() {
            if !declared.contains(subject.as_str()) {
                warnings.push(SheetWarning {
                    roll_number: Some(roll.clone()),
                    message: format!("marks for undeclared subject '{subject}' will be ignored"),
                });
            }
        }
    }

    warnings
}
