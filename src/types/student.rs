use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::category::Category;
use super::directory::CourseDirectory;
use super::error::ConfigError;
use super::record::AcademicRecord;

/// A completed (or planned) course on a student's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub uoc: u32,
    pub mark: Option<u32>,
}

/// A student's academic record, built per evaluation request.
///
/// Course, program and specialisation codes are stored upper-cased so that
/// lookups ignore case.
#[derive(Debug, Clone, Default)]
pub struct Student {
    program: Option<String>,
    specialisations: BTreeSet<String>,
    courses: BTreeMap<String, CourseRecord>,
    in_progress: BTreeSet<String>,
    wam: Option<f64>,
    directory: Arc<CourseDirectory>,
}

/// Wire shape of a student record as supplied by the surrounding system.
///
/// ```json
/// {"program": "3778", "specialisations": ["COMPA1"],
///  "courses": {"COMP1511": [6, 85], "MATH1131": [6, null]}}
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentData {
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub specialisations: Vec<String>,
    #[serde(default)]
    pub courses: BTreeMap<String, (u32, Option<u32>)>,
    #[serde(default)]
    pub in_progress: Vec<String>,
    #[serde(default)]
    pub wam: Option<f64>,
}

impl Student {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a [`StudentData`] JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the input is not valid.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let data: StudentData =
            serde_json::from_str(input).map_err(|source| ConfigError::Json {
                what: "student",
                source,
            })?;
        Ok(Self::from(data))
    }

    /// School/faculty reference data used for category matching.
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<CourseDirectory>) -> Self {
        self.directory = directory;
        self
    }

    #[must_use]
    pub fn program(mut self, program: &str) -> Self {
        self.program = Some(program.to_ascii_uppercase());
        self
    }

    #[must_use]
    pub fn specialisation(mut self, specialisation: &str) -> Self {
        self.specialisations
            .insert(specialisation.to_ascii_uppercase());
        self
    }

    /// Record a completed course with its units of credit and optional mark.
    #[must_use]
    pub fn course(mut self, code: &str, uoc: u32, mark: Option<u32>) -> Self {
        self.add_course(code, CourseRecord { uoc, mark });
        self
    }

    /// Record a course being taken in the current term.
    #[must_use]
    pub fn taking(mut self, code: &str) -> Self {
        self.in_progress.insert(code.to_ascii_uppercase());
        self
    }

    /// Override the overall WAM instead of deriving it from recorded marks.
    #[must_use]
    pub fn with_wam(mut self, wam: f64) -> Self {
        self.wam = Some(wam);
        self
    }

    /// Add a course (mutable reference version).
    pub fn add_course(&mut self, code: &str, record: CourseRecord) {
        self.courses.insert(code.to_ascii_uppercase(), record);
    }

    pub fn remove_course(&mut self, code: &str) -> Option<CourseRecord> {
        self.courses.remove(&code.to_ascii_uppercase())
    }

    /// Completed courses in code order.
    pub fn courses(&self) -> impl Iterator<Item = (&str, &CourseRecord)> {
        self.courses.iter().map(|(code, rec)| (code.as_str(), rec))
    }

    #[must_use]
    pub fn program_code(&self) -> Option<&str> {
        self.program.as_deref()
    }

    fn matching<'a>(
        &'a self,
        category: &'a Category,
        directory: &'a CourseDirectory,
    ) -> impl Iterator<Item = &'a CourseRecord> + 'a {
        self.courses
            .iter()
            .filter(move |(code, _)| category.matches(code, directory))
            .map(|(_, rec)| rec)
    }
}

impl From<StudentData> for Student {
    fn from(data: StudentData) -> Self {
        let mut student = Self {
            program: data.program.map(|p| p.to_ascii_uppercase()),
            wam: data.wam,
            ..Self::default()
        };
        for spec in &data.specialisations {
            student.specialisations.insert(spec.to_ascii_uppercase());
        }
        for (code, (uoc, mark)) in &data.courses {
            student.add_course(code, CourseRecord { uoc: *uoc, mark: *mark });
        }
        for code in &data.in_progress {
            student.in_progress.insert(code.to_ascii_uppercase());
        }
        student
    }
}

impl AcademicRecord for Student {
    fn has_taken(&self, course: &str) -> bool {
        self.courses.contains_key(&course.to_ascii_uppercase())
    }

    fn is_taking(&self, course: &str) -> bool {
        self.in_progress.contains(&course.to_ascii_uppercase())
    }

    fn in_program(&self, program: &str) -> bool {
        self.program
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case(program))
    }

    fn in_specialisation(&self, specialisation: &str) -> bool {
        self.specialisations
            .contains(&specialisation.to_ascii_uppercase())
    }

    fn uoc(&self, category: &Category) -> u32 {
        self.uoc_with(category, &self.directory)
    }

    fn wam(&self, category: &Category) -> Option<f64> {
        self.wam_with(category, &self.directory)
    }

    /// Saturates at `u32::MAX` rather than overflowing.
    fn uoc_with(&self, category: &Category, directory: &CourseDirectory) -> u32 {
        self.matching(category, directory)
            .fold(0_u32, |total, rec| total.saturating_add(rec.uoc))
    }

    /// The explicit WAM for [`Category::Any`] if one was set, otherwise the
    /// UOC-weighted mean of recorded marks in the category.
    fn wam_with(&self, category: &Category, directory: &CourseDirectory) -> Option<f64> {
        if category.is_any()
            && let Some(wam) = self.wam
        {
            return Some(wam);
        }
        let (weighted, uoc) = self
            .matching(category, directory)
            .filter_map(|rec| rec.mark.map(|mark| (mark, rec.uoc)))
            .fold((0_u64, 0_u64), |(sum, total), (mark, uoc)| {
                (
                    sum + u64::from(mark) * u64::from(uoc),
                    total + u64::from(uoc),
                )
            });
        if uoc == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)] // marks and UOC totals are small
        let wam = weighted as f64 / uoc as f64;
        Some(wam)
    }

    fn grade(&self, course: &str) -> Option<u32> {
        self.courses
            .get(&course.to_ascii_uppercase())
            .and_then(|rec| rec.mark)
    }

    fn has_directory(&self) -> bool {
        !self.directory.is_empty()
    }
}
