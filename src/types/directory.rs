use std::collections::HashMap;

use serde::Deserialize;

use super::error::ConfigError;

/// Reference data mapping course codes to the school and faculty that offer
/// them. Needed only by [`Category::School`](super::Category::School) and
/// [`Category::Faculty`](super::Category::Faculty).
///
/// Course codes are stored and looked up upper-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseDirectory {
    schools: HashMap<String, String>,
    faculties: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawDirectory {
    #[serde(default)]
    schools: HashMap<String, String>,
    #[serde(default)]
    faculties: HashMap<String, String>,
}

impl CourseDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_school(mut self, course: &str, school: impl Into<String>) -> Self {
        self.schools
            .insert(course.to_ascii_uppercase(), school.into());
        self
    }

    #[must_use]
    pub fn with_faculty(mut self, course: &str, faculty: impl Into<String>) -> Self {
        self.faculties
            .insert(course.to_ascii_uppercase(), faculty.into());
        self
    }

    #[must_use]
    pub fn school_of(&self, course: &str) -> Option<&str> {
        self.schools
            .get(&course.to_ascii_uppercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn faculty_of(&self, course: &str) -> Option<&str> {
        self.faculties
            .get(&course.to_ascii_uppercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schools.is_empty() && self.faculties.is_empty()
    }

    /// Parse a directory from JSON of the form
    /// `{"schools": {"COMP1511": "S CSE"}, "faculties": {...}}`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the input is not valid.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let raw: RawDirectory =
            serde_json::from_str(input).map_err(|source| ConfigError::Json {
                what: "course directory",
                source,
            })?;
        let mut directory = Self::new();
        for (course, school) in raw.schools {
            directory = directory.with_school(&course, school);
        }
        for (course, faculty) in raw.faculties {
            directory = directory.with_faculty(&course, faculty);
        }
        Ok(directory)
    }

    /// Read a directory from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on I/O or JSON failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&input)
    }
}
