use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of validating a condition against a student: whether it is
/// satisfied, plus any advisory warnings.
///
/// Warnings are informational and independent of `satisfied`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Validation {
    satisfied: bool,
    warnings: Vec<String>,
}

impl Validation {
    pub fn new(satisfied: bool, warnings: Vec<String>) -> Self {
        Self {
            satisfied,
            warnings,
        }
    }

    /// Satisfied, no warnings.
    pub fn pass() -> Self {
        Self::new(true, Vec::new())
    }

    /// Unsatisfied, no warnings.
    pub fn fail() -> Self {
        Self::new(false, Vec::new())
    }

    pub fn from_bool(satisfied: bool) -> Self {
        Self::new(satisfied, Vec::new())
    }

    #[must_use]
    pub fn satisfied(&self) -> bool {
        self.satisfied
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    #[must_use]
    pub fn into_parts(self) -> (bool, Vec<String>) {
        (self.satisfied, self.warnings)
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "satisfied = {}", self.satisfied)?;
        if !self.warnings.is_empty() {
            write!(f, ", warnings: [{}]", self.warnings.join("; "))?;
        }
        Ok(())
    }
}
