use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::directory::CourseDirectory;
use super::error::ConfigError;
use super::record::AcademicRecord;
use super::student::{CourseRecord, Student};
use super::validation::Validation;
use crate::config::{RuleData, RulePaths};
use crate::parse::{ConditionParser, ParseError};

/// Whether a course can be taken, as reported to the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseState {
    /// `false` when the course had no usable condition and `unlocked` is an
    /// assumption rather than a result.
    pub is_accurate: bool,
    pub unlocked: bool,
    pub warnings: Vec<String>,
}

/// Courses that become available once a given course is added to a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedWhenTaken {
    /// Newly unlocked courses that list the taken course on their path.
    pub direct: Vec<String>,
    pub indirect: Vec<String>,
}

/// Parsed condition trees for every course with a rule.
///
/// A course maps to `None` when its rule failed to parse; the error is kept
/// in [`parse_failures`](Self::parse_failures). Immutable after build and
/// meant to be shared behind `Arc`.
///
/// Course codes are stored and looked up upper-cased. The course directory
/// attached by [`load`](Self::load) or [`with_directory`](Self::with_directory)
/// resolves school and faculty categories for every record evaluated here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionSet {
    pub(crate) conditions: BTreeMap<String, Option<Condition>>,
    pub(crate) failures: BTreeMap<String, ParseError>,
    #[serde(skip)]
    pub(crate) directory: Option<Arc<CourseDirectory>>,
}

impl ConditionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every rule in `data`. A rule that fails to parse is recorded and
    /// does not affect any other course.
    #[must_use]
    pub fn build(data: &RuleData) -> Self {
        let parser = ConditionParser::new(data);
        let mut set = Self::new();

        for (course, tokens) in &data.tokens {
            let code = course.to_ascii_uppercase();
            match parser.create_condition(tokens, Some(course.as_str())) {
                Ok(condition) => {
                    set.conditions.insert(code, Some(condition));
                }
                Err(err) => {
                    tracing::debug!(
                        course = %course,
                        position = err.position,
                        reason = %err.kind,
                        "failed to parse condition"
                    );
                    set.conditions.insert(code.clone(), None);
                    set.failures.insert(code, err);
                }
            }
        }

        tracing::info!(
            parsed = set.conditions.len() - set.failures.len(),
            failed = set.failures.len(),
            "built condition set"
        );
        set
    }

    /// Load rule data from disk and build the set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any of the rule data files cannot be read
    /// or parsed.
    pub fn from_files(paths: &RulePaths) -> Result<Self, ConfigError> {
        let data = RuleData::from_files(paths)?;
        Ok(Self::build(&data))
    }

    /// Load rule data, build the set and check that `directory` covers any
    /// school or faculty categories it uses. The directory is kept and used
    /// when evaluating.
    ///
    /// # Errors
    ///
    /// Returns [`PrereqError`](crate::PrereqError) on I/O, JSON, or missing
    /// lookup data.
    pub fn load(
        paths: &RulePaths,
        directory: impl Into<Arc<CourseDirectory>>,
    ) -> Result<Self, crate::PrereqError> {
        let directory = directory.into();
        let set = Self::from_files(paths)?;
        set.check_directory(&directory)?;
        Ok(set.with_directory(directory))
    }

    /// Attach school/faculty reference data used for every evaluation.
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<CourseDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    #[must_use]
    pub fn directory(&self) -> Option<&CourseDirectory> {
        self.directory.as_deref()
    }

    /// Add or replace the condition for a course.
    pub fn insert(&mut self, course: &str, condition: Option<Condition>) {
        let code = course.to_ascii_uppercase();
        self.failures.remove(&code);
        self.conditions.insert(code, condition);
    }

    /// The parsed tree for `course`, if it has one.
    #[must_use]
    pub fn get(&self, course: &str) -> Option<&Condition> {
        self.conditions
            .get(&course.to_ascii_uppercase())
            .and_then(Option::as_ref)
    }

    #[must_use]
    pub fn contains(&self, course: &str) -> bool {
        self.conditions.contains_key(&course.to_ascii_uppercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Every known course in code order.
    pub fn courses(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    #[must_use]
    pub fn parse_failures(&self) -> &BTreeMap<String, ParseError> {
        &self.failures
    }

    /// Ensure school and faculty categories have lookup data.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCategoryLookup`] for the first course
    /// whose tree uses such a category while `directory` is empty.
    pub fn check_directory(&self, directory: &CourseDirectory) -> Result<(), ConfigError> {
        if !directory.is_empty() {
            return Ok(());
        }
        for (course, condition) in &self.conditions {
            let Some(condition) = condition else { continue };
            if let Some(category) = condition
                .categories()
                .into_iter()
                .find(|c| c.needs_directory())
            {
                return Err(ConfigError::MissingCategoryLookup {
                    course: course.clone(),
                    category: category.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Evaluate the condition for `course`. `None` means the course has no
    /// usable condition.
    #[must_use]
    pub fn validate<R: AcademicRecord + ?Sized>(
        &self,
        course: &str,
        record: &R,
    ) -> Option<Validation> {
        let condition = self.get(course)?;
        Some(match self.directory() {
            Some(directory) => condition.validate_with(record, directory),
            None => condition.validate(record),
        })
    }

    /// A course without a usable condition is reported unlocked but not
    /// accurate.
    #[must_use]
    pub fn course_state<R: AcademicRecord + ?Sized>(&self, course: &str, record: &R) -> CourseState {
        match self.validate(course, record) {
            Some(validation) => {
                let (unlocked, warnings) = validation.into_parts();
                CourseState {
                    is_accurate: true,
                    unlocked,
                    warnings,
                }
            }
            None => CourseState {
                is_accurate: false,
                unlocked: true,
                warnings: Vec::new(),
            },
        }
    }

    /// State of every course the student can currently take.
    #[must_use]
    pub fn all_unlocked<R: AcademicRecord + ?Sized>(
        &self,
        record: &R,
    ) -> BTreeMap<String, CourseState> {
        self.courses()
            .map(|course| (course, self.course_state(course, record)))
            .filter(|(_, state)| state.unlocked)
            .map(|(course, state)| (course.to_owned(), state))
            .collect()
    }

    /// Courses unlocked by adding `course` (worth `uoc` units of credit) to
    /// the student's record, split by whether they appear in `path_to`.
    #[must_use]
    pub fn unlocked_when_taken<S: AsRef<str>>(
        &self,
        student: &Student,
        course: &str,
        uoc: u32,
        path_to: &[S],
    ) -> UnlockedWhenTaken {
        let before = self.unlocked_set(student);
        let mut after_student = student.clone();
        after_student.add_course(course, CourseRecord { uoc, mark: None });
        let after = self.unlocked_set(&after_student);

        let path_to: BTreeSet<String> = path_to
            .iter()
            .map(|code| code.as_ref().to_ascii_uppercase())
            .collect();
        let (direct, indirect) = after
            .difference(&before)
            .map(|code| (*code).to_owned())
            .partition(|code| path_to.contains(code));

        UnlockedWhenTaken { direct, indirect }
    }

    /// Remove `course` from the student's plan, then repeatedly remove every
    /// other planned course whose condition held before and no longer does.
    /// Courses in `locked` are never removed.
    ///
    /// Returns the removed courses in code order, not including `course`.
    #[must_use]
    pub fn unselect_course<S: AsRef<str>>(
        &self,
        student: &Student,
        locked: &[S],
        course: &str,
    ) -> Vec<String> {
        let locked: BTreeSet<String> = locked
            .iter()
            .map(|code| code.as_ref().to_ascii_uppercase())
            .collect();
        let unselected = course.to_ascii_uppercase();

        let mut candidates: BTreeSet<String> = student
            .courses()
            .map(|(code, _)| code)
            .filter(|code| *code != unselected && !locked.contains(*code))
            .filter(|code| self.is_met(code, student))
            .map(str::to_owned)
            .collect();

        let mut plan = student.clone();
        plan.remove_course(&unselected);
        let mut affected = Vec::new();

        loop {
            let broken: Vec<String> = candidates
                .iter()
                .filter(|code| !self.is_met(code, &plan))
                .cloned()
                .collect();
            if broken.is_empty() {
                break;
            }
            for code in broken {
                plan.remove_course(&code);
                candidates.remove(&code);
                affected.push(code);
            }
        }

        affected.sort();
        affected
    }

    fn is_met(&self, course: &str, record: &Student) -> bool {
        self.validate(course, record)
            .is_none_or(|validation| validation.satisfied())
    }

    fn unlocked_set<R: AcademicRecord + ?Sized>(&self, record: &R) -> BTreeSet<&str> {
        self.courses()
            .filter(|course| self.course_state(course, record).unlocked)
            .collect()
    }
}

#[cfg(feature = "binary-cache")]
impl ConditionSet {
    /// Serialize this set to a byte vector.
    ///
    /// The optional `source_text` (typically the condition tokens JSON) is
    /// hashed with BLAKE3 and stored so callers can tell when the cache is
    /// stale.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize a set previously produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for ConditionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConditionSet({} courses, {} failed)",
            self.conditions.len(),
            self.failures.len(),
        )
    }
}
