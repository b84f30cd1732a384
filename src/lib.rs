//! Prerequisite-condition engine for university course planning.
//!
//! Rules arrive as pre-tokenized lists such as
//! `["(", "COMP1511", "&&", "18UOC", "in", "COMP", ")"]`. They are parsed
//! once into immutable [`Condition`] trees, collected in a [`ConditionSet`],
//! and evaluated against any number of [`Student`] records, yielding a
//! [`Validation`] with advisory warnings.
//!
//! ```
//! use prereq::{RuleData, ConditionSet, Student};
//!
//! let data = RuleData::new()
//!     .with_tokens("COMP2521", ["(", "COMP1511", "&&", "70WAM", ")"]);
//! let set = ConditionSet::build(&data);
//!
//! let student = Student::new().course("COMP1511", 6, Some(65));
//! let result = set.validate("COMP2521", &student).unwrap();
//! assert!(result.satisfied());
//! assert_eq!(
//!     result.warnings(),
//!     ["Requires 70 WAM. Your WAM is currently 65.000"]
//! );
//! ```

pub mod classify;
mod config;
mod error;
mod evaluate;
pub mod parse;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use config::{ExclusionMap, ProgramMappings, RuleData, RulePaths};
pub use error::PrereqError;
pub use parse::{ConditionParser, MAX_NESTING, ParseError, ParseErrorKind, create_condition};
pub use types::{
    AcademicRecord, Category, Condition, ConditionSet, ConfigError, CourseDirectory, CourseRecord,
    CourseState, Logic, Student, StudentData, UnlockedWhenTaken, Validation,
};
