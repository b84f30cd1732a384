use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::category::Category;
use super::directory::CourseDirectory;
use super::record::AcademicRecord;
use super::validation::Validation;

/// How the children of a composite (or the courses of a co-requisite) combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("&&"),
            Self::Or => f.write_str("||"),
        }
    }
}

/// A node of a parsed eligibility rule.
///
/// Trees are immutable once built and evaluate against any
/// [`AcademicRecord`] without side effects, so a single tree can be shared
/// across threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// The student has completed the course.
    Course(String),
    /// The student has NOT completed the course.
    CourseExclusion(String),
    /// The student is NOT enrolled in the program.
    ProgramExclusion(String),
    /// Each course is completed or being taken this term, combined by `logic`.
    CoReq { courses: Vec<String>, logic: Logic },
    /// At least `amount` units of credit completed within `category`.
    Uoc { amount: u32, category: Category },
    /// Advisory WAM threshold within `category`. Always satisfied.
    Wam { amount: u32, category: Category },
    /// A mark of at least `amount` in `course`.
    Grade { amount: u32, course: String },
    /// Enrolled in the program.
    Program(String),
    /// Enrolled in any program denoted by the program-type tag.
    ProgramType {
        tag: String,
        programs: BTreeSet<String>,
    },
    /// Enrolled in the specialisation.
    Specialisation(String),
    /// Children combined by `logic`. An empty composite is satisfied.
    Composite {
        conditions: Vec<Condition>,
        logic: Logic,
    },
}

impl Condition {
    pub fn course(code: impl Into<String>) -> Self {
        Self::Course(code.into())
    }

    pub fn uoc(amount: u32) -> Self {
        Self::Uoc {
            amount,
            category: Category::Any,
        }
    }

    pub fn uoc_in(amount: u32, category: Category) -> Self {
        Self::Uoc { amount, category }
    }

    pub fn wam(amount: u32) -> Self {
        Self::Wam {
            amount,
            category: Category::Any,
        }
    }

    pub fn wam_in(amount: u32, category: Category) -> Self {
        Self::Wam { amount, category }
    }

    pub fn grade(amount: u32, course: impl Into<String>) -> Self {
        Self::Grade {
            amount,
            course: course.into(),
        }
    }

    pub fn coreq<I, S>(logic: Logic, courses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::CoReq {
            courses: courses.into_iter().map(Into::into).collect(),
            logic,
        }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Self::Composite {
            conditions,
            logic: Logic::And,
        }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Self::Composite {
            conditions,
            logic: Logic::Or,
        }
    }

    /// Evaluate this condition for `record`.
    pub fn validate<R: AcademicRecord + ?Sized>(&self, record: &R) -> Validation {
        crate::evaluate::validate(self, record, None)
    }

    /// Like [`validate`](Self::validate), but school and faculty categories
    /// are resolved through `directory` when it is not empty.
    pub fn validate_with<R: AcademicRecord + ?Sized>(
        &self,
        record: &R,
        directory: &CourseDirectory,
    ) -> Validation {
        crate::evaluate::validate(self, record, Some(directory))
    }

    /// Every category referenced by a UOC or WAM condition in this tree.
    #[must_use]
    pub fn categories(&self) -> Vec<&Category> {
        let mut out = Vec::new();
        collect_categories(self, &mut out);
        out
    }

    /// Number of nodes in the tree, composites included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            Self::Composite { conditions, .. } => {
                1 + conditions.iter().map(Self::node_count).sum::<usize>()
            }
            _ => 1,
        }
    }
}

fn collect_categories<'a>(condition: &'a Condition, out: &mut Vec<&'a Category>) {
    match condition {
        Condition::Uoc { category, .. } | Condition::Wam { category, .. } => out.push(category),
        Condition::Composite { conditions, .. } => {
            for child in conditions {
                collect_categories(child, out);
            }
        }
        _ => {}
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Course(code) | Self::Program(code) | Self::Specialisation(code) => {
                f.write_str(code)
            }
            Self::CourseExclusion(code) | Self::ProgramExclusion(code) => write!(f, "!{code}"),
            Self::CoReq { courses, logic } => {
                write!(f, "[{}]", courses.join(&format!(" {logic} ")))
            }
            Self::Uoc { amount, category } if category.is_any() => write!(f, "{amount}UOC"),
            Self::Uoc { amount, category } => write!(f, "{amount}UOC in {category}"),
            Self::Wam { amount, category } if category.is_any() => write!(f, "{amount}WAM"),
            Self::Wam { amount, category } => write!(f, "{amount}WAM in {category}"),
            Self::Grade { amount, course } => write!(f, "{amount}GRADE in {course}"),
            Self::ProgramType { tag, .. } => f.write_str(tag),
            Self::Composite { conditions, logic } => {
                f.write_str("(")?;
                for (i, child) in conditions.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {logic} ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}
