use std::fmt;

use serde::{Deserialize, Serialize};

use super::directory::CourseDirectory;

/// The scope a UOC or WAM requirement is restricted to.
///
/// Written after the `in` keyword in a rule, e.g. `24UOC in COMP` or
/// `12UOC in L2 MATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Every course.
    #[default]
    Any,
    /// Courses whose code starts with a four-letter prefix, e.g. `COMP`.
    CoursePrefix(String),
    /// Courses at a level, i.e. whose first digit is `n`.
    Level(u8),
    /// Courses at a level with a given prefix, e.g. `L2 MATH`.
    LevelCoursePrefix { level: u8, prefix: String },
    /// Courses offered by a school. Resolved through a [`CourseDirectory`].
    School(String),
    /// Courses offered by a faculty. Resolved through a [`CourseDirectory`].
    Faculty(String),
}

impl Category {
    /// Whether `course` falls inside this category.
    ///
    /// School and faculty membership is looked up in `directory`; a course the
    /// directory does not know never matches.
    #[must_use]
    pub fn matches(&self, course: &str, directory: &CourseDirectory) -> bool {
        match self {
            Self::Any => true,
            Self::CoursePrefix(prefix) => has_prefix(course, prefix),
            Self::Level(level) => level_of(course) == Some(*level),
            Self::LevelCoursePrefix { level, prefix } => {
                level_of(course) == Some(*level) && has_prefix(course, prefix)
            }
            Self::School(name) => directory
                .school_of(course)
                .is_some_and(|school| school.eq_ignore_ascii_case(name)),
            Self::Faculty(name) => directory
                .faculty_of(course)
                .is_some_and(|faculty| faculty.eq_ignore_ascii_case(name)),
        }
    }

    /// Whether matching this category needs school or faculty reference data.
    #[must_use]
    pub fn needs_directory(&self) -> bool {
        matches!(self, Self::School(_) | Self::Faculty(_))
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

fn has_prefix(course: &str, prefix: &str) -> bool {
    course
        .get(..4)
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn level_of(course: &str) -> Option<u8> {
    course
        .chars()
        .find(char::is_ascii_digit)
        .and_then(|c| c.to_digit(10))
        .and_then(|d| u8::try_from(d).ok())
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any course"),
            Self::CoursePrefix(prefix) => f.write_str(prefix),
            Self::Level(level) => write!(f, "L{level}"),
            Self::LevelCoursePrefix { level, prefix } => write!(f, "L{level} {prefix}"),
            Self::School(name) | Self::Faculty(name) => f.write_str(name),
        }
    }
}
