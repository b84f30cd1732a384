mod category;
mod condition;
mod condition_set;
mod directory;
mod error;
mod record;
mod student;
mod validation;

pub use category::Category;
pub use condition::{Condition, Logic};
pub use condition_set::{ConditionSet, CourseState, UnlockedWhenTaken};
pub use directory::CourseDirectory;
pub use error::ConfigError;
pub use record::AcademicRecord;
pub use student::{CourseRecord, Student, StudentData};
pub use validation::Validation;
