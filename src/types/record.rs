use super::category::Category;
use super::directory::CourseDirectory;

/// The queries a condition may ask about a student.
///
/// [`Student`](super::Student) is the bundled implementation; callers with
/// their own storage representation can implement this directly.
pub trait AcademicRecord {
    /// Has the student completed `course`?
    fn has_taken(&self, course: &str) -> bool;

    /// Is the student taking `course` in the current term?
    fn is_taking(&self, course: &str) -> bool;

    fn in_program(&self, program: &str) -> bool;

    fn in_specialisation(&self, specialisation: &str) -> bool;

    /// Units of credit completed within `category`.
    fn uoc(&self, category: &Category) -> u32;

    /// WAM within `category`, or `None` if it is not known.
    fn wam(&self, category: &Category) -> Option<f64>;

    /// Recorded mark for a completed course.
    fn grade(&self, course: &str) -> Option<u32>;

    /// Units of credit within `category`, resolving school and faculty
    /// membership through `directory` instead of the record's own data.
    ///
    /// The default ignores `directory` and defers to [`uoc`](Self::uoc).
    fn uoc_with(&self, category: &Category, directory: &CourseDirectory) -> u32 {
        let _ = directory;
        self.uoc(category)
    }

    /// WAM within `category`, resolving school and faculty membership through
    /// `directory`. The default defers to [`wam`](Self::wam).
    fn wam_with(&self, category: &Category, directory: &CourseDirectory) -> Option<f64> {
        let _ = directory;
        self.wam(category)
    }

    /// Whether the record can answer school and faculty categories without
    /// a supplied directory.
    fn has_directory(&self) -> bool {
        true
    }
}
