use crate::{AcademicRecord, Category, Condition, CourseDirectory, Logic, Validation};

/// Where school and faculty membership comes from for one category.
enum Lookup<'d> {
    Shared(&'d CourseDirectory),
    Record,
    Missing,
}

fn lookup<'d, R: AcademicRecord + ?Sized>(
    category: &Category,
    record: &R,
    shared: Option<&'d CourseDirectory>,
) -> Lookup<'d> {
    if !category.needs_directory() {
        return Lookup::Record;
    }
    match shared {
        Some(directory) if !directory.is_empty() => Lookup::Shared(directory),
        _ if record.has_directory() => Lookup::Record,
        _ => Lookup::Missing,
    }
}

pub(crate) fn validate<R: AcademicRecord + ?Sized>(
    condition: &Condition,
    record: &R,
    shared: Option<&CourseDirectory>,
) -> Validation {
    match condition {
        Condition::Course(code) => Validation::from_bool(record.has_taken(code)),
        Condition::CourseExclusion(code) => Validation::from_bool(!record.has_taken(code)),
        Condition::ProgramExclusion(code) => Validation::from_bool(!record.in_program(code)),
        Condition::CoReq { courses, logic } => {
            let taken = |course: &String| record.has_taken(course) || record.is_taking(course);
            let satisfied = match logic {
                Logic::And => courses.iter().all(taken),
                Logic::Or => courses.iter().any(taken),
            };
            Validation::from_bool(satisfied)
        }
        Condition::Uoc { amount, category } => {
            let uoc = match lookup(category, record, shared) {
                Lookup::Shared(directory) => record.uoc_with(category, directory),
                Lookup::Record => record.uoc(category),
                Lookup::Missing => {
                    return Validation::new(false, vec![missing_directory("UOC", *amount, category)]);
                }
            };
            Validation::from_bool(uoc >= *amount)
        }
        Condition::Wam { amount, category } => {
            let wam = match lookup(category, record, shared) {
                Lookup::Shared(directory) => record.wam_with(category, directory),
                Lookup::Record => record.wam(category),
                Lookup::Missing => {
                    return Validation::new(true, vec![missing_directory("WAM", *amount, category)]);
                }
            };
            let warnings = wam_warning(*amount, category, wam).into_iter().collect();
            Validation::new(true, warnings)
        }
        Condition::Grade { amount, course } => validate_grade(*amount, course, record),
        Condition::Program(code) => Validation::from_bool(record.in_program(code)),
        Condition::ProgramType { programs, .. } => {
            Validation::from_bool(programs.iter().any(|p| record.in_program(p)))
        }
        Condition::Specialisation(code) => Validation::from_bool(record.in_specialisation(code)),
        Condition::Composite { conditions, logic } => {
            validate_composite(conditions, *logic, record, shared)
        }
    }
}

/// Every child is evaluated so that all of their warnings are reported, even
/// once the outcome is decided.
fn validate_composite<R: AcademicRecord + ?Sized>(
    conditions: &[Condition],
    logic: Logic,
    record: &R,
    shared: Option<&CourseDirectory>,
) -> Validation {
    if conditions.is_empty() {
        return Validation::pass();
    }

    let mut warnings = Vec::new();
    let mut all = true;
    let mut any = false;
    for child in conditions {
        let (satisfied, child_warnings) = validate(child, record, shared).into_parts();
        all &= satisfied;
        any |= satisfied;
        warnings.extend(child_warnings);
    }

    let satisfied = match logic {
        Logic::And => all,
        Logic::Or => any,
    };
    Validation::new(satisfied, warnings)
}

fn validate_grade<R: AcademicRecord + ?Sized>(amount: u32, course: &str, record: &R) -> Validation {
    if !record.has_taken(course) {
        return Validation::fail();
    }
    match record.grade(course) {
        None => Validation::new(
            true,
            vec![format!(
                "Requires {amount} mark in {course}. Your mark has not been recorded"
            )],
        ),
        Some(mark) => Validation::from_bool(mark >= amount),
    }
}

fn missing_directory(measure: &str, amount: u32, category: &Category) -> String {
    tracing::warn!(%category, "school and faculty data is not loaded");
    format!("Requires {amount} {measure} in {category}. School and faculty data has not been loaded")
}

fn wam_warning(amount: u32, category: &Category, wam: Option<f64>) -> Option<String> {
    match wam {
        Some(wam) if wam >= f64::from(amount) => None,
        Some(wam) if category.is_any() => Some(format!(
            "Requires {amount} WAM. Your WAM is currently {wam:.3}"
        )),
        Some(wam) => Some(format!(
            "Requires {amount} WAM in {category}. Your WAM in {category} is currently {wam:.3}"
        )),
        None if category.is_any() => {
            Some(format!("Requires {amount} WAM. Your WAM has not been recorded"))
        }
        None => Some(format!(
            "Requires {amount} WAM in {category}. Your WAM in {category} has not been recorded"
        )),
    }
}
