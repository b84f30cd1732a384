use prereq::{ConditionSet, CourseDirectory, RulePaths, Student};

fn main() {
    tracing_subscriber::fmt::init();

    let directory = CourseDirectory::from_file("tests/data/courseDirectory.json")
        .expect("failed to load course directory");
    let set = ConditionSet::load(&RulePaths::in_dir("tests/data"), directory)
        .expect("failed to load rule data");

    println!("{set}");
    for (course, err) in set.parse_failures() {
        println!("  {course}: {err}");
    }

    let student = Student::from_json(
        r#"{
            "program": "3778",
            "courses": {"COMP1511": [6, 85], "COMP1521": [6, 72], "MATH1131": [6, null]},
            "in_progress": ["COMP2521"],
            "wam": 78.5
        }"#,
    )
    .expect("invalid student record");

    println!("Unlocked:");
    for (course, state) in set.all_unlocked(&student) {
        let note = if state.is_accurate { "" } else { " (no rule data)" };
        println!("  {course}{note}");
        for warning in &state.warnings {
            println!("    warning: {warning}");
        }
    }

    let path = ["COMP3121"];
    let opened = set.unlocked_when_taken(&student, "COMP2521", 6, &path);
    println!("Taking COMP2521 next unlocks: {:?}", opened.direct);
    println!("  and later: {:?}", opened.indirect);
}
