use std::sync::Arc;
use std::thread;

use prereq::{ConditionSet, RuleData, Student};

fn main() {
    let set = Arc::new(ConditionSet::build(
        &RuleData::new()
            .with_tokens("COMP1521", ["(", "COMP1511", ")"])
            .with_tokens("COMP2521", ["(", "COMP1511", ")"])
            .with_tokens("COMP3121", ["(", "COMP2521", "&&", "12UOC", "in", "COMP", ")"])
            .with_exclusion("COMP2521", "COMP1927"),
    ));

    let handles: Vec<_> = (0..4_u32)
        .map(|i| {
            let cs = Arc::clone(&set);
            thread::spawn(move || {
                // each thread builds its own record
                let student = ["COMP1511", "COMP2521", "COMP1521"]
                    .iter()
                    .take(i as usize)
                    .fold(Student::new(), |student, code| {
                        student.course(code, 6, Some(60 + i * 10))
                    });

                let unlocked = cs.all_unlocked(&student);
                println!("Thread {i}: {unlocked:?}");
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
