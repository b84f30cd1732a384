use prereq::{Student, create_condition};

fn main() {
    // COMP3121: COMP2521 plus 70 WAM, or 24 UOC at level 2 in COMP
    let tokens = [
        "(", "COMP2521", "&&", "70WAM", ")", "||", "(", "24UOC", "in", "L2", "COMP", ")",
    ];
    let tree = create_condition(&tokens).expect("failed to parse rule");

    println!("{tree}");

    let student = Student::new()
        .course("COMP1511", 6, Some(82))
        .course("COMP2521", 6, Some(64))
        .with_wam(66.5);

    let result = tree.validate(&student);
    println!("Satisfied: {}", result.satisfied());
    for warning in result.warnings() {
        println!("Warning: {warning}");
    }
}
