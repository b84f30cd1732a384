
use prereq::{AcademicRecord, Condition, Logic, Validation, create_condition};
use proptest::prelude::*;
use strategies::{
    COURSES, arb_category, arb_condition, arb_logic, arb_student, arb_token_tree, to_tokens,
};

// ---------------------------------------------------------------------------
// Invariant 1: Composite AND/OR correctness
//
// Satisfaction is all()/any() over the children; warnings are the in-order
// concatenation of every child's warnings.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn composite_combines_children(
        children in prop::collection::vec(arb_condition(2), 1..5),
        logic in arb_logic(),
        student in arb_student(),
    ) {
        let results: Vec<Validation> = children.iter().map(|c| c.validate(&student)).collect();
        let tree = Condition::Composite { conditions: children, logic };
        let (satisfied, warnings) = tree.validate(&student).into_parts();

        let expected = match logic {
            Logic::And => results.iter().all(Validation::satisfied),
            Logic::Or => results.iter().any(Validation::satisfied),
        };
        prop_assert_eq!(satisfied, expected);

        let expected_warnings: Vec<String> = results
            .iter()
            .flat_map(|r| r.warnings().iter().cloned())
            .collect();
        prop_assert_eq!(warnings, expected_warnings);
    }

    #[test]
    fn empty_composite_is_vacuous(logic in arb_logic(), student in arb_student()) {
        let tree = Condition::Composite { conditions: vec![], logic };
        prop_assert_eq!(tree.validate(&student), Validation::pass());
    }

    #[test]
    fn evaluation_is_deterministic(tree in arb_condition(3), student in arb_student()) {
        let first = tree.validate(&student);
        for _ in 0..3 {
            prop_assert_eq!(&first, &tree.validate(&student));
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: WAM is advisory
//
// Always satisfied; a warning is present iff the applicable WAM is missing
// or below the threshold.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn wam_always_satisfied(
        amount in 0_u32..=100,
        category in arb_category(),
        student in arb_student(),
    ) {
        let wam = student.wam(&category);
        let condition = Condition::Wam { amount, category };
        let (satisfied, warnings) = condition.validate(&student).into_parts();

        prop_assert!(satisfied);
        let below = wam.is_none_or(|w| w < f64::from(amount));
        prop_assert_eq!(!warnings.is_empty(), below);
        prop_assert!(warnings.len() <= 1);
    }
}

// ---------------------------------------------------------------------------
// Invariant 3: Grade uncertainty
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn grade_invariant(
        amount in 0_u32..=100,
        course in prop::sample::select(COURSES),
        student in arb_student(),
    ) {
        let (satisfied, warnings) = Condition::grade(amount, course)
            .validate(&student)
            .into_parts();

        if !student.has_taken(course) {
            prop_assert!(!satisfied);
            prop_assert!(warnings.is_empty());
        } else {
            match student.grade(course) {
                None => {
                    prop_assert!(satisfied);
                    prop_assert_eq!(warnings.len(), 1);
                }
                Some(mark) => {
                    prop_assert_eq!(satisfied, mark >= amount);
                    prop_assert!(warnings.is_empty());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 4: Parsing
//
// Well-formed bracketed token lists always parse, parse identically every
// time, and evaluate exactly like the tree they were written from. Breaking
// the brackets or adding an unknown token makes parsing fail.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn well_formed_tokens_parse(tree in arb_token_tree(3)) {
        let tokens = to_tokens(&tree);
        prop_assert!(create_condition(&tokens).is_ok(), "failed on {:?}", tokens);
    }

    #[test]
    fn parsing_is_idempotent(tree in arb_token_tree(3)) {
        let tokens = to_tokens(&tree);
        let first = create_condition(&tokens).unwrap();
        let second = create_condition(&tokens).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn parsed_tree_evaluates_like_source(tree in arb_token_tree(3), student in arb_student()) {
        let parsed = create_condition(&to_tokens(&tree)).unwrap();
        prop_assert_eq!(parsed.validate(&student), tree.validate(&student));
    }

    #[test]
    fn unclosed_bracket_fails(tree in arb_token_tree(3)) {
        let mut tokens = to_tokens(&tree);
        tokens.pop();
        prop_assert!(create_condition(&tokens).is_err());
    }

    #[test]
    fn unknown_token_fails(tree in arb_token_tree(3)) {
        let mut tokens = to_tokens(&tree);
        let at = tokens.len() - 1;
        tokens.insert(at, "&&&".to_owned());
        prop_assert!(create_condition(&tokens).is_err());
    }

    #[test]
    fn category_round_trips_through_tokens(amount in 0_u32..=48, category in arb_category()) {
        let tree = Condition::all(vec![Condition::uoc_in(amount, category)]);
        let parsed = create_condition(&to_tokens(&tree)).unwrap();
        prop_assert_eq!(parsed, Condition::all(vec![tree]));
    }
}
