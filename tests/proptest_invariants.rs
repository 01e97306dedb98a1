
use proptest::prelude::*;
use ruletree::{
    combine, evaluate, from_structure, majority_operator, parse, to_structure, to_text, Node,
    Operator, Rule,
};
use strategies::{arb_record, arb_rule, arb_tree, arb_tree_list};

// ---------------------------------------------------------------------------
// Invariant 1: Text round trip
//
// Writing a tree back to text and parsing it rebuilds the same tree, so
// evaluation results cannot change.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn to_text_reparses_to_same_tree(tree in arb_tree(5)) {
        let reparsed = parse(&to_text(&tree)).unwrap();
        prop_assert_eq!(reparsed, tree);
    }

    #[test]
    fn round_trip_preserves_evaluation(tree in arb_tree(5), record in arb_record()) {
        let reparsed = parse(&to_text(&tree)).unwrap();
        prop_assert_eq!(evaluate(&reparsed, &record), evaluate(&tree, &record));
    }

    #[test]
    fn hand_written_text_builds_expected_tree(gen in arb_rule()) {
        let built = parse(&gen.text).unwrap();
        prop_assert_eq!(built, gen.tree, "text was: {}", gen.text);
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: Builder idempotence
//
// Parsing the text of a parsed tree gives that tree back.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn build_is_idempotent(gen in arb_rule()) {
        let once = parse(&gen.text).unwrap();
        let twice = parse(&to_text(&once)).unwrap();
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn rule_text_matches_tree(gen in arb_rule()) {
        let parsed = Rule::parse(&gen.text).unwrap();
        let adopted = Rule::from_tree(parsed.ast().clone()).unwrap();
        prop_assert_eq!(adopted.ast(), parsed.ast());
        prop_assert_eq!(parse(adopted.text()).unwrap(), parsed.into_ast());
    }
}

// ---------------------------------------------------------------------------
// Invariant 3: Determinism and purity
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn evaluation_is_deterministic(tree in arb_tree(5), record in arb_record()) {
        let first = evaluate(&tree, &record);
        prop_assert!(first.is_ok());
        for _ in 0..5 {
            prop_assert_eq!(&evaluate(&tree, &record), &first);
        }
    }

    #[test]
    fn evaluation_leaves_inputs_untouched(tree in arb_tree(5), record in arb_record()) {
        let (tree_before, record_before) = (tree.clone(), record.clone());
        let _ = evaluate(&tree, &record);
        prop_assert_eq!(tree, tree_before);
        prop_assert_eq!(record, record_before);
    }
}

// ---------------------------------------------------------------------------
// Invariant 4: Structural round trip
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn structure_round_trip(tree in arb_tree(5)) {
        let value = to_structure(&tree).unwrap();
        prop_assert_eq!(from_structure(&value).unwrap(), tree);
    }

    #[test]
    fn structure_survives_json_text(tree in arb_tree(5)) {
        let json = serde_json::to_string(&to_structure(&tree).unwrap()).unwrap();
        let decoded: Node = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(decoded, tree);
    }
}

// ---------------------------------------------------------------------------
// Invariant 5: Combiner shape
//
// The merged tree is a left-leaning spine: every spine root has the running
// tree on the left and the next input on the right, and its operator is the
// majority vote of the counts beneath it.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn combine_builds_majority_spine(trees in arb_tree_list()) {
        let combined = combine(trees.clone()).unwrap();

        let mut spine = &combined;
        for next in trees.iter().skip(1).rev() {
            let Node::Binary { op, left, right } = spine else {
                return Err(TestCaseError::fail("spine ended early"));
            };
            prop_assert_eq!(&**right, next);
            let counts = left.logic_counts() + right.logic_counts();
            prop_assert_eq!(*op, majority_operator(counts));
            prop_assert!(matches!(op, Operator::And | Operator::Or));
            spine = &**left;
        }
        prop_assert_eq!(spine, &trees[0]);
    }

    #[test]
    fn combined_text_reparses(trees in arb_tree_list()) {
        let combined = combine(trees).unwrap();
        let rule = Rule::from_tree(combined.clone()).unwrap();
        prop_assert_eq!(rule.into_ast(), combined);
    }
}
