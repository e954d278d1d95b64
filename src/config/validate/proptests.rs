use super::*;
use crate::config::schema::parse_spec;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_distinct_suffixes_accepted(suffixes in proptest::collection::btree_set(0u32..50, 1..8)) {
        let mut spec = parse_spec("topology: germany\ndata:\n  root: /d\n").unwrap();
        spec.data.suffixes = suffixes.into_iter().collect();
        prop_assert!(validate_spec(&spec).is_ok());
    }

    #[test]
    fn prop_positive_epochs_accepted(epochs in 1usize..10_000) {
        let mut spec = parse_spec("topology: germany\ndata:\n  root: /d\n").unwrap();
        spec.training.epochs = epochs;
        prop_assert!(validate_spec(&spec).is_ok());
    }
}
