//! Property-based tests using proptest.
//!
//! Matching and its negation must always disagree, and the assertion
//! surface must notify exactly when matching says so.

use mustbe::inspect::{SHORT_INSPECT_CUTOFF_LENGTH, shorten};
use mustbe::{Case, Cases, Checkable, Kind, Value, check, matches, matches_none};
use proptest::prelude::*;

// ============================================================================
// STRATEGIES
// ============================================================================

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Bool),
        (-1_000_i64..1_000).prop_map(Value::Int),
        (-1_000.0_f64..1_000.0).prop_map(Value::Float),
        "[a-z ]{0,8}".prop_map(Value::Str),
        "[a-z]{1,6}".prop_map(Value::Symbol),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(2, 16, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Value::List)
    })
}

fn kind_strategy() -> impl Strategy<Value = Kind> {
    prop::sample::select(vec![
        Kind::Object,
        Kind::Nil,
        Kind::Boolean,
        Kind::Numeric,
        Kind::Integer,
        Kind::Float,
        Kind::String,
        Kind::Symbol,
        Kind::List,
        Kind::Map,
    ])
}

fn case_strategy() -> impl Strategy<Value = Case> {
    prop_oneof![
        kind_strategy().prop_map(Case::from),
        (-1_000_i64..1_000, 0_i64..500).prop_map(|(lo, width)| Case::from(lo..=lo + width)),
        scalar_strategy().prop_map(Case::Literal),
        prop::collection::vec(scalar_strategy(), 0..4).prop_map(Case::Among),
    ]
}

fn cases_strategy() -> impl Strategy<Value = Cases> {
    prop::collection::vec(case_strategy(), 1..4).prop_map(Cases)
}

// ============================================================================
// MATCHING PROPERTIES
// ============================================================================

proptest! {
    /// With at least one case, a value matches some case exactly when it
    /// matches none of them is false.
    #[test]
    fn prop_matches_and_matches_none_disagree(value in value_strategy(), cases in cases_strategy()) {
        prop_assert_ne!(matches(&value, &cases), matches_none(&value, &cases));
    }

    /// `must_be` notifies exactly when the value matches no case.
    #[test]
    fn prop_must_be_notifies_on_mismatch(value in value_strategy(), cases in cases_strategy()) {
        let expected = matches(&value, &cases);
        let found = check(|| value.clone().must_be(cases.clone())).expect("no usage error");
        prop_assert_eq!(found.is_none(), expected);
    }

    /// `must_be` and `must_not_be` never both pass and never both fail.
    #[test]
    fn prop_must_be_and_must_not_be_are_dual(value in value_strategy(), cases in cases_strategy()) {
        let be = check(|| value.clone().must_be(cases.clone())).expect("no usage error");
        let not_be = check(|| value.clone().must_not_be(cases.clone())).expect("no usage error");
        prop_assert_ne!(be.is_some(), not_be.is_some());
    }

    /// Every value is an Object, and Numeric covers both number kinds.
    #[test]
    fn prop_kind_hierarchy(value in value_strategy()) {
        prop_assert!(matches(&value, &Cases::from(Kind::Object)));
        let numeric = matches!(value, Value::Int(_) | Value::Float(_));
        prop_assert_eq!(matches(&value, &Cases::from(Kind::Numeric)), numeric);
    }

    /// Integer ranges are inclusive at both ends.
    #[test]
    fn prop_integer_ranges(x in -2_000_i64..2_000, lo in -1_000_i64..1_000, width in 0_i64..500) {
        let found = check(|| x.must_be(lo..=lo + width)).expect("no usage error");
        prop_assert_eq!(found.is_none(), lo <= x && x <= lo + width);
    }
}

// ============================================================================
// SHORTENING PROPERTIES
// ============================================================================

proptest! {
    /// Shortened text never exceeds the cutoff, and short text is untouched.
    #[test]
    fn prop_shorten_bounds_length(text in "[a-z ]{0,400}") {
        let short = shorten(text.clone());
        prop_assert!(short.chars().count() <= SHORT_INSPECT_CUTOFF_LENGTH);
        if text.chars().count() <= SHORT_INSPECT_CUTOFF_LENGTH {
            prop_assert_eq!(short, text);
        } else {
            prop_assert!(short.contains("..."));
        }
    }
}
