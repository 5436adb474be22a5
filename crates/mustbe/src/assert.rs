//! The assertion surface.
//!
//! [`Checkable`] is implemented for the primitives, strings, collections and
//! [`Value`]; user types opt in by implementing `to_value`. Every assertion
//! consumes the receiver and hands it back on success, so assertions chain
//! with `?`:
//!
//! ```
//! use mustbe::{Checkable, Kind};
//!
//! # fn main() -> mustbe::Result<()> {
//! let port = 8080_i64.must_be(Kind::Integer)?.must_be(1_i64..=65535)?;
//! assert_eq!(port, 8080);
//! # Ok(())
//! # }
//! ```

use crate::case::{Case, Cases, matches, matches_none};
use crate::channel;
use crate::containers::{self, ContentCases, Watched};
use crate::error::{Result, UsageError};
use crate::inspect::Inspect;
use crate::note::{Arg, Note};
use crate::proxy::{Polarity, Proxy};
use crate::value::{Kind, Value};
use std::collections::BTreeMap;
use std::ops::{Range, RangeInclusive};

pub const DEFAULT_CLOSE_DELTA: f64 = 0.1;

/// A receiver of assertions.
///
/// While assertions are disabled every method returns the receiver without
/// evaluating cases, predicates or collections. Argument errors are still
/// reported.
pub trait Checkable: Sized {
    /// Project the receiver into the dynamic value model.
    fn to_value(&self) -> Value;

    /// Matches any of `cases`; with no cases, must be truthy.
    fn must_be(self, cases: impl Into<Cases>) -> Result<Self> {
        if !channel::is_enabled() {
            return Ok(self);
        }
        check_be(&self.to_value(), &cases.into(), false)?;
        Ok(self)
    }

    /// Matches none of `cases`; with no cases, must be falsy.
    fn must_not_be(self, cases: impl Into<Cases>) -> Result<Self> {
        if !channel::is_enabled() {
            return Ok(self);
        }
        check_be(&self.to_value(), &cases.into(), true)?;
        Ok(self)
    }

    /// Is an instance of one of the kinds. The last argument may be a
    /// non-kind tag that only shows up in the message.
    fn must_be_a(self, kinds: impl Into<Cases>) -> Result<Self> {
        let kinds = kinds.into();
        kinds_with_tag(&kinds)?;
        if !channel::is_enabled() {
            return Ok(self);
        }
        check_be_a(&self.to_value(), &kinds, false)?;
        Ok(self)
    }

    fn must_not_be_a(self, kinds: impl Into<Cases>) -> Result<Self> {
        let kinds = kinds.into();
        kinds_with_tag(&kinds)?;
        if !channel::is_enabled() {
            return Ok(self);
        }
        check_be_a(&self.to_value(), &kinds, true)?;
        Ok(self)
    }

    fn must_be_in<C: Membership + ?Sized>(self, collection: &C) -> Result<Self> {
        if !channel::is_enabled() {
            return Ok(self);
        }
        let value = self.to_value();
        if !collection.includes(&value) {
            channel::notify(
                Note::new(value, "must_be_in").with_args([collection.argument()]),
            )?;
        }
        Ok(self)
    }

    fn must_not_be_in<C: Membership + ?Sized>(self, collection: &C) -> Result<Self> {
        if !channel::is_enabled() {
            return Ok(self);
        }
        let value = self.to_value();
        if collection.includes(&value) {
            channel::notify(
                Note::new(value, "must_not_be_in").with_args([collection.argument()]),
            )?;
        }
        Ok(self)
    }

    fn must_be_nil(self) -> Result<Self> {
        if !channel::is_enabled() {
            return Ok(self);
        }
        let value = self.to_value();
        if !value.is_nil() {
            channel::notify(Note::new(value, "must_be_nil"))?;
        }
        Ok(self)
    }

    fn must_not_be_nil(self) -> Result<Self> {
        if !channel::is_enabled() {
            return Ok(self);
        }
        let value = self.to_value();
        if value.is_nil() {
            channel::notify(Note::new(value, "must_not_be_nil"))?;
        }
        Ok(self)
    }

    fn must_be_true(self) -> Result<Self> {
        if !channel::is_enabled() {
            return Ok(self);
        }
        let value = self.to_value();
        if !matches!(value, Value::Bool(true)) {
            channel::notify(Note::new(value, "must_be_true"))?;
        }
        Ok(self)
    }

    fn must_be_false(self) -> Result<Self> {
        if !channel::is_enabled() {
            return Ok(self);
        }
        let value = self.to_value();
        if !matches!(value, Value::Bool(false)) {
            channel::notify(Note::new(value, "must_be_false"))?;
        }
        Ok(self)
    }

    fn must_be_boolean(self) -> Result<Self> {
        if !channel::is_enabled() {
            return Ok(self);
        }
        let value = self.to_value();
        if !matches!(value, Value::Bool(_)) {
            channel::notify(Note::new(value, "must_be_boolean"))?;
        }
        Ok(self)
    }

    /// Within [`DEFAULT_CLOSE_DELTA`] of `expected`.
    fn must_be_close(self, expected: impl Into<Value>) -> Result<Self> {
        self.must_be_close_within(expected, DEFAULT_CLOSE_DELTA)
    }

    fn must_be_close_within(self, expected: impl Into<Value>, delta: f64) -> Result<Self> {
        let value = self.to_value();
        let expected = expected.into();
        let difference = difference(&value, &expected)?;
        if channel::is_enabled() && !(difference < delta) {
            channel::notify(
                Note::new(value, "must_be_close")
                    .with_args([expected, Value::Float(delta)])
                    .with_additional_message(format!(", difference is {difference:?}")),
            )?;
        }
        Ok(self)
    }

    fn must_not_be_close(self, expected: impl Into<Value>) -> Result<Self> {
        self.must_not_be_close_within(expected, DEFAULT_CLOSE_DELTA)
    }

    fn must_not_be_close_within(self, expected: impl Into<Value>, delta: f64) -> Result<Self> {
        let value = self.to_value();
        let expected = expected.into();
        if difference(&value, &expected)? < delta && channel::is_enabled() {
            channel::notify(
                Note::new(value, "must_not_be_close").with_args([expected, Value::Float(delta)]),
            )?;
        }
        Ok(self)
    }

    /// `predicate` holds for the receiver. Not evaluated while disabled.
    fn must<F: FnOnce(&Self) -> bool>(self, predicate: F) -> Result<Self> {
        if channel::is_enabled() && !predicate(&self) {
            channel::notify(Note::new(self.to_value(), "must").with_block())?;
        }
        Ok(self)
    }

    fn must_not<F: FnOnce(&Self) -> bool>(self, predicate: F) -> Result<Self> {
        if channel::is_enabled() && predicate(&self) {
            channel::notify(Note::new(self.to_value(), "must_not").with_block())?;
        }
        Ok(self)
    }

    /// Like [`must`](Self::must), but the note is just `message`. The
    /// predicate also receives the message.
    fn must_with<F: FnOnce(&Self, &str) -> bool>(self, message: &str, predicate: F) -> Result<Self> {
        if channel::is_enabled() && !predicate(&self, message) {
            channel::notify(Note::message(message))?;
        }
        Ok(self)
    }

    fn must_not_with<F: FnOnce(&Self, &str) -> bool>(
        self,
        message: &str,
        predicate: F,
    ) -> Result<Self> {
        if channel::is_enabled() && predicate(&self, message) {
            channel::notify(Note::message(message))?;
        }
        Ok(self)
    }

    /// Proxy whose operations notify when their result is falsy.
    fn must_that(self) -> Proxy<Self> {
        Proxy::new(self, Polarity::Must)
    }

    /// Proxy whose operations notify when their result is truthy.
    fn must_not_that(self) -> Proxy<Self> {
        Proxy::new(self, Polarity::MustNot)
    }

    fn must_only_contain(self, cases: impl Into<ContentCases>) -> Result<Self> {
        containers::validate_container(&self.to_value(), &cases.into(), false)?;
        Ok(self)
    }

    fn must_not_contain(self, cases: impl Into<ContentCases>) -> Result<Self> {
        containers::validate_container(&self.to_value(), &cases.into(), true)?;
        Ok(self)
    }

    /// Validate now and after every mutation made through the returned
    /// [`Watched`] container.
    fn must_only_ever_contain(self, cases: impl Into<ContentCases>) -> Result<Watched> {
        Watched::install(self.to_value(), cases.into(), false)
    }

    fn must_never_ever_contain(self, cases: impl Into<ContentCases>) -> Result<Watched> {
        Watched::install(self.to_value(), cases.into(), true)
    }
}

/// Match `value` against `cases` and notify `must_be` / `must_not_be` on
/// failure.
pub(crate) fn check_be(value: &Value, cases: &Cases, negate: bool) -> Result<()> {
    let passes = if cases.is_empty() {
        value.is_truthy() != negate
    } else if negate {
        matches_none(value, cases)
    } else {
        matches(value, cases)
    };
    if !passes {
        let assertion = if negate { "must_not_be" } else { "must_be" };
        channel::notify(
            Note::new(value.clone(), assertion)
                .with_args(cases.iter())
                .with_additional_message(format!(", but is {}", value.kind())),
        )?;
    }
    Ok(())
}

fn check_be_a(value: &Value, cases: &Cases, negate: bool) -> Result<()> {
    let kinds = kinds_with_tag(cases)?;
    let kind = value.kind();
    let any = kinds.iter().any(|k| k.includes(&kind));
    if any == negate {
        let assertion = if negate { "must_not_be_a" } else { "must_be_a" };
        channel::notify(
            Note::new(value.clone(), assertion)
                .with_args(cases.iter())
                .with_additional_message(format!(", but is a {kind}")),
        )?;
    }
    Ok(())
}

/// Kinds of a `must_be_a` argument list whose last entry may be a tag.
fn kinds_with_tag(cases: &Cases) -> Result<Vec<&Kind>, UsageError> {
    let all = cases.0.as_slice();
    let Some(last) = all.last() else {
        return Err(UsageError::WrongArgumentCount {
            given: 0,
            expected: 1,
        });
    };
    let kinds = if last.as_kind().is_some() {
        all
    } else {
        &all[..all.len() - 1]
    };
    if kinds.is_empty() {
        return Err(UsageError::KindRequired { got: last.inspect() });
    }
    kinds
        .iter()
        .map(|case| {
            case.as_kind()
                .ok_or_else(|| UsageError::KindRequired { got: case.inspect() })
        })
        .collect()
}

fn difference(value: &Value, expected: &Value) -> Result<f64, UsageError> {
    let actual = value.as_f64().ok_or_else(|| UsageError::NotNumeric {
        value: value.inspect(),
    })?;
    let target = expected.as_f64().ok_or_else(|| UsageError::NotNumeric {
        value: expected.inspect(),
    })?;
    Ok((actual - target).abs())
}

/// Collections usable with `must_be_in`.
pub trait Membership {
    fn includes(&self, value: &Value) -> bool;

    /// The collection as it appears among a note's arguments.
    fn argument(&self) -> Arg;
}

impl<T: Clone + Into<Value>> Membership for [T] {
    fn includes(&self, value: &Value) -> bool {
        self.iter().any(|item| item.clone().into() == *value)
    }

    fn argument(&self) -> Arg {
        Arg::Value(Value::list(self.to_vec()))
    }
}

impl<T: Clone + Into<Value>, const N: usize> Membership for [T; N] {
    fn includes(&self, value: &Value) -> bool {
        self.as_slice().includes(value)
    }

    fn argument(&self) -> Arg {
        self.as_slice().argument()
    }
}

impl<T: Clone + Into<Value>> Membership for Vec<T> {
    fn includes(&self, value: &Value) -> bool {
        self.as_slice().includes(value)
    }

    fn argument(&self) -> Arg {
        self.as_slice().argument()
    }
}

/// Lists test membership, maps test keys, strings test substrings.
impl Membership for Value {
    fn includes(&self, value: &Value) -> bool {
        match (self, value) {
            (Value::List(items), _) => items.contains(value),
            (Value::Map(pairs), _) => pairs.iter().any(|(k, _)| k == value),
            (Value::Str(haystack), Value::Str(needle)) => haystack.contains(needle.as_str()),
            _ => false,
        }
    }

    fn argument(&self) -> Arg {
        Arg::Value(self.clone())
    }
}

impl Membership for str {
    fn includes(&self, value: &Value) -> bool {
        matches!(value, Value::Str(needle) if self.contains(needle.as_str()))
    }

    fn argument(&self) -> Arg {
        Arg::Value(Value::from(self))
    }
}

macro_rules! range_membership {
    ($($t:ty),*) => {
        $(impl Membership for $t {
            fn includes(&self, value: &Value) -> bool {
                Case::from(self.clone()).test(value)
            }

            fn argument(&self) -> Arg {
                Arg::Case(Case::from(self.clone()))
            }
        })*
    };
}

range_membership!(RangeInclusive<i64>, Range<i64>, RangeInclusive<f64>);

macro_rules! checkable_via_from {
    ($($t:ty),*) => {
        $(impl Checkable for $t {
            fn to_value(&self) -> Value {
                Value::from(self.clone())
            }
        })*
    };
}

checkable_via_from!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, char, String,
    serde_json::Value
);

impl Checkable for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl Checkable for &str {
    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

impl<T: Clone + Into<Value>> Checkable for Vec<T> {
    fn to_value(&self) -> Value {
        Value::list(self.iter().cloned())
    }
}

impl<T: Clone + Into<Value>> Checkable for Option<T> {
    fn to_value(&self) -> Value {
        Value::from(self.clone())
    }
}

impl<K, V> Checkable for BTreeMap<K, V>
where
    K: Clone + Into<Value>,
    V: Clone + Into<Value>,
{
    fn to_value(&self) -> Value {
        Value::map(self.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases;
    use crate::channel::check;
    use crate::error::MustBeError;
    use insta::assert_snapshot;

    /// Render the note `f` produces inside a dry-run scope.
    fn note_of<T>(f: impl FnOnce() -> Result<T>) -> Option<String> {
        check(f)
            .expect("assertion should not be misused")
            .map(|note| note.render())
    }

    fn usage_of<T: std::fmt::Debug>(result: Result<T>) -> UsageError {
        match result {
            Err(MustBeError::Usage(err)) => err,
            other => panic!("expected usage error, got {other:?}"),
        }
    }

    #[test]
    fn must_be_without_cases_tests_truthiness() {
        assert_eq!(note_of(|| Value::Nil.must_be(())).as_deref(), Some("nil.must_be, but is Nil"));
        assert_eq!(
            note_of(|| false.must_be(())).as_deref(),
            Some("false.must_be, but is Boolean")
        );
        assert_eq!(note_of(|| 51_i64.must_be(())), None);
        assert_eq!(
            note_of(|| 51_i64.must_not_be(())).as_deref(),
            Some("51.must_not_be, but is Integer")
        );
        assert_eq!(note_of(|| Value::Nil.must_not_be(())), None);
    }

    #[test]
    fn must_be_matches_any_case() {
        assert_eq!(note_of(|| 51_i64.must_be(Kind::Numeric)), None);
        assert_snapshot!(
            note_of(|| 51_i64.must_be(Kind::Float)).unwrap_or_default(),
            @"51.must_be(Float), but is Integer"
        );
        assert_eq!(
            note_of(|| 51_i64.must_be([Kind::String, Kind::List, Kind::Map])).as_deref(),
            Some("51.must_be(String, List, Map), but is Integer")
        );
        assert_eq!(note_of(|| 51_i64.must_be([Kind::Map, Kind::Object])), None);
        assert_eq!(note_of(|| 51_i64.must_be(cases![Kind::String, 51_i64])), None);
    }

    #[test]
    fn must_not_be_is_the_negation() {
        assert_eq!(note_of(|| 51_i64.must_not_be(Kind::Float)), None);
        assert_eq!(
            note_of(|| 51_i64.must_not_be(Kind::Numeric)).as_deref(),
            Some("51.must_not_be(Numeric), but is Integer")
        );
        let odd = Case::labeled("odd", |v| matches!(v, Value::Int(i) if i % 2 != 0));
        let zero = Case::labeled("zero", |v| *v == Value::Int(0));
        assert_eq!(note_of(|| 51_i64.must_not_be(zero.clone())), None);
        assert_eq!(
            note_of(|| 51_i64.must_not_be(vec![zero, odd])).as_deref(),
            Some("51.must_not_be(zero, odd), but is Integer")
        );
    }

    #[test]
    fn must_be_returns_the_receiver() {
        let name = String::from("ok").must_be(Kind::String).expect("passes");
        assert_eq!(name, "ok");
        let err = 51_i64.must_be(Kind::Float).expect_err("raise notifier");
        assert_eq!(err.to_string(), "51.must_be(Float), but is Integer");
    }

    #[test]
    fn must_be_a_requires_kinds() {
        assert_eq!(note_of(|| 51_i64.must_be_a(Kind::Numeric)), None);
        assert_eq!(
            note_of(|| 51_i64.must_be_a([Kind::String, Kind::List])).as_deref(),
            Some("51.must_be_a(String, List), but is a Integer")
        );
        assert_eq!(
            note_of(|| 51_i64.must_not_be_a(cases![Kind::Numeric, "tag"])).as_deref(),
            Some(r#"51.must_not_be_a(Numeric, "tag"), but is a Integer"#)
        );

        assert_eq!(
            usage_of(51_i64.must_be_a(())),
            UsageError::WrongArgumentCount {
                given: 0,
                expected: 1
            }
        );
        assert!(usage_of(51_i64.must_be_a("tag")).is_type_error());
        assert!(usage_of(51_i64.must_be_a(cases!["x", Kind::Integer])).is_type_error());
    }

    #[test]
    fn must_be_in_accepts_slices_ranges_and_values() {
        assert_eq!(note_of(|| 2_i64.must_be_in(&[1_i64, 2, 3])), None);
        assert_eq!(
            note_of(|| 5_i64.must_be_in(&[1_i64, 2, 3])).as_deref(),
            Some("5.must_be_in([1, 2, 3])")
        );
        assert_eq!(note_of(|| 5_i64.must_be_in(&(1_i64..=5))), None);
        assert_eq!(
            note_of(|| 5_i64.must_be_in(&(1_i64..5))).as_deref(),
            Some("5.must_be_in(1...5)")
        );
        assert_eq!(note_of(|| "ell".must_be_in("hello")), None);
        assert_eq!(
            note_of(|| "key".must_not_be_in(&Value::map([("key", 1_i64)]))).as_deref(),
            Some(r#""key".must_not_be_in({"key"=>1})"#)
        );
        assert_eq!(note_of(|| Value::sym("a").must_not_be_in(&vec![Value::sym("b")])), None);
    }

    #[test]
    fn nil_and_boolean_assertions() {
        assert_eq!(note_of(|| None::<i64>.must_be_nil()), None);
        assert_eq!(note_of(|| 1_i64.must_be_nil()).as_deref(), Some("1.must_be_nil"));
        assert_eq!(
            note_of(|| None::<i64>.must_not_be_nil()).as_deref(),
            Some("nil.must_not_be_nil")
        );
        assert_eq!(note_of(|| true.must_be_true()), None);
        assert_eq!(note_of(|| 1_i64.must_be_true()).as_deref(), Some("1.must_be_true"));
        assert_eq!(note_of(|| false.must_be_false()), None);
        assert_eq!(
            note_of(|| Value::Nil.must_be_false()).as_deref(),
            Some("nil.must_be_false")
        );
        assert_eq!(note_of(|| false.must_be_boolean()), None);
        assert_eq!(
            note_of(|| "true".must_be_boolean()).as_deref(),
            Some(r#""true".must_be_boolean"#)
        );
    }

    #[test]
    fn closeness_reports_the_difference() {
        assert_eq!(note_of(|| 2.05_f64.must_be_close(2.0)), None);
        assert_snapshot!(
            note_of(|| 200.0_f64.must_be_close(2.0)).unwrap_or_default(),
            @"200.0.must_be_close(2.0, 0.1), difference is 198.0"
        );
        assert_eq!(note_of(|| 10_i64.must_be_close_within(12_i64, 3.0)), None);
        assert_eq!(
            note_of(|| 2.0_f64.must_not_be_close(2.0)).as_deref(),
            Some("2.0.must_not_be_close(2.0, 0.1)")
        );
        assert_eq!(note_of(|| 200.0_f64.must_not_be_close(2.0)), None);
        assert!(matches!(
            usage_of("x".must_be_close(1.0)),
            UsageError::NotNumeric { .. }
        ));
    }

    #[test]
    fn predicates_render_as_blocks_or_messages() {
        assert_eq!(note_of(|| 3_i64.must(|v| *v == 3)), None);
        assert_eq!(note_of(|| 3_i64.must(|v| *v == 4)).as_deref(), Some("3.must {}"));
        assert_eq!(
            note_of(|| 3_i64.must_not(|v| *v == 3)).as_deref(),
            Some("3.must_not {}")
        );
        assert_eq!(
            note_of(|| 3_i64.must_with("must be even", |v, _| v % 2 == 0)).as_deref(),
            Some("must be even")
        );
        assert_eq!(
            note_of(|| 3_i64.must_not_with("odd", |v, msg| msg == "odd" && v % 2 == 1)).as_deref(),
            Some("odd")
        );
    }

    #[test]
    fn collections_and_json_are_checkable() {
        let tags = vec!["a", "b"];
        assert_eq!(
            note_of(|| tags.clone().must_be(Kind::List)),
            None
        );
        let mut counts = BTreeMap::new();
        counts.insert("x", 1_i64);
        assert_eq!(
            note_of(|| counts.clone().must_be_a(Kind::Integer)).as_deref(),
            Some(r#"{"x"=>1}.must_be_a(Integer), but is a Map"#)
        );
        let doc = serde_json::json!({"port": 8080});
        assert_eq!(note_of(|| doc.clone().must_be(Kind::Map)), None);
        assert_eq!(note_of(|| 'c'.must_be(Kind::String)), None);
    }
}
