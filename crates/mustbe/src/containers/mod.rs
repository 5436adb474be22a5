//! Container validation.
//!
//! `must_only_contain` / `must_not_contain` check every member of a
//! sequence-like container against member cases, or every pair of a
//! map-like container against pair specs. `must_only_ever_contain` /
//! `must_never_ever_contain` keep doing so after each mutation, through a
//! [`Watched`] container and the adapter registered for its kind.

pub mod adapters;
pub mod registry;
pub mod watched;

pub use adapters::{ListAdapter, MapAdapter};
pub use registry::{ContainerAdapter, Introduced, Mutation, adapter_for, register, unregister};
pub use watched::Watched;

use crate::assert::check_be;
use crate::case::{Case, Cases, PairSpec, pair_acceptable};
use crate::channel;
use crate::error::{Result, UsageError};
use crate::inspect::{Inspect, short_inspect};
use crate::note::Note;
use crate::trace::Trace;
use crate::value::{Kind, Value};
use std::sync::Arc;

pub const MUST_ONLY_CONTAIN_PREFIX: &str = "must_only_contain: ";
pub const MUST_NOT_CONTAIN_PREFIX: &str = "must_not_contain: ";
pub const MUST_ONLY_EVER_CONTAIN_PREFIX: &str = "must_only_ever_contain: ";
pub const MUST_NEVER_EVER_CONTAIN_PREFIX: &str = "must_never_ever_contain: ";

/// What the contents of a container are checked against.
#[derive(Debug, Clone)]
pub enum ContentCases {
    /// Cases for each member of a sequence-like container.
    Members(Cases),
    /// Specs for each pair of a map-like container.
    Pairs(Vec<PairSpec>),
}

impl ContentCases {
    pub fn member_cases(&self, container: &Value) -> Result<&Cases, UsageError> {
        match self {
            ContentCases::Members(cases) => Ok(cases),
            ContentCases::Pairs(_) => Err(UsageError::MemberCasesRequired {
                container: short_inspect(container),
            }),
        }
    }

    /// Pair specs; no member cases at all counts as no specs.
    pub fn pair_specs(&self, container: &Value) -> Result<&[PairSpec], UsageError> {
        match self {
            ContentCases::Pairs(specs) => Ok(specs),
            ContentCases::Members(cases) if cases.is_empty() => Ok(&[]),
            ContentCases::Members(_) => Err(UsageError::PairSpecsRequired {
                container: short_inspect(container),
            }),
        }
    }
}

impl Default for ContentCases {
    fn default() -> Self {
        ContentCases::Members(Cases::default())
    }
}

impl Inspect for ContentCases {
    fn inspect(&self) -> String {
        match self {
            ContentCases::Members(cases) => cases.inspect(),
            ContentCases::Pairs(specs) => specs.as_slice().inspect(),
        }
    }
}

impl From<Cases> for ContentCases {
    fn from(cases: Cases) -> Self {
        ContentCases::Members(cases)
    }
}

impl From<Case> for ContentCases {
    fn from(case: Case) -> Self {
        ContentCases::Members(case.into())
    }
}

impl From<Kind> for ContentCases {
    fn from(kind: Kind) -> Self {
        ContentCases::Members(kind.into())
    }
}

impl<C: Into<Case>, const N: usize> From<[C; N]> for ContentCases {
    fn from(cases: [C; N]) -> Self {
        ContentCases::Members(cases.into())
    }
}

impl From<PairSpec> for ContentCases {
    fn from(spec: PairSpec) -> Self {
        ContentCases::Pairs(vec![spec])
    }
}

impl From<Vec<PairSpec>> for ContentCases {
    fn from(specs: Vec<PairSpec>) -> Self {
        ContentCases::Pairs(specs)
    }
}

impl From<()> for ContentCases {
    fn from(_: ()) -> Self {
        ContentCases::default()
    }
}

/// Check the contents of `container`, notifying with the
/// `must_only_contain: ` or `must_not_contain: ` prefix.
pub fn validate_container(container: &Value, cases: &ContentCases, negate: bool) -> Result<()> {
    let prefix = if negate {
        MUST_NOT_CONTAIN_PREFIX
    } else {
        MUST_ONLY_CONTAIN_PREFIX
    };
    check_shape(container, cases)?;
    if !channel::is_enabled() {
        return Ok(());
    }
    check_contents(&ContentCheck::new(container, negate, prefix), cases)
}

/// Argument checks that do not look at the contents: the receiver is a
/// container and the cases have the shape it needs.
fn check_shape(container: &Value, cases: &ContentCases) -> Result<(), UsageError> {
    match container {
        Value::Map(_) => cases.pair_specs(container).map(|_| ()),
        Value::List(_) => cases.member_cases(container).map(|_| ()),
        other if adapter_for(&other.kind()).is_some() => Ok(()),
        other => Err(UsageError::NotAContainer {
            value: short_inspect(other),
        }),
    }
}

/// Check every member or pair of the container in `check`.
///
/// An adapter's own bulk check wins; otherwise pairs are checked when the
/// container has them, members when it has those.
pub fn check_contents(check: &ContentCheck<'_>, cases: &ContentCases) -> Result<()> {
    let container = check.container();
    let adapter = adapter_for(&container.kind());

    if let Some(adapter) = &adapter {
        if let Some(result) = adapter.check_contents(check, cases) {
            return result;
        }
    }

    let pairs = adapter
        .as_ref()
        .and_then(|a| a.pairs(container))
        .or_else(|| match container {
            Value::Map(pairs) => Some(pairs.clone()),
            _ => None,
        });
    if let Some(pairs) = pairs {
        let specs = cases.pair_specs(container)?;
        for (key, value) in &pairs {
            check.pair(key, value, specs)?;
        }
        return Ok(());
    }

    let members = adapter
        .as_ref()
        .and_then(|a| a.members(container))
        .or_else(|| match container {
            Value::List(items) => Some(items.clone()),
            _ => None,
        });
    let Some(members) = members else {
        return Err(UsageError::NotAContainer {
            value: short_inspect(container),
        }
        .into());
    };
    let member_cases = cases.member_cases(container)?;
    for member in &members {
        check.member(member, member_cases)?;
    }
    Ok(())
}

/// One pass over a container: the container itself, the polarity, the
/// prefix for notes and, for watched containers, where watching started.
#[derive(Debug, Clone)]
pub struct ContentCheck<'a> {
    container: &'a Value,
    negate: bool,
    prefix: &'a str,
    origin: Option<&'a Arc<Trace>>,
}

impl<'a> ContentCheck<'a> {
    pub fn new(container: &'a Value, negate: bool, prefix: &'a str) -> Self {
        Self {
            container,
            negate,
            prefix,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: &'a Arc<Trace>) -> Self {
        self.origin = Some(origin);
        self
    }

    /// The same check applied to another container, e.g. a batch of
    /// members about to be added.
    pub fn for_container(&self, container: &'a Value) -> Self {
        Self {
            container,
            ..self.clone()
        }
    }

    pub fn container(&self) -> &'a Value {
        self.container
    }

    pub fn negate(&self) -> bool {
        self.negate
    }

    /// Check one member with `must_be` (or `must_not_be`) in a dry-run
    /// scope and re-notify a failure as a container note.
    pub fn member(&self, member: &Value, cases: &Cases) -> Result<()> {
        let found = channel::check(|| check_be(member, cases, self.negate))?;
        if let Some(note) = found {
            let mut note = Note::within_container(note, self.container.clone());
            note.set_prefix(self.prefix);
            channel::notify(self.attach_origin(note))?;
        }
        Ok(())
    }

    /// Check one key/value pair against `specs`.
    pub fn pair(&self, key: &Value, value: &Value, specs: &[PairSpec]) -> Result<()> {
        if !pair_acceptable(key, value, specs, self.negate) {
            let note = Note::pair(
                key.clone(),
                value.clone(),
                specs,
                self.container.clone(),
                self.negate,
            )
            .with_prefix(self.prefix);
            channel::notify(self.attach_origin(note))?;
        }
        Ok(())
    }

    fn attach_origin(&self, note: Note) -> Note {
        match self.origin {
            Some(origin) => note.with_origin(Arc::clone(origin)),
            None => note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::check;
    use crate::error::MustBeError;
    use insta::assert_snapshot;

    fn note_of(container: &Value, cases: impl Into<ContentCases>, negate: bool) -> Option<String> {
        let cases = cases.into();
        check(|| validate_container(container, &cases, negate))
            .expect("no usage error")
            .map(|note| note.render())
    }

    fn mixed() -> Value {
        Value::list(vec![Value::Int(1), Value::sym("sym"), Value::from("str")])
    }

    #[test]
    fn members_must_match_member_cases() {
        assert_snapshot!(
            note_of(&mixed(), [Kind::Numeric, Kind::String], false).unwrap_or_default(),
            @r#"must_only_contain: :sym.must_be(Numeric, String), but is Symbol in container [1, :sym, "str"]"#
        );
        assert_eq!(
            note_of(&mixed(), [Kind::Numeric, Kind::String, Kind::Symbol], false),
            None
        );
    }

    #[test]
    fn must_not_contain_rejects_matching_members() {
        assert_eq!(
            note_of(&mixed(), Kind::Symbol, true).as_deref(),
            Some(r#"must_not_contain: :sym.must_not_be(Symbol), but is Symbol in container [1, :sym, "str"]"#)
        );
        assert_eq!(note_of(&mixed(), Kind::Float, true), None);
    }

    #[test]
    fn empty_member_cases_test_truthiness() {
        let items = Value::list(vec![Value::Int(1), Value::Nil]);
        assert_eq!(
            note_of(&items, (), false).as_deref(),
            Some("must_only_contain: nil.must_be, but is Nil in container [1, nil]")
        );
        let falsy = Value::list(vec![Value::Nil, Value::Bool(false)]);
        assert_eq!(note_of(&falsy, (), true), None);
    }

    #[test]
    fn pairs_must_match_some_spec() {
        let map = Value::map([(Value::sym("key"), Value::sym("value"))]);
        let specs = vec![PairSpec::new(Kind::Symbol, [Kind::String, Kind::Numeric])];
        assert_snapshot!(
            note_of(&map, specs, false).unwrap_or_default(),
            @"must_only_contain: pair {:key=>:value} does not match [{Symbol=>[String, Numeric]}] in container {:key=>:value}"
        );

        let ok = Value::map([(Value::sym("key"), Value::Int(3))]);
        let specs = vec![PairSpec::new(Kind::Symbol, [Kind::String, Kind::Numeric])];
        assert_eq!(note_of(&ok, specs, false), None);
    }

    #[test]
    fn pairs_without_specs_test_truthiness() {
        let map = Value::map([(Value::sym("a"), Value::Nil)]);
        assert_eq!(
            note_of(&map, (), false).as_deref(),
            Some("must_only_contain: pair {:a=>nil} does not match [] in container {:a=>nil}")
        );
        assert_eq!(
            note_of(&map, (), true).as_deref(),
            Some("must_not_contain: pair {:a=>nil} matches [] in container {:a=>nil}")
        );
    }

    #[test]
    fn wrong_shapes_are_usage_errors() {
        let map = Value::map([("k", 1_i64)]);
        let err = validate_container(&map, &Kind::Numeric.into(), false).expect_err("pairs needed");
        assert!(matches!(
            err,
            MustBeError::Usage(UsageError::PairSpecsRequired { .. })
        ));

        let list = mixed();
        let specs = ContentCases::from(PairSpec::new(Kind::Symbol, Kind::Numeric));
        assert!(matches!(
            validate_container(&list, &specs, false),
            Err(MustBeError::Usage(UsageError::MemberCasesRequired { .. }))
        ));

        let err = validate_container(&Value::Int(1), &().into(), false).expect_err("not a container");
        assert!(err.usage().is_some_and(UsageError::is_type_error));
    }
}
