//! Cases: things a value can be matched against.
//!
//! A case is a kind, a predicate, a literal, a range, a set of candidates or
//! a pattern. Assertions take one case or a list of [`Cases`]; a value
//! matches a list when it matches any member.

use crate::error::UsageError;
use crate::inspect::Inspect;
use crate::value::{Kind, Value};
use regex::Regex;
use std::fmt;
use std::ops::{Range, RangeInclusive};
use std::sync::Arc;

type PredicateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum Case {
    /// Matches values whose kind is this kind or a subkind of it.
    Kind(Kind),
    Predicate {
        label: Option<String>,
        test: PredicateFn,
    },
    /// Matches values equal to this one.
    Literal(Value),
    Range {
        start: Value,
        end: Value,
        inclusive: bool,
    },
    /// Matches values equal to any candidate.
    Among(Vec<Value>),
    /// Matches strings and symbols the pattern finds a match in.
    Pattern(Regex),
}

impl Case {
    pub fn predicate<F>(test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Case::Predicate {
            label: None,
            test: Arc::new(test),
        }
    }

    /// A predicate that inspects as `label` in notes.
    pub fn labeled<F>(label: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Case::Predicate {
            label: Some(label.into()),
            test: Arc::new(test),
        }
    }

    pub fn pattern(source: &str) -> Result<Self, UsageError> {
        Regex::new(source)
            .map(Case::Pattern)
            .map_err(|err| UsageError::InvalidPattern(err.to_string()))
    }

    pub fn range(start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Case::Range {
            start: start.into(),
            end: end.into(),
            inclusive: true,
        }
    }

    pub fn range_exclusive(start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Case::Range {
            start: start.into(),
            end: end.into(),
            inclusive: false,
        }
    }

    /// Interpret a dynamic value as a case: a list is a candidate set,
    /// anything else but a map is a literal.
    pub fn from_value(value: Value) -> Result<Self, UsageError> {
        match value {
            Value::List(items) => Ok(Case::Among(items)),
            Value::Map(_) => Err(UsageError::InvalidCaseKind(value.inspect())),
            other => Ok(Case::Literal(other)),
        }
    }

    pub fn test(&self, value: &Value) -> bool {
        match self {
            Case::Kind(kind) => kind.includes(&value.kind()),
            Case::Predicate { test, .. } => test(value),
            Case::Literal(expected) => expected == value,
            Case::Range {
                start,
                end,
                inclusive,
            } => {
                let above = matches!(
                    start.partial_cmp(value),
                    Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
                );
                let below = match end.partial_cmp(value) {
                    Some(std::cmp::Ordering::Greater) => true,
                    Some(std::cmp::Ordering::Equal) => *inclusive,
                    _ => false,
                };
                above && below
            }
            Case::Among(candidates) => candidates.contains(value),
            Case::Pattern(re) => match value {
                Value::Str(s) | Value::Symbol(s) => re.is_match(s),
                _ => false,
            },
        }
    }

    pub fn as_kind(&self) -> Option<&Kind> {
        match self {
            Case::Kind(kind) => Some(kind),
            _ => None,
        }
    }
}

impl Inspect for Case {
    fn inspect(&self) -> String {
        match self {
            Case::Kind(kind) => kind.name().to_string(),
            Case::Predicate { label, .. } => label.clone().unwrap_or_else(|| "#<predicate>".into()),
            Case::Literal(value) => value.inspect(),
            Case::Range {
                start,
                end,
                inclusive,
            } => {
                let dots = if *inclusive { ".." } else { "..." };
                format!("{}{dots}{}", start.inspect(), end.inspect())
            }
            Case::Among(values) => Value::List(values.clone()).inspect(),
            Case::Pattern(re) => format!("/{}/", re.as_str()),
        }
    }
}

impl fmt::Debug for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Case({})", self.inspect())
    }
}

impl From<Kind> for Case {
    fn from(kind: Kind) -> Self {
        Case::Kind(kind)
    }
}

impl From<i64> for Case {
    fn from(v: i64) -> Self {
        Case::Literal(Value::Int(v))
    }
}

impl From<f64> for Case {
    fn from(v: f64) -> Self {
        Case::Literal(Value::Float(v))
    }
}

impl From<bool> for Case {
    fn from(v: bool) -> Self {
        Case::Literal(Value::Bool(v))
    }
}

impl From<&str> for Case {
    fn from(v: &str) -> Self {
        Case::Literal(Value::from(v))
    }
}

impl From<String> for Case {
    fn from(v: String) -> Self {
        Case::Literal(Value::Str(v))
    }
}

impl From<Regex> for Case {
    fn from(re: Regex) -> Self {
        Case::Pattern(re)
    }
}

impl From<RangeInclusive<i64>> for Case {
    fn from(r: RangeInclusive<i64>) -> Self {
        let (start, end) = r.into_inner();
        Case::range(start, end)
    }
}

impl From<Range<i64>> for Case {
    fn from(r: Range<i64>) -> Self {
        Case::range_exclusive(r.start, r.end)
    }
}

impl From<RangeInclusive<f64>> for Case {
    fn from(r: RangeInclusive<f64>) -> Self {
        let (start, end) = r.into_inner();
        Case::range(start, end)
    }
}

impl From<Vec<Value>> for Case {
    fn from(values: Vec<Value>) -> Self {
        Case::Among(values)
    }
}

/// An ordered list of cases; a value matches when any member matches.
#[derive(Debug, Clone, Default)]
pub struct Cases(pub Vec<Case>);

impl Cases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build cases from dynamic values, see [`Case::from_value`].
    pub fn from_values<I>(values: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = Value>,
    {
        values
            .into_iter()
            .map(Case::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Cases)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Case> {
        self.0.iter()
    }

    pub fn push(&mut self, case: impl Into<Case>) {
        self.0.push(case.into());
    }
}

impl Inspect for Cases {
    fn inspect(&self) -> String {
        match self.0.as_slice() {
            [single] => single.inspect(),
            cases => {
                let items: Vec<String> = cases.iter().map(Inspect::inspect).collect();
                format!("[{}]", items.join(", "))
            }
        }
    }
}

impl From<Case> for Cases {
    fn from(case: Case) -> Self {
        Cases(vec![case])
    }
}

impl From<Kind> for Cases {
    fn from(kind: Kind) -> Self {
        Cases(vec![Case::Kind(kind)])
    }
}

macro_rules! cases_from_single {
    ($($t:ty),*) => {
        $(impl From<$t> for Cases {
            fn from(case: $t) -> Self {
                Cases(vec![Case::from(case)])
            }
        })*
    };
}

cases_from_single!(
    i64,
    f64,
    bool,
    &str,
    String,
    Regex,
    RangeInclusive<i64>,
    Range<i64>,
    RangeInclusive<f64>
);

impl<C: Into<Case>> From<Vec<C>> for Cases {
    fn from(cases: Vec<C>) -> Self {
        Cases(cases.into_iter().map(Into::into).collect())
    }
}

impl<C: Into<Case>, const N: usize> From<[C; N]> for Cases {
    fn from(cases: [C; N]) -> Self {
        Cases(cases.into_iter().map(Into::into).collect())
    }
}

impl From<()> for Cases {
    fn from(_: ()) -> Self {
        Cases::default()
    }
}

impl<'a> IntoIterator for &'a Cases {
    type Item = &'a Case;
    type IntoIter = std::slice::Iter<'a, Case>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Pair constraint for map-like containers: a pair matches when its key
/// matches `keys` and its value matches `values`.
#[derive(Debug, Clone)]
pub struct PairSpec {
    pub keys: Cases,
    pub values: Cases,
}

impl PairSpec {
    pub fn new(keys: impl Into<Cases>, values: impl Into<Cases>) -> Self {
        Self {
            keys: keys.into(),
            values: values.into(),
        }
    }

    pub fn matches(&self, key: &Value, value: &Value) -> bool {
        matches(key, &self.keys) && matches(value, &self.values)
    }
}

impl Inspect for PairSpec {
    fn inspect(&self) -> String {
        format!("{{{}=>{}}}", self.keys.inspect(), self.values.inspect())
    }
}

impl Inspect for [PairSpec] {
    fn inspect(&self) -> String {
        let items: Vec<String> = self.iter().map(Inspect::inspect).collect();
        format!("[{}]", items.join(", "))
    }
}

/// Whether `value` matches any of `cases`. Empty cases match nothing.
pub fn matches(value: &Value, cases: &Cases) -> bool {
    cases.iter().any(|case| case.test(value))
}

/// Whether `value` matches none of `cases`. Empty cases are always satisfied.
pub fn matches_none(value: &Value, cases: &Cases) -> bool {
    cases.iter().all(|case| !case.test(value))
}

/// Pair acceptance for `must_only_contain` (`negate == false`) and
/// `must_not_contain` (`negate == true`).
///
/// With no specs a pair is acceptable when both parts are truthy, or, when
/// negated, when neither is.
pub fn pair_acceptable(key: &Value, value: &Value, specs: &[PairSpec], negate: bool) -> bool {
    if specs.is_empty() {
        return if negate {
            !key.is_truthy() && !value.is_truthy()
        } else {
            key.is_truthy() && value.is_truthy()
        };
    }
    let any = specs.iter().any(|spec| spec.matches(key, value));
    if negate { !any } else { any }
}
