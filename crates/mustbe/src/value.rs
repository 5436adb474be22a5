//! Dynamic values and their kinds.
//!
//! Assertions test receivers of arbitrary Rust types, so everything is
//! projected into a small dynamic [`Value`] before matching. [`Kind`] is the
//! runtime type tag of a value; kinds form a shallow hierarchy rooted at
//! `Object` so that a kind case such as `Numeric` matches both integers and
//! floats.

use crate::inspect::Inspect;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Runtime type tag of a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Root of the hierarchy: every value is an `Object`.
    Object,
    Nil,
    Boolean,
    /// Abstract parent of `Integer` and `Float`.
    Numeric,
    Integer,
    Float,
    String,
    Symbol,
    List,
    Map,
    /// A named record kind, see [`Value::Object`].
    Class(String),
}

impl Kind {
    /// Human-readable type name used in note messages.
    pub fn name(&self) -> &str {
        match self {
            Kind::Object => "Object",
            Kind::Nil => "Nil",
            Kind::Boolean => "Boolean",
            Kind::Numeric => "Numeric",
            Kind::Integer => "Integer",
            Kind::Float => "Float",
            Kind::String => "String",
            Kind::Symbol => "Symbol",
            Kind::List => "List",
            Kind::Map => "Map",
            Kind::Class(name) => name,
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Kind::Class(name.into())
    }

    pub fn parent(&self) -> Option<Kind> {
        match self {
            Kind::Object => None,
            Kind::Integer | Kind::Float => Some(Kind::Numeric),
            _ => Some(Kind::Object),
        }
    }

    /// Subtype test: whether a value of kind `other` is an instance of `self`.
    pub fn includes(&self, other: &Kind) -> bool {
        let mut current = Some(other.clone());
        while let Some(kind) = current {
            if &kind == self {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Abstract kinds have no direct instances.
    pub fn is_abstract(&self) -> bool {
        matches!(self, Kind::Object | Kind::Numeric)
    }

    /// Whether values of this kind can hold members or pairs.
    pub fn is_container(&self) -> bool {
        matches!(self, Kind::List | Kind::Map | Kind::Class(_))
    }
}

impl Inspect for Kind {
    fn inspect(&self) -> String {
        self.name().to_string()
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamic value under test.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    List(Vec<Value>),
    /// Insertion-ordered map with unique keys.
    Map(Vec<(Value, Value)>),
    /// Named record, e.g. an application-defined container.
    Object {
        class: String,
        fields: Vec<(String, Value)>,
    },
}

impl Value {
    pub fn sym(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a map; later duplicates of a key replace earlier values.
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut out = Vec::new();
        for (key, value) in pairs {
            upsert(&mut out, key.into(), value.into());
        }
        Value::Map(out)
    }

    pub fn object<I, N>(class: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (N, Value)>,
        N: Into<String>,
    {
        Value::Object {
            class: class.into(),
            fields: fields.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil => Kind::Nil,
            Value::Bool(_) => Kind::Boolean,
            Value::Int(_) => Kind::Integer,
            Value::Float(_) => Kind::Float,
            Value::Str(_) => Kind::String,
            Value::Symbol(_) => Kind::Symbol,
            Value::List(_) => Kind::List,
            Value::Map(_) => Kind::Map,
            Value::Object { class, .. } => Kind::Class(class.clone()),
        }
    }

    /// Everything except `nil` and `false` is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object { fields, .. } => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Set a field on an object, adding it if missing. Returns false for
    /// values that are not objects.
    pub fn set_field(&mut self, name: &str, value: Value) -> bool {
        let Value::Object { fields, .. } = self else {
            return false;
        };
        match fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => fields.push((name.to_string(), value)),
        }
        true
    }
}

/// Insert or replace `key` in an insertion-ordered pair list.
pub fn upsert(pairs: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    match pairs.iter_mut().find(|(k, _)| *k == key) {
        Some((_, slot)) => *slot = value,
        None => pairs.push((key, value)),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (
                Value::Object {
                    class: ca,
                    fields: fa,
                },
                Value::Object {
                    class: cb,
                    fields: fb,
                },
            ) => ca == cb && fa == fb,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Symbol(a), Value::Symbol(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }
}

impl Inspect for Value {
    fn inspect(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format!("{f:?}"),
            Value::Str(s) => format!("{s:?}"),
            Value::Symbol(s) => format!(":{s}"),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(Inspect::inspect).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Map(pairs) => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{}=>{}", k.inspect(), v.inspect()))
                    .collect();
                format!("{{{}}}", pairs.join(", "))
            }
            Value::Object { class, fields } => {
                if fields.is_empty() {
                    format!("#<{class}>")
                } else {
                    let fields: Vec<String> = fields
                        .iter()
                        .map(|(n, v)| format!("{n}={}", v.inspect()))
                        .collect();
                    format!("#<{class} {}>", fields.join(", "))
                }
            }
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inspect())
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        })*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! value_from_wide_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                i64::try_from(v).map_or(Value::Float(v as f64), Value::Int)
            }
        })*
    };
}

value_from_wide_int!(u64, usize, isize);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

impl<K: Into<Value>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(map: BTreeMap<K, V>) -> Self {
        Value::map(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map_or(Value::Nil, Value::Float),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::list(items),
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}
