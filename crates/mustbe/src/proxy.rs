//! Polarity proxy returned by `must_that` / `must_not_that`.
//!
//! Each operation made through the proxy is evaluated on the delegate and
//! its result returned unchanged; when the truthiness of the result
//! disagrees with the proxy's polarity, a note such as
//! `230579.must.==(70581)` is notified.

use crate::assert::Checkable;
use crate::channel;
use crate::error::Result;
use crate::note::Note;
use crate::value::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Must,
    MustNot,
}

impl Polarity {
    pub fn name(self) -> &'static str {
        match self {
            Polarity::Must => "must",
            Polarity::MustNot => "must_not",
        }
    }

    fn expects(self) -> bool {
        self == Polarity::Must
    }
}

/// Results whose truthiness the proxy can judge.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl<T> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

impl Truthy for Value {
    fn is_truthy(&self) -> bool {
        Value::is_truthy(self)
    }
}

#[derive(Debug, Clone)]
pub struct Proxy<T> {
    delegate: T,
    polarity: Polarity,
}

impl<T: Checkable> Proxy<T> {
    pub fn new(delegate: T, polarity: Polarity) -> Self {
        Self { delegate, polarity }
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn get(&self) -> &T {
        &self.delegate
    }

    pub fn into_inner(self) -> T {
        self.delegate
    }

    /// Evaluate `op` on the delegate. `name` and `args` only describe the
    /// operation in the note.
    pub fn call<R, F>(&self, name: &str, args: &[Value], op: F) -> Result<R>
    where
        R: Truthy,
        F: FnOnce(&T) -> R,
    {
        let result = op(&self.delegate);
        if result.is_truthy() != self.polarity.expects() {
            let assertion = format!("{}.{name}", self.polarity.name());
            channel::notify(Note::new(self.delegate.to_value(), assertion).with_args(args))?;
        }
        Ok(result)
    }

    fn compare(&self, name: &str, other: Value, test: fn(Option<Ordering>) -> bool) -> Result<bool> {
        let value = self.delegate.to_value();
        let ordering = value.partial_cmp(&other);
        self.call(name, &[other], |_| test(ordering))
    }

    pub fn eq(&self, other: impl Into<Value>) -> Result<bool> {
        let other = other.into();
        let equal = self.delegate.to_value() == other;
        self.call("==", &[other], |_| equal)
    }

    pub fn ne(&self, other: impl Into<Value>) -> Result<bool> {
        let other = other.into();
        let differ = self.delegate.to_value() != other;
        self.call("!=", &[other], |_| differ)
    }

    pub fn lt(&self, other: impl Into<Value>) -> Result<bool> {
        self.compare("<", other.into(), |o| o == Some(Ordering::Less))
    }

    pub fn le(&self, other: impl Into<Value>) -> Result<bool> {
        self.compare("<=", other.into(), |o| {
            matches!(o, Some(Ordering::Less | Ordering::Equal))
        })
    }

    pub fn gt(&self, other: impl Into<Value>) -> Result<bool> {
        self.compare(">", other.into(), |o| o == Some(Ordering::Greater))
    }

    pub fn ge(&self, other: impl Into<Value>) -> Result<bool> {
        self.compare(">=", other.into(), |o| {
            matches!(o, Some(Ordering::Greater | Ordering::Equal))
        })
    }
}
