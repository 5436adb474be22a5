//! Notes: structured diagnostics for violated assertions.
//!
//! A note carries what it needs to describe the failure (receiver, assertion
//! name, arguments, block flag, additional message, prefix) and renders its
//! message lazily: arguments and pair specs are kept as given and only
//! inspected by [`Note::render`]. Container and pair notes are variants of the
//! same type, so they can be notified, captured and raised like any other.

use crate::case::{Case, PairSpec};
use crate::inspect::{Inspect, shorten, short_inspect};
use crate::trace::Trace;
use crate::value::{Kind, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const CAUSED_BY_CONTAINER: &str = "=== caused by container ===";

#[derive(Debug, Clone)]
pub struct Note {
    body: Body,
    prefix: Option<String>,
    trace: Trace,
}

#[derive(Debug, Clone)]
enum Body {
    Message(String),
    Assertion(Assertion),
    Container(Box<ContainerNote>),
    Pair(Box<PairNote>),
}

#[derive(Debug, Clone)]
struct Assertion {
    receiver: Value,
    assertion: String,
    args: Vec<Arg>,
    block: bool,
    additional_message: Option<String>,
}

#[derive(Debug, Clone)]
struct ContainerNote {
    inner: Note,
    container: Value,
    origin: Option<Arc<Trace>>,
}

#[derive(Debug, Clone)]
struct PairNote {
    key: Value,
    value: Value,
    specs: Vec<PairSpec>,
    container: Value,
    negate: bool,
    origin: Option<Arc<Trace>>,
}

/// An argument an assertion was called with.
#[derive(Debug, Clone)]
pub enum Arg {
    Value(Value),
    Case(Case),
}

impl Inspect for Arg {
    fn inspect(&self) -> String {
        match self {
            Arg::Value(value) => value.inspect(),
            Arg::Case(case) => case.inspect(),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<&Value> for Arg {
    fn from(value: &Value) -> Self {
        Arg::Value(value.clone())
    }
}

impl From<Case> for Arg {
    fn from(case: Case) -> Self {
        Arg::Case(case)
    }
}

impl From<&Case> for Arg {
    fn from(case: &Case) -> Self {
        Arg::Case(case.clone())
    }
}

impl From<Kind> for Arg {
    fn from(kind: Kind) -> Self {
        Arg::Case(Case::Kind(kind))
    }
}

/// Serializable snapshot of a note, for structured export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_kind: Option<Kind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backtrace: Vec<String>,
}

impl Note {
    /// A plain note whose message is `text`.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            body: Body::Message(text.into()),
            prefix: None,
            trace: Trace::capture(),
        }
    }

    /// A note for `receiver.assertion`, without arguments.
    pub fn new(receiver: impl Into<Value>, assertion: impl Into<String>) -> Self {
        Self {
            body: Body::Assertion(Assertion {
                receiver: receiver.into(),
                assertion: assertion.into(),
                args: Vec::new(),
                block: false,
                additional_message: None,
            }),
            prefix: None,
            trace: Trace::capture(),
        }
    }

    /// Wrap `inner` so its message names the container it was found in.
    pub fn within_container(inner: Note, container: impl Into<Value>) -> Self {
        Self {
            body: Body::Container(Box::new(ContainerNote {
                inner,
                container: container.into(),
                origin: None,
            })),
            prefix: None,
            trace: Trace::default(),
        }
    }

    /// A note for a key/value pair that failed a map-content check.
    pub fn pair(
        key: Value,
        value: Value,
        specs: &[PairSpec],
        container: impl Into<Value>,
        negate: bool,
    ) -> Self {
        Self {
            body: Body::Pair(Box::new(PairNote {
                key,
                value,
                specs: specs.to_vec(),
                container: container.into(),
                negate,
                origin: None,
            })),
            prefix: None,
            trace: Trace::capture(),
        }
    }

    /// Record the arguments the assertion was called with.
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        if let Body::Assertion(assertion) = &mut self.body {
            assertion.args = args.into_iter().map(Into::into).collect();
        }
        self
    }

    pub fn with_block(mut self) -> Self {
        if let Body::Assertion(assertion) = &mut self.body {
            assertion.block = true;
        }
        self
    }

    pub fn with_additional_message(mut self, message: impl Into<String>) -> Self {
        self.set_additional_message(message);
        self
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        match &mut self.body {
            Body::Container(container) => container.inner.trace = trace,
            _ => self.trace = trace,
        }
        self
    }

    /// Attach the trace of where the container was put under continuous
    /// validation. Ignored by notes that do not refer to a container.
    pub fn with_origin(mut self, origin: Arc<Trace>) -> Self {
        match &mut self.body {
            Body::Container(container) => container.origin = Some(origin),
            Body::Pair(pair) => pair.origin = Some(origin),
            _ => {}
        }
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.set_prefix(prefix);
        self
    }

    fn assertion_body(&self) -> Option<&Assertion> {
        match &self.body {
            Body::Assertion(assertion) => Some(assertion),
            Body::Container(container) => container.inner.assertion_body(),
            _ => None,
        }
    }

    pub fn receiver(&self) -> Option<&Value> {
        self.assertion_body().map(|a| &a.receiver)
    }

    pub fn assertion(&self) -> Option<&str> {
        self.assertion_body().map(|a| a.assertion.as_str())
    }

    pub fn args(&self) -> &[Arg] {
        self.assertion_body().map_or(&[], |a| a.args.as_slice())
    }

    pub fn has_block(&self) -> bool {
        self.assertion_body().is_some_and(|a| a.block)
    }

    pub fn additional_message(&self) -> Option<&str> {
        self.assertion_body()
            .and_then(|a| a.additional_message.as_deref())
    }

    pub fn set_additional_message(&mut self, message: impl Into<String>) {
        match &mut self.body {
            Body::Assertion(assertion) => assertion.additional_message = Some(message.into()),
            Body::Container(container) => container.inner.set_additional_message(message),
            _ => {}
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        match &self.body {
            Body::Container(container) => container.inner.prefix(),
            _ => self.prefix.as_deref(),
        }
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        match &mut self.body {
            Body::Container(container) => container.inner.set_prefix(prefix),
            _ => self.prefix = Some(prefix.into()),
        }
    }

    pub fn clear_prefix(&mut self) {
        match &mut self.body {
            Body::Container(container) => container.inner.clear_prefix(),
            _ => self.prefix = None,
        }
    }

    /// The container this note was found in, for container and pair notes.
    pub fn container(&self) -> Option<&Value> {
        match &self.body {
            Body::Container(container) => Some(&container.container),
            Body::Pair(pair) => Some(&pair.container),
            _ => None,
        }
    }

    /// The wrapped note of a container note.
    pub fn inner(&self) -> Option<&Note> {
        match &self.body {
            Body::Container(container) => Some(&container.inner),
            _ => None,
        }
    }

    /// The specs a pair note's pair was checked against.
    pub fn pair_specs(&self) -> &[PairSpec] {
        match &self.body {
            Body::Pair(pair) => &pair.specs,
            _ => &[],
        }
    }

    /// Key and value of a pair note.
    pub fn pair_entry(&self) -> Option<(&Value, &Value)> {
        match &self.body {
            Body::Pair(pair) => Some((&pair.key, &pair.value)),
            _ => None,
        }
    }

    fn origin(&self) -> Option<&Arc<Trace>> {
        match &self.body {
            Body::Container(container) => container.origin.as_ref(),
            Body::Pair(pair) => pair.origin.as_ref(),
            _ => None,
        }
    }

    /// The rendered message.
    pub fn render(&self) -> String {
        match &self.body {
            Body::Message(text) => text.clone(),
            Body::Assertion(a) => format!(
                "{}{}.{}{}{}",
                self.prefix.as_deref().unwrap_or_default(),
                short_inspect(&a.receiver),
                a.assertion,
                format_args_and_block(
                    &a.args.iter().map(Inspect::inspect).collect::<Vec<_>>(),
                    a.block,
                ),
                a.additional_message.as_deref().unwrap_or_default(),
            ),
            Body::Container(container) => {
                let rendered = container.inner.render();
                if container.inner.assertion().is_some() {
                    format!(
                        "{rendered} in container {}",
                        short_inspect(&container.container)
                    )
                } else {
                    rendered
                }
            }
            Body::Pair(pair) => {
                let matched = if pair.negate {
                    "matches"
                } else {
                    "does not match"
                };
                format!(
                    "{}pair {{{}=>{}}} {matched} {} in container {}",
                    self.prefix.as_deref().unwrap_or_default(),
                    short_inspect(&pair.key),
                    short_inspect(&pair.value),
                    short_inspect(pair.specs.as_slice()),
                    short_inspect(&pair.container),
                )
            }
        }
    }

    /// The full trace captured when the note was created.
    pub fn complete_backtrace(&self) -> &Trace {
        match &self.body {
            Body::Container(container) => container.inner.complete_backtrace(),
            _ => &self.trace,
        }
    }

    /// The trace without library frames, followed by the container's
    /// installation trace when the container was continuously validated.
    pub fn backtrace(&self) -> Vec<String> {
        let mut frames = self.complete_backtrace().public_frames();
        if let Some(origin) = self.origin() {
            frames.push(CAUSED_BY_CONTAINER.to_string());
            frames.extend(origin.public_frames());
        }
        frames
    }

    pub fn record(&self) -> NoteRecord {
        NoteRecord {
            message: self.render(),
            receiver: self.receiver().map(Inspect::inspect),
            receiver_kind: self.receiver().map(Value::kind),
            assertion: self.assertion().map(str::to_string),
            args: self.args().iter().map(Inspect::inspect).collect(),
            prefix: self.prefix().map(str::to_string),
            container: self.container().map(Inspect::inspect),
            backtrace: self.backtrace(),
        }
    }
}

/// `(a, b)` for arguments, `" {}"` when a block was given.
pub(crate) fn format_args_and_block(args: &[String], block: bool) -> String {
    let mut out = String::new();
    if !args.is_empty() {
        let args: Vec<String> = args.iter().map(|a| shorten(a.clone())).collect();
        out.push('(');
        out.push_str(&args.join(", "));
        out.push(')');
    }
    if block {
        out.push_str(" {}");
    }
    out
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl std::error::Error for Note {}

impl From<&str> for Note {
    fn from(text: &str) -> Self {
        Note::message(text)
    }
}

impl From<String> for Note {
    fn from(text: String) -> Self {
        Note::message(text)
    }
}
