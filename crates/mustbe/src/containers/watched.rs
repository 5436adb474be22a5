//! Continuously validated containers.

use super::registry::{ContainerAdapter, Introduced, Mutation, adapter_for};
use super::{
    ContentCases, ContentCheck, MUST_NEVER_EVER_CONTAIN_PREFIX, MUST_ONLY_EVER_CONTAIN_PREFIX,
    check_contents,
};
use crate::channel;
use crate::error::{Result, UsageError};
use crate::inspect::Inspect;
use crate::note::format_args_and_block;
use crate::trace::Trace;
use crate::value::{Kind, Value};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// A container whose contents are re-validated after every mutation made
/// through it.
///
/// Created by `must_only_ever_contain` / `must_never_ever_contain`. A
/// container watched while assertions were disabled stays inert: its
/// mutations are applied but never checked. Mutations made while assertions
/// are disabled are not checked either.
pub struct Watched {
    container: Value,
    cases: ContentCases,
    negate: bool,
    adapter: Arc<dyn ContainerAdapter>,
    origin: Arc<Trace>,
    active: bool,
}

impl Watched {
    pub(crate) fn install(container: Value, cases: ContentCases, negate: bool) -> Result<Self> {
        let kind = container.kind();
        let adapter =
            adapter_for(&kind).ok_or_else(|| UsageError::Unregistered(kind.name().to_string()))?;
        let watched = Self {
            container,
            cases,
            negate,
            adapter,
            origin: Arc::new(Trace::capture()),
            active: channel::is_enabled(),
        };
        if watched.active {
            watched.revalidate()?;
        }
        Ok(watched)
    }

    pub fn value(&self) -> &Value {
        &self.container
    }

    pub fn into_inner(self) -> Value {
        self.container
    }

    pub fn kind(&self) -> Kind {
        self.container.kind()
    }

    pub fn cases(&self) -> &ContentCases {
        &self.cases
    }

    pub fn negate(&self) -> bool {
        self.negate
    }

    /// Where the container was put under validation.
    pub fn origin(&self) -> &Arc<Trace> {
        &self.origin
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn prefix(&self) -> &'static str {
        if self.negate {
            MUST_NEVER_EVER_CONTAIN_PREFIX
        } else {
            MUST_ONLY_EVER_CONTAIN_PREFIX
        }
    }

    /// Replace the cases and validate the current contents against them.
    pub fn set_cases(&mut self, cases: impl Into<ContentCases>) -> Result<()> {
        self.cases = cases.into();
        if self.active {
            self.revalidate()?;
        }
        Ok(())
    }

    fn check(&self) -> ContentCheck<'_> {
        ContentCheck::new(&self.container, self.negate, self.prefix()).with_origin(&self.origin)
    }

    fn revalidate(&self) -> Result<()> {
        let prefix = self.prefix();
        channel::check_with(
            || check_contents(&self.check(), &self.cases),
            |mut note| {
                note.set_prefix(prefix);
                note
            },
        )
    }

    /// Apply `mutation`, then check what it introduced. A failure is
    /// notified with a prefix naming the operation, e.g.
    /// `must_only_ever_contain: List#push(:x)`.
    ///
    /// The mutation stays applied even when the note is raised.
    pub fn mutate(&mut self, mutation: Mutation<'_>) -> Result<()> {
        let name = mutation.name();
        let adapter = Arc::clone(&self.adapter);
        if !self.active
            || !channel::is_enabled()
            || !adapter.mutators().iter().any(|m| *m == name)
        {
            adapter.on_mutate(&mut self.container, mutation)?;
            return Ok(());
        }

        let call = format!(
            "{}#{name}{}",
            self.container.kind(),
            format_args_and_block(&mutation.args(), mutation.has_block())
        );
        let prefix = format!("{}{call}\n", self.prefix());
        channel::check_with(
            || {
                let introduced = adapter.on_mutate(&mut self.container, mutation)?;
                self.check_introduced(introduced)
            },
            |mut note| {
                note.set_prefix(prefix);
                note
            },
        )
    }

    fn check_introduced(&self, introduced: Introduced) -> Result<()> {
        let check = self.check();
        match introduced {
            Introduced::Nothing => Ok(()),
            Introduced::Member(member) => {
                check.member(&member, self.cases.member_cases(&self.container)?)
            }
            Introduced::Members(members) => {
                let cases = self.cases.member_cases(&self.container)?;
                for member in &members {
                    check.member(member, cases)?;
                }
                Ok(())
            }
            Introduced::Batch(members) => {
                let batch = Value::List(members);
                check_contents(&check.for_container(&batch), &self.cases)
            }
            Introduced::Pair(key, value) => {
                check.pair(&key, &value, self.cases.pair_specs(&self.container)?)
            }
            Introduced::Everything => check_contents(&check, &self.cases),
        }
    }

    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        self.mutate(Mutation::Push(value.into()))
    }

    pub fn extend<I, T>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.mutate(Mutation::Extend(values.into_iter().map(Into::into).collect()))
    }

    pub fn prepend<I, T>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.mutate(Mutation::Prepend(values.into_iter().map(Into::into).collect()))
    }

    pub fn insert_at<I, T>(&mut self, index: usize, values: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.mutate(Mutation::InsertAt(
            index,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.mutate(Mutation::Set(index, value.into()))
    }

    pub fn splice<I, T>(&mut self, range: Range<usize>, values: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.mutate(Mutation::Splice(
            range,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn fill(&mut self, value: impl Into<Value>) -> Result<()> {
        self.mutate(Mutation::Fill(value.into()))
    }

    pub fn fill_with(&mut self, f: impl FnMut(usize) -> Value) -> Result<()> {
        self.mutate(Mutation::FillWith(Box::new(f)))
    }

    pub fn map_in_place(&mut self, f: impl FnMut(&Value) -> Value) -> Result<()> {
        self.mutate(Mutation::MapInPlace(Box::new(f)))
    }

    pub fn flatten(&mut self) -> Result<()> {
        self.mutate(Mutation::Flatten)
    }

    pub fn replace(&mut self, value: impl Into<Value>) -> Result<()> {
        self.mutate(Mutation::Replace(value.into()))
    }

    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        self.mutate(Mutation::Insert(key.into(), value.into()))
    }

    pub fn merge<I, K, V>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        self.mutate(Mutation::Merge(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    pub fn set_field(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.mutate(Mutation::SetField(field.into(), value.into()))
    }

    /// A kind-specific operation understood by the registered adapter.
    pub fn call(&mut self, name: impl Into<String>, args: Vec<Value>) -> Result<()> {
        self.mutate(Mutation::Call {
            name: name.into(),
            args,
        })
    }
}

impl fmt::Debug for Watched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watched")
            .field("container", &self.container)
            .field("cases", &self.cases)
            .field("negate", &self.negate)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Inspect for Watched {
    fn inspect(&self) -> String {
        self.container.inspect()
    }
}
