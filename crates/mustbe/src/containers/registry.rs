//! Continuous-validation adapters, keyed by container kind.

use super::adapters::{ListAdapter, MapAdapter};
use super::{ContentCases, ContentCheck};
use crate::error::{Result, UsageError};
use crate::inspect::Inspect;
use crate::value::{Kind, Value};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::debug;

/// Teaches the library how to read and mutate one kind of container.
pub trait ContainerAdapter: Send + Sync {
    fn kind(&self) -> Kind;

    /// Names of the mutations that re-trigger validation.
    fn mutators(&self) -> &[&'static str];

    /// Members of a sequence-like container.
    fn members(&self, container: &Value) -> Option<Vec<Value>>;

    /// Pairs of a map-like container.
    fn pairs(&self, _container: &Value) -> Option<Vec<(Value, Value)>> {
        None
    }

    /// Apply `mutation` and report what it added.
    fn on_mutate(
        &self,
        container: &mut Value,
        mutation: Mutation<'_>,
    ) -> Result<Introduced, UsageError>;

    /// Bulk check replacing the per-member / per-pair walk. `None` means
    /// "use the default walk".
    fn check_contents(&self, _check: &ContentCheck<'_>, _cases: &ContentCases) -> Option<Result<()>> {
        None
    }
}

/// A change made to a watched container.
pub enum Mutation<'a> {
    Push(Value),
    Extend(Vec<Value>),
    Prepend(Vec<Value>),
    InsertAt(usize, Vec<Value>),
    Set(usize, Value),
    /// Replace the members in the range; an empty replacement deletes.
    Splice(Range<usize>, Vec<Value>),
    Fill(Value),
    FillWith(Box<dyn FnMut(usize) -> Value + 'a>),
    MapInPlace(Box<dyn FnMut(&Value) -> Value + 'a>),
    Flatten,
    Replace(Value),
    Insert(Value, Value),
    Merge(Vec<(Value, Value)>),
    SetField(String, Value),
    /// Operation specific to a custom container kind.
    Call { name: String, args: Vec<Value> },
}

impl Mutation<'_> {
    pub fn name(&self) -> String {
        match self {
            Mutation::Push(_) => "push".into(),
            Mutation::Extend(_) => "extend".into(),
            Mutation::Prepend(_) => "prepend".into(),
            Mutation::InsertAt(..) => "insert".into(),
            Mutation::Set(..) => "set".into(),
            Mutation::Splice(..) => "splice".into(),
            Mutation::Fill(_) => "fill".into(),
            Mutation::FillWith(_) => "fill_with".into(),
            Mutation::MapInPlace(_) => "map_in_place".into(),
            Mutation::Flatten => "flatten".into(),
            Mutation::Replace(_) => "replace".into(),
            Mutation::Insert(..) => "insert".into(),
            Mutation::Merge(_) => "merge".into(),
            Mutation::SetField(field, _) => format!("{field}="),
            Mutation::Call { name, .. } => name.clone(),
        }
    }

    /// Inspected arguments, as shown in notes.
    pub fn args(&self) -> Vec<String> {
        match self {
            Mutation::Push(v) | Mutation::Fill(v) | Mutation::Replace(v) | Mutation::SetField(_, v) => {
                vec![v.inspect()]
            }
            Mutation::Extend(vs) | Mutation::Prepend(vs) => vs.iter().map(Inspect::inspect).collect(),
            Mutation::InsertAt(index, vs) => std::iter::once(index.to_string())
                .chain(vs.iter().map(Inspect::inspect))
                .collect(),
            Mutation::Set(index, v) => vec![index.to_string(), v.inspect()],
            Mutation::Splice(range, vs) => vec![
                format!("{}...{}", range.start, range.end),
                Value::List(vs.clone()).inspect(),
            ],
            Mutation::Insert(k, v) => vec![k.inspect(), v.inspect()],
            Mutation::Merge(pairs) => vec![Value::Map(pairs.clone()).inspect()],
            Mutation::Call { args, .. } => args.iter().map(Inspect::inspect).collect(),
            Mutation::FillWith(_) | Mutation::MapInPlace(_) | Mutation::Flatten => Vec::new(),
        }
    }

    pub fn has_block(&self) -> bool {
        matches!(self, Mutation::FillWith(_) | Mutation::MapInPlace(_))
    }

    /// The error an adapter returns for a mutation it does not handle.
    pub fn unsupported(&self, kind: &Kind) -> UsageError {
        UsageError::UnsupportedMutation {
            kind: kind.name().to_string(),
            operation: self.name(),
        }
    }
}

/// What a mutation added, and so what has to be checked again.
#[derive(Debug, Clone, PartialEq)]
pub enum Introduced {
    Nothing,
    /// One member, checked as part of the whole container.
    Member(Value),
    /// Several members, each checked as part of the whole container.
    Members(Vec<Value>),
    /// Members checked as a container of their own.
    Batch(Vec<Value>),
    Pair(Value, Value),
    /// Anything may have changed; check all contents.
    Everything,
}

type Registry = RwLock<HashMap<Kind, Arc<dyn ContainerAdapter>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let builtins: [Arc<dyn ContainerAdapter>; 2] = [Arc::new(ListAdapter), Arc::new(MapAdapter)];
        RwLock::new(builtins.into_iter().map(|a| (a.kind(), a)).collect())
    })
}

/// Register `adapter` for its kind.
pub fn register<A: ContainerAdapter + 'static>(adapter: A) -> Result<(), UsageError> {
    let kind = adapter.kind();
    if !kind.is_container() {
        return Err(UsageError::NotAContainerKind(kind.name().to_string()));
    }
    let mut adapters = registry().write().unwrap_or_else(PoisonError::into_inner);
    if adapters.contains_key(&kind) {
        return Err(UsageError::AlreadyRegistered(kind.name().to_string()));
    }
    debug!(target: "mustbe", kind = %kind, "registering container adapter");
    adapters.insert(kind, Arc::new(adapter));
    Ok(())
}

/// Remove and return the adapter for `kind`.
pub fn unregister(kind: &Kind) -> Option<Arc<dyn ContainerAdapter>> {
    registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(kind)
}

pub fn adapter_for(kind: &Kind) -> Option<Arc<dyn ContainerAdapter>> {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(kind)
        .cloned()
}
