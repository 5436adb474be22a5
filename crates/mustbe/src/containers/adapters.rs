//! Built-in adapters for lists and maps.

use super::registry::{ContainerAdapter, Introduced, Mutation};
use crate::error::UsageError;
use crate::inspect::short_inspect;
use crate::value::{Kind, Value, upsert};

const LIST_MUTATORS: &[&str] = &[
    "push",
    "extend",
    "prepend",
    "insert",
    "set",
    "splice",
    "fill",
    "fill_with",
    "map_in_place",
    "flatten",
    "replace",
];

const MAP_MUTATORS: &[&str] = &["insert", "merge", "replace"];

fn not_a(kind: Kind, container: &Value) -> UsageError {
    UsageError::NotAContainer {
        value: format!("{} (expected {kind})", short_inspect(container)),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListAdapter;

impl ContainerAdapter for ListAdapter {
    fn kind(&self) -> Kind {
        Kind::List
    }

    fn mutators(&self) -> &[&'static str] {
        LIST_MUTATORS
    }

    fn members(&self, container: &Value) -> Option<Vec<Value>> {
        match container {
            Value::List(items) => Some(items.clone()),
            _ => None,
        }
    }

    fn on_mutate(
        &self,
        container: &mut Value,
        mutation: Mutation<'_>,
    ) -> Result<Introduced, UsageError> {
        let items = match container {
            Value::List(items) => items,
            other => return Err(not_a(Kind::List, other)),
        };
        let introduced = match mutation {
            Mutation::Push(value) => {
                items.push(value.clone());
                Introduced::Member(value)
            }
            Mutation::Extend(values) => {
                items.extend(values.iter().cloned());
                Introduced::Batch(values)
            }
            Mutation::Prepend(values) => {
                items.splice(0..0, values.iter().cloned());
                Introduced::Batch(values)
            }
            Mutation::InsertAt(index, values) => {
                if index > items.len() {
                    items.resize(index, Value::Nil);
                }
                items.splice(index..index, values.iter().cloned());
                Introduced::Batch(values)
            }
            Mutation::Set(index, value) => {
                if index >= items.len() {
                    items.resize(index + 1, Value::Nil);
                }
                items[index] = value.clone();
                Introduced::Member(value)
            }
            Mutation::Splice(range, values) => {
                let start = range.start.min(items.len());
                let end = range.end.clamp(start, items.len());
                items.splice(start..end, values.iter().cloned());
                Introduced::Members(values)
            }
            Mutation::Fill(value) => {
                items.iter_mut().for_each(|slot| *slot = value.clone());
                Introduced::Member(value)
            }
            Mutation::FillWith(mut f) => {
                for (index, slot) in items.iter_mut().enumerate() {
                    *slot = f(index);
                }
                Introduced::Everything
            }
            Mutation::MapInPlace(mut f) => {
                for slot in items.iter_mut() {
                    let mapped = f(slot);
                    *slot = mapped;
                }
                Introduced::Everything
            }
            Mutation::Flatten => {
                let nested = std::mem::take(items);
                flatten_into(nested, items);
                Introduced::Everything
            }
            Mutation::Replace(Value::List(values)) => {
                *items = values.clone();
                Introduced::Batch(values)
            }
            other => return Err(other.unsupported(&Kind::List)),
        };
        Ok(introduced)
    }
}

fn flatten_into(values: Vec<Value>, out: &mut Vec<Value>) {
    for value in values {
        match value {
            Value::List(nested) => flatten_into(nested, out),
            other => out.push(other),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MapAdapter;

impl ContainerAdapter for MapAdapter {
    fn kind(&self) -> Kind {
        Kind::Map
    }

    fn mutators(&self) -> &[&'static str] {
        MAP_MUTATORS
    }

    fn members(&self, _container: &Value) -> Option<Vec<Value>> {
        None
    }

    fn pairs(&self, container: &Value) -> Option<Vec<(Value, Value)>> {
        match container {
            Value::Map(pairs) => Some(pairs.clone()),
            _ => None,
        }
    }

    fn on_mutate(
        &self,
        container: &mut Value,
        mutation: Mutation<'_>,
    ) -> Result<Introduced, UsageError> {
        let pairs = match container {
            Value::Map(pairs) => pairs,
            other => return Err(not_a(Kind::Map, other)),
        };
        let introduced = match mutation {
            Mutation::Insert(key, value) => {
                upsert(pairs, key.clone(), value.clone());
                Introduced::Pair(key, value)
            }
            Mutation::Merge(others) => {
                for (key, value) in others {
                    upsert(pairs, key, value);
                }
                Introduced::Everything
            }
            Mutation::Replace(Value::Map(replacement)) => {
                *pairs = replacement;
                Introduced::Everything
            }
            other => return Err(other.unsupported(&Kind::Map)),
        };
        Ok(introduced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(values: &[i64]) -> Value {
        Value::list(values.to_vec())
    }

    #[test]
    fn push_and_extend_report_what_they_add() {
        let mut items = list(&[1]);
        let introduced = ListAdapter
            .on_mutate(&mut items, Mutation::Push(Value::Int(2)))
            .expect("list push");
        assert_eq!(introduced, Introduced::Member(Value::Int(2)));

        let introduced = ListAdapter
            .on_mutate(&mut items, Mutation::Extend(vec![Value::Int(3), Value::Int(4)]))
            .expect("list extend");
        assert_eq!(introduced, Introduced::Batch(vec![Value::Int(3), Value::Int(4)]));
        assert_eq!(items, list(&[1, 2, 3, 4]));
    }

    #[test]
    fn positional_writes_pad_with_nil() {
        let mut items = list(&[1]);
        ListAdapter
            .on_mutate(&mut items, Mutation::Set(3, Value::Int(9)))
            .expect("list set");
        assert_eq!(
            items,
            Value::list(vec![Value::Int(1), Value::Nil, Value::Nil, Value::Int(9)])
        );

        let mut items = list(&[1]);
        ListAdapter
            .on_mutate(&mut items, Mutation::InsertAt(2, vec![Value::Int(5)]))
            .expect("list insert");
        assert_eq!(items, Value::list(vec![Value::Int(1), Value::Nil, Value::Int(5)]));
    }

    #[test]
    fn prepend_splice_and_flatten() {
        let mut items = list(&[3]);
        ListAdapter
            .on_mutate(&mut items, Mutation::Prepend(vec![Value::Int(1), Value::Int(2)]))
            .expect("prepend");
        assert_eq!(items, list(&[1, 2, 3]));

        let introduced = ListAdapter
            .on_mutate(&mut items, Mutation::Splice(1..9, vec![Value::Int(7)]))
            .expect("splice");
        assert_eq!(introduced, Introduced::Members(vec![Value::Int(7)]));
        assert_eq!(items, list(&[1, 7]));

        let mut nested = Value::list(vec![Value::Int(1), list(&[2, 3]), Value::list(vec![list(&[4])])]);
        ListAdapter
            .on_mutate(&mut nested, Mutation::Flatten)
            .expect("flatten");
        assert_eq!(nested, list(&[1, 2, 3, 4]));
    }

    #[test]
    fn closures_rewrite_every_member() {
        let mut items = list(&[1, 2, 3]);
        ListAdapter
            .on_mutate(
                &mut items,
                Mutation::MapInPlace(Box::new(|v: &Value| match v {
                    Value::Int(i) => Value::Int(i * 10),
                    other => other.clone(),
                })),
            )
            .expect("map in place");
        assert_eq!(items, list(&[10, 20, 30]));

        let introduced = ListAdapter
            .on_mutate(&mut items, Mutation::FillWith(Box::new(|i| Value::from(i))))
            .expect("fill with");
        assert_eq!(introduced, Introduced::Everything);
        assert_eq!(items, list(&[0, 1, 2]));
    }

    #[test]
    fn map_insert_and_merge() {
        let mut map = Value::map([("a", 1_i64)]);
        let introduced = MapAdapter
            .on_mutate(&mut map, Mutation::Insert(Value::from("b"), Value::Int(2)))
            .expect("insert");
        assert_eq!(introduced, Introduced::Pair(Value::from("b"), Value::Int(2)));

        MapAdapter
            .on_mutate(
                &mut map,
                Mutation::Merge(vec![(Value::from("a"), Value::Int(3))]),
            )
            .expect("merge");
        assert_eq!(map, Value::map([("a", 3_i64), ("b", 2)]));
    }

    #[test]
    fn unsupported_mutations_are_usage_errors() {
        let mut map = Value::map([("a", 1_i64)]);
        let err = MapAdapter
            .on_mutate(&mut map, Mutation::Push(Value::Nil))
            .expect_err("maps do not push");
        assert_eq!(
            err,
            UsageError::UnsupportedMutation {
                kind: "Map".into(),
                operation: "push".into()
            }
        );

        let mut not_a_list = Value::Int(1);
        assert!(
            ListAdapter
                .on_mutate(&mut not_a_list, Mutation::Flatten)
                .is_err()
        );
    }
}
