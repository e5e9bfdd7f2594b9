#![forbid(unsafe_code)]

//! Sort and filter helpers over lists of records.
//!
//! Both helpers take a list of maps and return a new list; the input is never
//! modified.
//!
//! # Failure Modes
//!
//! Criteria whose shape does not match the data are caller errors:
//!
//! | Failure | Error |
//! |---------|-------|
//! | Input is not a list | [`QueryError::NotAList`] |
//! | A list item is not a map | [`QueryError::ItemNotAMap`] |
//! | Filter criteria is not a map | [`QueryError::CriteriaNotAMap`] |
//! | Sort field holds values of different kinds | [`QueryError::MixedKinds`] |

use std::cmp::Ordering;
use std::fmt;

use crate::value::{Map, Value};

/// Errors from query helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    NotAList(&'static str),
    ItemNotAMap { index: usize, kind: &'static str },
    CriteriaNotAMap(&'static str),
    MixedKinds { field: String },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAList(kind) => write!(f, "expected a list, found {kind}"),
            Self::ItemNotAMap { index, kind } => {
                write!(f, "list item {index} is {kind}, expected map")
            }
            Self::CriteriaNotAMap(kind) => write!(f, "filter criteria is {kind}, expected map"),
            Self::MixedKinds { field } => {
                write!(f, "sort field '{field}' holds values of different kinds")
            }
        }
    }
}

impl std::error::Error for QueryError {}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// One sort criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

impl SortKey {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }
}

fn items_as_maps(list: &Value) -> Result<Vec<&Map>, QueryError> {
    let items = list.as_list().ok_or(QueryError::NotAList(list.kind()))?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_map().ok_or(QueryError::ItemNotAMap {
                index,
                kind: item.kind(),
            })
        })
        .collect()
}

/// Numbers share a rank so ints and floats compare with each other.
fn rank(v: &Value) -> &'static str {
    match v {
        Value::Int(_) | Value::Float(_) => "number",
        other => other.kind(),
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

/// Stable multi-key sort of a list of maps.
///
/// Missing fields and `null` sort first in ascending order.
///
/// # Errors
///
/// Returns [`QueryError`] when the input is not a list of maps or a sort
/// field mixes value kinds.
pub fn sort_by(list: &Value, keys: &[SortKey]) -> Result<Value, QueryError> {
    let maps = items_as_maps(list)?;
    for key in keys {
        let mut kinds = maps
            .iter()
            .filter_map(|m| m.get(&key.field))
            .filter(|v| !v.is_null())
            .map(rank);
        if let Some(first) = kinds.next()
            && kinds.any(|k| k != first)
        {
            return Err(QueryError::MixedKinds {
                field: key.field.clone(),
            });
        }
    }

    let mut sorted = maps;
    sorted.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let ord = match (a.get(&key.field), b.get(&key.field)) {
                    (Some(x), Some(y)) if !x.is_null() && !y.is_null() => compare(x, y),
                    (Some(x), _) if !x.is_null() => Ordering::Greater,
                    (_, Some(y)) if !y.is_null() => Ordering::Less,
                    _ => Ordering::Equal,
                };
                match key.order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    Ok(Value::List(
        sorted.into_iter().map(|m| Value::Map(m.clone()).snapshot()).collect(),
    ))
}

/// Keep the maps matching every criterion.
///
/// A criterion value that is a list matches when the field equals any of its
/// elements; otherwise the field must equal the value.
///
/// # Errors
///
/// Returns [`QueryError`] when the input is not a list of maps or the
/// criteria is not a map.
pub fn filter_by(list: &Value, criteria: &Value) -> Result<Value, QueryError> {
    let wanted = criteria
        .as_map()
        .ok_or(QueryError::CriteriaNotAMap(criteria.kind()))?;
    let maps = items_as_maps(list)?;
    let kept = maps
        .into_iter()
        .filter(|item| {
            wanted.iter().all(|(field, want)| {
                let have = item.get(field).unwrap_or(&Value::Null);
                match want {
                    Value::List(options) => options.contains(have),
                    other => other == have,
                }
            })
        })
        .map(|m| Value::Map(m.clone()).snapshot())
        .collect();
    Ok(Value::List(kept))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Value {
        Value::List(vec![
            Value::from_pairs([("name", Value::from("Cy")), ("age", Value::Int(40))]),
            Value::from_pairs([("name", Value::from("Al")), ("age", Value::Int(25))]),
            Value::from_pairs([("name", Value::from("Bo")), ("age", Value::Float(25.0))]),
        ])
    }

    fn names(list: &Value) -> Vec<String> {
        list.as_list()
            .unwrap()
            .iter()
            .map(|v| v.property("name").unwrap().to_string())
            .collect()
    }

    #[test]
    fn sort_single_key() {
        let sorted = sort_by(&people(), &[SortKey::asc("name")]).unwrap();
        assert_eq!(names(&sorted), ["Al", "Bo", "Cy"]);
    }

    #[test]
    fn sort_multi_key_is_stable() {
        let sorted = sort_by(&people(), &[SortKey::desc("age"), SortKey::asc("name")]).unwrap();
        assert_eq!(names(&sorted), ["Cy", "Al", "Bo"]);
    }

    #[test]
    fn sort_rejects_mixed_kinds() {
        let mut list = people();
        if let Value::List(items) = &mut list {
            items.push(Value::from_pairs([("age", "old")]));
        }
        assert_eq!(
            sort_by(&list, &[SortKey::asc("age")]),
            Err(QueryError::MixedKinds { field: "age".into() })
        );
    }

    #[test]
    fn sort_rejects_non_list() {
        assert_eq!(
            sort_by(&Value::Int(1), &[]),
            Err(QueryError::NotAList("int"))
        );
    }

    #[test]
    fn filter_by_equality_and_options() {
        let young = filter_by(&people(), &Value::from_pairs([("age", 25)])).unwrap();
        assert_eq!(names(&young), ["Al"]);

        let some = filter_by(
            &people(),
            &Value::from_pairs([("name", Value::List(vec!["Al".into(), "Cy".into()]))]),
        )
        .unwrap();
        assert_eq!(names(&some), ["Cy", "Al"]);
    }

    #[test]
    fn filter_rejects_non_map_criteria() {
        assert_eq!(
            filter_by(&people(), &Value::list()),
            Err(QueryError::CriteriaNotAMap("list"))
        );
    }

    #[test]
    fn filter_rejects_non_map_items() {
        let list = Value::List(vec![Value::Int(1)]);
        assert_eq!(
            filter_by(&list, &Value::map()),
            Err(QueryError::ItemNotAMap { index: 0, kind: "int" })
        );
    }
}
