#![forbid(unsafe_code)]

//! Structured values held by the model store.
//!
//! A [`Value`] is a tree of primitives, ordered lists, and string-keyed maps.
//! Maps may also carry [`Callback`] entries (helpers attached to state by
//! application code), but callbacks never travel through the store: every
//! value that enters or leaves a record goes through [`Value::snapshot`].
//!
//! # Invariants
//!
//! 1. `snapshot()` shares nothing with its source. Mutating either side never
//!    affects the other.
//! 2. `snapshot()` drops callbacks: map entries holding a callback are
//!    omitted, list slots holding a callback become `Null`, and a top-level
//!    callback becomes `Null`.
//! 3. Equality is structural. Two callbacks are equal only when they share
//!    the same function allocation.
//!
//! # JSON
//!
//! [`Value::to_json`] and `From<serde_json::Value>` convert at the
//! persistence boundary. Non-finite floats serialize as `null`.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// String-keyed map of values, ordered by key.
pub type Map = BTreeMap<String, Value>;

/// A function attached to a value tree.
///
/// Callbacks are carried by application state but excluded from snapshots.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&[Value]) -> Value>);

impl Callback {
    /// Wrap a function as a callback value.
    pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// A structured value.
///
/// Equality treats every NaN as equal to every other NaN, so writing NaN
/// over NaN is a no-op like any other identical write.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Map),
    Callback(Callback),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Callback(a), Self::Callback(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// An empty map value.
    #[must_use]
    pub fn map() -> Self {
        Self::Map(Map::new())
    }

    /// An empty list value.
    #[must_use]
    pub fn list() -> Self {
        Self::List(Vec::new())
    }

    /// Build a map value from key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Callback(_) => "callback",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Whether the value can be addressed by property segments.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }

    /// Look up a single property: a map key, or a list index.
    #[must_use]
    pub fn property(&self, segment: &str) -> Option<&Value> {
        match self {
            Self::Map(map) => map.get(segment),
            Self::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Disconnected structural copy with callbacks removed.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        match self {
            Self::Callback(_) => Self::Null,
            Self::List(items) => Self::List(items.iter().map(Value::snapshot).collect()),
            Self::Map(map) => Self::Map(
                map.iter()
                    .filter(|(_, v)| !matches!(v, Self::Callback(_)))
                    .map(|(k, v)| (k.clone(), v.snapshot()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Convert to JSON, applying the same callback exclusion as `snapshot()`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Null | Self::Callback(_) => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => Json::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Self::Str(s) => Json::String(s.clone()),
            Self::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Self::Map(map) => Json::Object(
                map.iter()
                    .filter(|(_, v)| !matches!(v, Self::Callback(_)))
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Self::Str(s),
            Json::Array(items) => Self::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Map(map)
    }
}

impl From<Callback> for Value {
    fn from(cb: Callback) -> Self {
        Self::Callback(cb)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::Callback(_) => f.write_str("<callback>"),
            Self::List(_) | Self::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_equals_nan() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_eq!(Value::Float(0.0), Value::Float(-0.0));
        assert_ne!(Value::Float(1.0), Value::Int(1));
    }

    fn sample() -> Value {
        Value::from_pairs([
            ("name", Value::from("Ada")),
            (
                "tags",
                Value::List(vec![
                    "a".into(),
                    Value::Callback(Callback::new(|_| Value::Null)),
                ]),
            ),
            ("format", Value::Callback(Callback::new(|_| "x".into()))),
            ("nested", Value::from_pairs([("depth", 2)])),
        ])
    }

    #[test]
    fn snapshot_drops_callback_entries() {
        let snap = sample().snapshot();
        let map = snap.as_map().unwrap();
        assert!(!map.contains_key("format"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn snapshot_nulls_callbacks_in_lists() {
        let snap = sample().snapshot();
        assert_eq!(
            snap.property("tags"),
            Some(&Value::List(vec!["a".into(), Value::Null]))
        );
    }

    #[test]
    fn snapshot_top_level_callback_is_null() {
        let cb = Value::Callback(Callback::new(|_| Value::Null));
        assert_eq!(cb.snapshot(), Value::Null);
    }

    #[test]
    fn snapshot_is_disconnected() {
        let original = sample();
        let mut copy = original.snapshot();
        copy.as_map_mut()
            .unwrap()
            .insert("name".into(), "Grace".into());
        assert_eq!(original.property("name"), Some(&Value::from("Ada")));
    }

    #[test]
    fn callbacks_compare_by_identity() {
        let cb = Callback::new(|_| Value::Null);
        let same = cb.clone();
        let other = Callback::new(|_| Value::Null);
        assert_eq!(cb, same);
        assert_ne!(cb, other);
        assert_eq!(same.call(&[]), Value::Null);
    }

    #[test]
    fn property_reads_list_indices() {
        let list = Value::List(vec![1.into(), 2.into()]);
        assert_eq!(list.property("1"), Some(&Value::Int(2)));
        assert_eq!(list.property("2"), None);
        assert_eq!(list.property("x"), None);
        assert_eq!(Value::Int(3).property("0"), None);
    }

    #[test]
    fn json_round_trip_excludes_callbacks() {
        let json = sample().to_json();
        assert!(json.get("format").is_none());
        let back = Value::from(json);
        assert_eq!(back, sample().snapshot());
    }

    #[test]
    fn json_non_finite_float_is_null() {
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn json_numbers_keep_integer_kind() {
        let v = Value::from(serde_json::json!({"n": 3, "x": 1.5}));
        assert_eq!(v.property("n"), Some(&Value::Int(3)));
        assert_eq!(v.property("x"), Some(&Value::Float(1.5)));
    }

    #[test]
    fn display_scalars_and_containers() {
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::Int(4).to_string(), "4");
        assert_eq!(Value::List(vec![1.into()]).to_string(), "[1]");
    }

    #[test]
    fn option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::from("a"));
    }
}
