//! In-memory tree store shared by the JSON and XML adapters.
//!
//! A [`Node`] is either a [`Scalar`] or an insertion-ordered [`Mapping`].
//! Sequences are mappings keyed `"0".."n-1"`; see [`Mapping::is_list`].

use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl fmt::Display for Scalar {
    /// Text form used when a scalar becomes XML text content.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Mapping(Mapping),
}

impl Node {
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            Node::Scalar(_) => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            Node::Scalar(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Node::Mapping(_))
    }
}

/// Ordered `String -> Node` map. Keys are unique; removal keeps the order of
/// the remaining entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: IndexMap<String, Node>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list-shaped mapping (`"0".."n-1"`) from `items`.
    pub fn from_list<I: IntoIterator<Item = Node>>(items: I) -> Self {
        let entries = items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert-or-overwrite. An overwritten key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Returns the child mapping under `key`, inserting an empty one when the
    /// key is absent. `None` when the key holds a scalar.
    pub(crate) fn child_mapping_or_insert(&mut self, key: &str) -> Option<&mut Mapping> {
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| Node::Mapping(Mapping::new()))
            .as_mapping_mut()
    }

    /// True for non-empty mappings keyed exactly `"0".."n-1"` in order.
    pub fn is_list(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .keys()
                .enumerate()
                .all(|(i, k)| *k == i.to_string())
    }

    /// Values in order; meaningful for list-shaped mappings.
    pub fn values(&self) -> impl Iterator<Item = &Node> {
        self.entries.values()
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = (&'a String, &'a Node);
    type IntoIter = indexmap::map::Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Mapping {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let entries = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { entries }
    }
}

impl From<Mapping> for Node {
    fn from(m: Mapping) -> Self {
        Node::Mapping(m)
    }
}

impl From<Scalar> for Node {
    fn from(s: Scalar) -> Self {
        Node::Scalar(s)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Scalar(Scalar::String(s))
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Scalar(Scalar::Number(n.into()))
    }
}

impl From<serde_json::Value> for Node {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Node::Scalar(Scalar::Null),
            serde_json::Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => Node::Scalar(Scalar::Number(n)),
            serde_json::Value::String(s) => Node::Scalar(Scalar::String(s)),
            serde_json::Value::Array(items) => {
                Node::Mapping(Mapping::from_list(items.into_iter().map(Node::from)))
            }
            serde_json::Value::Object(map) => {
                Node::Mapping(map.into_iter().collect::<Mapping>())
            }
        }
    }
}

impl From<&Node> for serde_json::Value {
    fn from(n: &Node) -> Self {
        match n {
            Node::Scalar(Scalar::Null) => serde_json::Value::Null,
            Node::Scalar(Scalar::Bool(b)) => serde_json::Value::Bool(*b),
            Node::Scalar(Scalar::Number(x)) => serde_json::Value::Number(x.clone()),
            Node::Scalar(Scalar::String(s)) => serde_json::Value::String(s.clone()),
            Node::Mapping(m) => m.into(),
        }
    }
}

impl From<&Mapping> for serde_json::Value {
    fn from(m: &Mapping) -> Self {
        if m.is_list() {
            serde_json::Value::Array(m.values().map(serde_json::Value::from).collect())
        } else {
            let mut map = serde_json::Map::with_capacity(m.len());
            for (k, v) in m {
                map.insert(k.clone(), v.into());
            }
            serde_json::Value::Object(map)
        }
    }
}
