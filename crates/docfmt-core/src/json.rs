use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::path;
use crate::tree::{Mapping, Node, Scalar};

/// A JSON document held as a tree-store mapping.
///
/// Empty input and `null` both load as an empty mapping. A top-level array
/// becomes a list-shaped mapping and serializes back as an array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonDocument {
    root: Mapping,
}

impl JsonDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_root(root: Mapping) -> Self {
        Self { root }
    }

    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: serde_json::Value = serde_json::from_str(text)?;
        match Node::from(value) {
            Node::Mapping(root) => Ok(Self { root }),
            Node::Scalar(Scalar::Null) => Ok(Self::new()),
            Node::Scalar(_) => Err(Error::MalformedJson(
                "top-level value must be an object or array".into(),
            )),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        let doc = Self::parse(&text)?;
        info!(path = %path.display(), keys = doc.root.len(), "loaded json document");
        Ok(doc)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let s = self.serialize(true)?;
        fs::write(path, s)?;
        info!(path = %path.display(), "saved json document");
        Ok(())
    }

    pub fn serialize(&self, pretty: bool) -> Result<String> {
        let value = serde_json::Value::from(&self.root);
        let s = if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(s)
    }

    pub fn display_json(&self) -> Result<String> {
        self.serialize(true)
    }

    pub fn root(&self) -> &Mapping {
        &self.root
    }

    pub fn into_root(self) -> Mapping {
        self.root
    }

    pub fn replace_root(&mut self, root: Mapping) {
        self.root = root;
    }

    // -------- flat (depth-1) element operations --------

    pub fn add_element(&mut self, key: impl Into<String>, value: impl Into<Node>) {
        let key = key.into();
        debug!(%key, "add element");
        self.root.insert(key, value);
    }

    pub fn update_element(&mut self, key: &str, value: impl Into<Node>) -> Result<()> {
        match self.root.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                debug!(%key, "updated element");
                Ok(())
            }
            None => Err(Error::KeyNotFound(key.to_string())),
        }
    }

    pub fn delete_element(&mut self, key: &str) -> Result<()> {
        match self.root.remove(key) {
            Some(_) => {
                debug!(%key, "deleted element");
                Ok(())
            }
            None => Err(Error::KeyNotFound(key.to_string())),
        }
    }

    pub fn get_element(&self, key: &str) -> Option<&Node> {
        self.root.get(key)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    // -------- nested path operations --------

    pub fn add_nested_element<K: AsRef<str>>(&mut self, keys: &[K], value: impl Into<Node>) -> Result<()> {
        path::set(&mut self.root, keys, value.into())?;
        debug!(path = %path::join_path(keys), "set nested element");
        Ok(())
    }

    /// `None` when any segment is missing; an empty path resolves to nothing.
    pub fn get_nested_element<K: AsRef<str>>(&self, keys: &[K]) -> Option<&Node> {
        path::get(&self.root, keys)
    }

    pub fn delete_nested_element<K: AsRef<str>>(&mut self, keys: &[K]) -> Result<()> {
        path::delete(&mut self.root, keys)?;
        debug!(path = %path::join_path(keys), "deleted nested element");
        Ok(())
    }
}
