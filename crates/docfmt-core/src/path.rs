//! Nested path access over the tree store.
//!
//! - A path is an ordered list of keys, outermost first.
//! - `get` treats absence as a normal outcome (`None`).
//! - `set` creates missing intermediate mappings but refuses to replace a
//!   scalar that sits in the middle of the path.
//! - `delete` reports the first missing intermediate segment.
//!
//! Text form (`split_path`) uses `/` separators with RFC 6901 style escapes.

use crate::error::{Error, Result};
use crate::tree::{Mapping, Node};

pub fn get<'a, K: AsRef<str>>(root: &'a Mapping, path: &[K]) -> Option<&'a Node> {
    let (last, parents) = path.split_last()?;
    let mut cur = root;
    for key in parents {
        cur = cur.get(key.as_ref())?.as_mapping()?;
    }
    cur.get(last.as_ref())
}

pub fn get_mut<'a, K: AsRef<str>>(root: &'a mut Mapping, path: &[K]) -> Option<&'a mut Node> {
    let (last, parents) = path.split_last()?;
    let mut cur = root;
    for key in parents {
        cur = cur.get_mut(key.as_ref())?.as_mapping_mut()?;
    }
    cur.get_mut(last.as_ref())
}

pub fn set<K: AsRef<str>>(root: &mut Mapping, path: &[K], value: Node) -> Result<()> {
    let (last, parents) = path.split_last().ok_or(Error::EmptyPath)?;
    let mut cur = root;
    for key in parents {
        let key = key.as_ref();
        // A scalar can only be met before anything was created, so failing
        // here leaves the tree untouched.
        cur = cur
            .child_mapping_or_insert(key)
            .ok_or_else(|| Error::NotAMapping {
                segment: key.to_string(),
            })?;
    }
    cur.insert(last.as_ref(), value);
    Ok(())
}

/// Removes the value at `path`. An absent final key is a no-op.
pub fn delete<K: AsRef<str>>(root: &mut Mapping, path: &[K]) -> Result<()> {
    let (last, parents) = path.split_last().ok_or(Error::EmptyPath)?;
    let mut cur = root;
    for (i, key) in parents.iter().enumerate() {
        let key = key.as_ref();
        cur = match cur.get_mut(key).and_then(Node::as_mapping_mut) {
            Some(m) => m,
            None => {
                return Err(Error::PathNotFound {
                    segment: key.to_string(),
                    path: join_path(&parents[..=i]),
                });
            }
        };
    }
    cur.remove(last.as_ref());
    Ok(())
}

pub fn join_path<K: AsRef<str>>(path: &[K]) -> String {
    path.iter()
        .map(|k| escape_token(k.as_ref()))
        .collect::<Vec<_>>()
        .join("/")
}

/// Splits `a/b/c` (optionally with a leading `/`) into keys. `~1` decodes to
/// `/` and `~0` to `~`.
pub fn split_path(text: &str) -> Vec<String> {
    let text = text.strip_prefix('/').unwrap_or(text);
    if text.is_empty() {
        return Vec::new();
    }
    text.split('/').map(unescape_token).collect()
}

fn escape_token(tok: &str) -> String {
    let s = tok.replace('~', "~0");
    s.replace('/', "~1")
}

fn unescape_token(tok: &str) -> String {
    let s = tok.replace("~1", "/");
    s.replace("~0", "~")
}
