//! docfmt-core: tree store, nested path editing, and file-format helpers
//!
//! This crate focuses on a small, well-factored surface:
//! - Ordered tree store (`Node`/`Mapping`) and nested path get/set/delete
//! - JSON document adapter over the tree store
//! - XML document adapter with an XPath subset and tree-store conversion
//! - File/directory helpers, CSV tables, zip archives
//! - Book catalog conversion (CSV → JSON / XML)
//!
pub mod archive;
pub mod catalog;
pub mod collab;
pub mod error;
pub mod files;
pub mod json;
pub mod path;
pub mod table;
pub mod tree;
pub mod xml;
mod xpath;

pub use collab::{SchemaValidator, StylesheetProcessor};
pub use error::{Error, Result};
pub use json::JsonDocument;
pub use table::{Record, Table, parse_table};
pub use tree::{Mapping, Node, Scalar};
pub use xml::{Element, ElementRef, XmlDocument, XmlOpts};
