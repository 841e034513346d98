//! Book catalog conversions from CSV tables into JSON and XML documents.

use tracing::debug;

use crate::error::{Error, Result};
use crate::json::JsonDocument;
use crate::table::{Record, Table};
use crate::tree::Mapping;
use crate::xml::XmlDocument;

/// Column order expected by [`table_to_xml`].
pub const BOOK_COLUMNS: [&str; 4] = ["title", "author", "year", "publisher"];

/// One top-level entry per record, keyed by `key_column`, holding the
/// remaining columns. A later record with the same key overwrites the earlier.
pub fn records_to_json(records: &[Record], key_column: &str) -> Result<JsonDocument> {
    let mut doc = JsonDocument::new();
    for rec in records {
        let key = rec
            .get(key_column)
            .ok_or_else(|| Error::KeyNotFound(key_column.to_string()))?;
        let fields: Mapping = rec
            .iter()
            .filter(|(k, _)| k.as_str() != key_column)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        doc.add_element(key.clone(), fields);
    }
    debug!(books = doc.root().len(), "built json catalog");
    Ok(doc)
}

/// One `<book>` per row, taking the first four fields positionally as
/// title, author, year and publisher. Short rows get empty fields.
pub fn table_to_xml(table: &Table, doc: &mut XmlDocument) -> usize {
    for row in &table.rows {
        let field = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
        doc.add_book(field(0), field(1), field(2), field(3));
    }
    debug!(books = table.rows.len(), "built xml catalog");
    table.rows.len()
}
