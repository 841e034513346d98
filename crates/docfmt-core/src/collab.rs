//! Seams for external XML tooling (XSD validation, XSLT transformation).
//!
//! The adapters only hand over the serialized document; the work itself is
//! done by whatever implements these traits. Closures with the matching
//! signature implement them directly.

use std::path::Path;

use crate::error::Result;

pub trait SchemaValidator {
    /// Validates serialized XML against the schema at `schema`.
    fn validate(&self, xml: &str, schema: &Path) -> Result<bool>;
}

pub trait StylesheetProcessor {
    /// Applies the stylesheet at `stylesheet` and returns the output bytes.
    fn transform(&self, xml: &str, stylesheet: &Path) -> Result<Vec<u8>>;
}

impl<F> SchemaValidator for F
where
    F: Fn(&str, &Path) -> Result<bool>,
{
    fn validate(&self, xml: &str, schema: &Path) -> Result<bool> {
        self(xml, schema)
    }
}

impl<F> StylesheetProcessor for F
where
    F: Fn(&str, &Path) -> Result<Vec<u8>>,
{
    fn transform(&self, xml: &str, stylesheet: &Path) -> Result<Vec<u8>> {
        self(xml, stylesheet)
    }
}
