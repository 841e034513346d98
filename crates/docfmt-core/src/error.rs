use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("malformed json: {0}")]
    MalformedJson(String),
    #[error("malformed xml: {0}")]
    MalformedXml(String),
    #[error("key does not exist: {0}")]
    KeyNotFound(String),
    /// `segment` is the first key that could not be resolved; `path` is the
    /// walked prefix up to and including it.
    #[error("path does not exist: {path} (missing '{segment}')")]
    PathNotFound { segment: String, path: String },
    #[error("segment '{segment}' holds a scalar, not a mapping")]
    NotAMapping { segment: String },
    #[error("empty path")]
    EmptyPath,
    #[error("invalid xpath query '{query}': {reason}")]
    InvalidQuery { query: String, reason: String },
    #[error("invalid xml name: '{0}'")]
    InvalidName(String),
    #[error("element reference no longer points into the document")]
    StaleElement,
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("collaborator failed: {0}")]
    Collaborator(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::MalformedJson(e.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::MalformedXml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Error::MalformedXml(e.to_string())
    }
}
