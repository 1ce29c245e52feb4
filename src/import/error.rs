use std::path::PathBuf;
use thiserror::Error;

/// Problems with the content being imported. Recoverable and shown to the user.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid format")]
    InvalidFormat,
    #[error("unknown version of data: {0}")]
    UnknownVersion(String),
    #[error("attribute '{attribute}' is not a number: '{value}'")]
    MalformedNumber { attribute: &'static str, value: String },
    #[error("element <{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("puzzle has no board data")]
    EmptyBoard,
    #[error("no puzzles found")]
    NoPuzzlesFound,
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Failures reaching or reading the import origin.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("invalid URI: {0}")]
    InvalidUri(String),
    #[error("unsupported URI scheme: {0}")]
    UnsupportedScheme(String),
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),
}

/// Contract breaches between adapters, decoders and the session.
#[derive(Debug, Error)]
pub enum InvariantViolation {
    #[error("puzzle declared before any folder")]
    NoCurrentFolder,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("import cancelled")]
    Cancelled,
}

impl From<quick_xml::Error> for ImportError {
    fn from(value: quick_xml::Error) -> Self {
        ImportError::Format(FormatError::Xml(value))
    }
}
