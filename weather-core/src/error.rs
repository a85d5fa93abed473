use serde_json::error::Category;
use thiserror::Error;

use crate::remote::EndpointRole;

/// A malformed or truncated wire document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    /// 1-based line of the offending input, 0 if unknown.
    pub line: usize,
    pub column: usize,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Not valid JSON.
    Syntax,
    /// Valid JSON that does not have the shape of a weather document.
    Data,
    /// The document ended early.
    Eof,
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        let kind = match err.classify() {
            Category::Eof => DecodeErrorKind::Eof,
            Category::Data => DecodeErrorKind::Data,
            Category::Syntax | Category::Io => DecodeErrorKind::Syntax,
        };

        Self {
            kind,
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

/// The remote call mechanism itself failed.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("remote endpoint disconnected")]
    Disconnected,

    #[error("remote endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("upstream weather service failed: {0}")]
    Upstream(String),

    #[error("malformed weather document: {0}")]
    Decode(#[from] DecodeError),
}

/// Why a synchronous weather call produced no answer.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    #[error("no live connection to the {0}")]
    NotConnected(EndpointRole),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Why an asynchronous weather request was not accepted.
#[derive(Debug, Clone, Error)]
pub enum Rejection {
    #[error("a request for '{pending}' is still outstanding")]
    Busy { pending: String },

    #[error("no live connection to the {0}")]
    NotConnected(EndpointRole),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("the weather client must be created inside a Tokio runtime")]
    NoRuntime,
}
