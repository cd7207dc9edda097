//! Error types for pulith-http.

use std::time::Duration;

use thiserror::Error;

/// Opaque error produced by an adapter or a user-supplied decoder.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("header `{name}` has {count} values, expected a single one")]
    AmbiguousHeader { name: String, count: usize },

    #[error("receive timeout after {0:?}")]
    ReceiveTimeout(Duration),

    #[error("send timeout after {0:?}")]
    SendTimeout(Duration),

    #[error("request cancelled: {0}")]
    Cancelled(String),

    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("decode error: {0}")]
    Decode(#[source] BoxError),

    #[error("adapter is closed")]
    AdapterClosed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an adapter-originated failure without reinterpreting it.
    pub fn transport(err: impl Into<BoxError>) -> Self { Error::Transport(err.into()) }

    /// Returns `true` if this failure originated from a settled [`CancelToken`].
    ///
    /// [`CancelToken`]: crate::CancelToken
    pub fn is_cancellation(&self) -> bool { matches!(self, Error::Cancelled(_)) }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::ReceiveTimeout(_) | Error::SendTimeout(_))
    }
}
