use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

/// Externally owned cancellation signal.
///
/// Clones share state. The signal settles once: the first [`cancel`] wins and
/// its reason is kept, later calls are ignored.
///
/// [`cancel`]: CancelToken::cancel
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    token:  CancellationToken,
    reason: Arc<OnceLock<String>>,
}

impl CancelToken {
    pub fn new() -> Self { Self::default() }

    /// Request cancellation. Returns `false` if already cancelled.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        if self.reason.set(reason.into()).is_err() {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_cancelled(&self) -> bool { self.token.is_cancelled() }

    pub fn reason(&self) -> Option<&str> { self.reason.get().map(String::as_str) }

    /// Resolves with the reason once cancellation is requested.
    pub async fn cancelled(&self) -> String {
        self.token.cancelled().await;
        self.reason().unwrap_or("cancelled").to_string()
    }
}
