use std::future::Future;

use crate::data::{ByteStream, CancelToken, RequestOptions, ResponseBody};
use crate::error::Result;

/// Transport abstraction.
///
/// The core never talks to sockets itself; any transport that can turn a
/// [`RequestOptions`] plus a lazy body into a [`ResponseBody`] can be plugged
/// in.
///
/// # Contract
///
/// - `request_body` is `Some` for body-carrying methods with a payload. It may
///   be empty. Implementations stream from it instead of collecting it first;
///   send progress fires as it is polled.
/// - When `cancel` settles before `fetch` completes, the in-flight operation is
///   aborted and `fetch` fails with [`Error::Cancelled`].
/// - Response headers are stored through [`Headers`], so lookups are
///   case-insensitive.
/// - Followed redirects are appended to [`ResponseBody::redirects`] and set
///   [`ResponseBody::is_redirect`].
/// - The returned body stream has not been read.
///
/// # Implementations
///
/// - [`ReqwestAdapter`]: production implementation using `reqwest`
/// - Mock implementations for testing
///
/// [`Error::Cancelled`]: crate::Error::Cancelled
/// [`Headers`]: crate::Headers
/// [`ReqwestAdapter`]: crate::ReqwestAdapter
pub trait HttpClientAdapter: Send + Sync {
    fn fetch(
        &self,
        options: &RequestOptions,
        request_body: Option<ByteStream>,
        cancel: Option<CancelToken>,
    ) -> impl Future<Output = Result<ResponseBody>> + Send;

    /// Release transport resources.
    ///
    /// `force` aborts in-flight operations immediately; otherwise new work is
    /// refused and pending work is allowed to finish first.
    fn close(&self, force: bool) -> impl Future<Output = ()> + Send;
}
