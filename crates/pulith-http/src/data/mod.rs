//! Data layer: request options, response envelopes, headers and the
//! cancellation signal.

pub mod cancel;
pub mod headers;
pub mod options;
pub mod response;

pub use cancel::CancelToken;
pub use headers::Headers;
pub use options::{
    JsonDecoder, ProgressCallback, RequestData, RequestOptions, ResponseDecoder, ResponseType,
};
pub use response::{BoxStream, ByteStream, CHUNK_SIZE, RedirectRecord, ResponseBody, ResponseData};
