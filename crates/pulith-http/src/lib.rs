//! Transport-agnostic HTTP client core.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Request options, response envelopes, headers, cancellation
//! - [`core`] - Pure transformations (body encoding, media types, redirects)
//! - [`effects`] - I/O with trait abstraction (adapters, draining, dispatch)
//!
//! # Key Features
//!
//! - **Pluggable Transport**: anything implementing [`HttpClientAdapter`] can
//!   carry requests; [`ReqwestAdapter`] is provided behind the `reqwest` feature
//! - **One-Shot Bodies**: a [`ResponseBody`] stream can be taken exactly once
//! - **Raced Draining**: completion, receive timeout and cancellation race,
//!   first to settle wins
//! - **Mechanism-Only**: no retries, pooling or interceptors; callers own policy

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use data::{
    BoxStream, ByteStream, CancelToken, Headers, RedirectRecord, RequestData, RequestOptions,
    ResponseBody, ResponseData, ResponseType,
};
pub use effects::{DefaultTransformer, Dispatcher, HttpClientAdapter, Transformer, drain};
#[cfg(feature = "reqwest")]
pub use effects::{ReqwestAdapter, ReqwestAdapterOptions};
pub use error::{BoxError, Error, Result};
