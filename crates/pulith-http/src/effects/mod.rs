//! I/O layer: the transport abstraction, the response pipeline and the
//! request dispatcher.

mod adapter;
mod dispatcher;
#[cfg(feature = "reqwest")]
mod reqwest_adapter;
mod transformer;

pub use adapter::HttpClientAdapter;
pub use dispatcher::Dispatcher;
pub use transformer::{DefaultTransformer, Transformer, drain};

#[cfg(feature = "reqwest")]
pub use reqwest_adapter::{ReqwestAdapter, ReqwestAdapterOptions};
