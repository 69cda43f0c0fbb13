//! Remote listing access.
//!
//! A `PageSource` returns the raw content of one listing page. Sources never
//! retry on their own; a failed page is reported to the caller and the caller
//! decides what to do with it.

mod http;
mod types;

pub use http::HttpPageSource;
pub use types::*;
