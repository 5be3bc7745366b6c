//! HTTP-shaped models exchanged between the app, the cache manager and the
//! network.
//!
//! - `Request`: method, absolute URL and request mode
//! - `Response`: status, headers and body bytes
//! - `Served`: a response tagged with the tier that produced it

pub mod request;
pub mod response;

pub use request::{Request, RequestMode};
pub use response::{Response, ResponseSource, Served};
