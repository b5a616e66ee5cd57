//! HTTP surface of the counter
//!
//! `GET /?jsonpCallback=<name>` with a `Referer` header counts the referring
//! page and answers with a script calling `<name>` with the counters.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod ip_extractor;
pub mod jsonp;
pub mod routes;

pub use error::PixelError;
pub use routes::create_pixel_router;
