//! yd-http: reqwest adapter for the yd Yandex.Disk client
//!
//! This crate provides the implementation of the `Transport` trait
//! using the reqwest crate. It is the only crate that directly
//! depends on an HTTP library.

pub mod transport;

pub use transport::HttpTransport;
