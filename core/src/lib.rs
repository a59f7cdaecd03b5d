//! Blocking HTTP facade for mobile hosts.
//!
//! # Overview
//! `Courier` issues GET/POST/PUT/DELETE requests, posts multipart forms and
//! raw files, and downloads resized images to local storage. Every call is a
//! single synchronous attempt: a 200 response succeeds, anything else is an
//! error carrying the status.
//!
//! # Design
//! - `request` holds pure `build_*` / `parse_*` functions, so request shape
//!   and status handling are testable without a network.
//! - `Transport` is the only I/O seam; `UreqTransport` implements it with a
//!   single pooled `ureq::Agent`.
//! - The client is an explicit value configured by `ClientConfig` and shared
//!   by reference. Timeouts default to 30 seconds.
//! - Image decoding is left to the host through `BodyDecoder`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod multipart;
pub mod request;
pub mod transport;

pub use client::{copy_stream, BodyDecoder, Courier, BUFFER_SIZE};
pub use config::ClientConfig;
pub use error::{RequestError, RequestResult};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody};
pub use multipart::MultipartForm;
pub use request::ImageSize;
pub use transport::{Transport, UreqTransport};
