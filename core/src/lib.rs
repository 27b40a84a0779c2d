//! Async API client core for the agency marketing site and its admin panel.
//!
//! # Overview
//! Wraps every backend resource (about, values, testimonials, service cards,
//! service details, clients, hero, settings, contact messages, analytics) in a
//! typed async method on `SiteClient`. Page and admin consumers call these
//! methods and render the results.
//!
//! # Design
//! - `SessionStore` is the single owner of the bearer token and visitor id.
//! - `Transport` attaches the token to every request and turns a 401 into a
//!   cleared session plus a navigation to the login route, while still
//!   returning the error to the caller.
//! - Each backend call is a static `Operation` in `catalog`; its
//!   `PayloadKind` alone decides between JSON and multipart encoding.
//! - `HttpBackend` separates request shaping from I/O, so the whole pipeline
//!   runs against an in-process backend in tests.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod assets;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod operation;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use assets::resolve_asset_url;
pub use client::{SiteClient, DEFAULT_ANALYTICS_DAYS, DEFAULT_TRACK_PATH};
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody, Upload};
pub use operation::{Operation, PayloadKind};
pub use session::{FileStorage, MemoryStorage, SessionStorage, SessionStore, StorageError};
pub use transport::{HttpBackend, Navigator, ReqwestBackend, Target, TracingNavigator, Transport, LOGIN_ROUTE};
