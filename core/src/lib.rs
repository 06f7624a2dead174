//! Blocking client for the Healthchecks.io management API.
//!
//! # Overview
//! Lists, creates, updates, pauses and deletes checks, and lists notification
//! channels. Each call is a single synchronous HTTP round trip authenticated
//! with an `X-Api-Key` header.
//!
//! # Design
//! - `HealthchecksClient` holds only static configuration, a `Transport` and
//!   a `Logger`.
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (consumes an `HttpResponse`); the facade methods run the
//!   transport in between. Any `Transport` can be plugged in, which is how
//!   tests replay canned responses.
//! - Status >= 300 is always an error. A `{"error": ...}` body becomes
//!   `ApiError::Api`, anything else `ApiError::Decode`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod types;

pub use client::{ClientBuilder, HealthchecksClient};
pub use config::ClientConfig;
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use logger::{Logger, NoOpLogger, StandardLogger, TracingLogger};
pub use types::{Channel, Check, CheckResponse};
