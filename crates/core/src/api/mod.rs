//! Backend HTTP API access.
//!
//! This module provides:
//! - The `MonitorApi` trait every backend client implements
//! - `HttpMonitorApi`, the reqwest-based client
//! - `MockMonitorApi`, a scripted in-memory backend for tests

pub mod client;
pub mod error;
pub mod http;
pub mod mock;

pub use client::MonitorApi;
pub use error::{ApiError, ApiResult};
pub use http::HttpMonitorApi;
pub use mock::MockMonitorApi;
