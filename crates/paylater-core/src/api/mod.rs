//! REST API client module for the PayLater service.
//!
//! This module provides the `ApiClient` for communicating with the
//! PayLater HTTP API: authentication, merchants, transactions, paybacks
//! and reports.
//!
//! The API uses JWT bearer token authentication obtained from `/auth/login`.
//! A 401 on any protected route expires the shared session.

pub mod client;
pub mod error;

pub use client::{Access, ApiClient};
pub use error::ApiError;
