//! Core library for the PayLater terminal client.
//!
//! This crate contains everything that is not presentation:
//!
//! - `auth`: credential persistence and the session controller
//! - `api`: the session-scoped HTTP client for the PayLater service
//! - `models`: wire types for users, merchants, transactions, paybacks and reports
//! - `dashboard`: display figures derived from fetched data
//! - `config`: application configuration
//! - `utils`: formatting and filtering helpers

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{Credential, CredentialStore, Session, SessionEvent, SessionState};
pub use config::Config;
