/// Canvas Hub - multi-tenant admin API
///
/// Manages the records behind the admin screens (subscriptions, payments,
/// content, templates, KYC cases, notifications and invoices) with one shared
/// filter, status-transition and aggregate pattern.

pub mod admin;
pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod rate_limit;
pub mod server;

pub use context::AppContext;
pub use error::{HubError, HubResult};
