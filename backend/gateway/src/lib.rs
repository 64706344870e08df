//! menuscan Gateway HTTP API Server
//!
//! Provides the REST API for accounts and menus, the uploaded image server
//! and the health probe.

pub mod auth;
pub mod auth_api;
pub mod health_api;
pub mod limiter;
pub mod menus;
pub mod response;
pub mod server;
pub mod uploads;

#[cfg(test)]
mod test_support;

pub use limiter::ExtractionLimiter;
pub use response::{ApiError, ApiResponse};
pub use server::{CookieSettings, GatewayState, build_router, start_server};
