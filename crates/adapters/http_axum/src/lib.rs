//! # formgate-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for the host's command layer
//!   (`/api/conditions/evaluate`, `/api/forms/run`, `/api/units`, …)
//! - Accept editor view reports (`PUT /api/workspace`)
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map application results and errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `formgate-app` (for port traits and services) and `formgate-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
