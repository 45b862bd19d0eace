//! HTTP surface of the activation engine.
//!
//! # Endpoints
//!
//! - `GET  /health`     - Liveness probe
//! - `POST /signals`    - Deliver a signal to its destination behaviour
//! - `GET  /behaviours` - List bound behaviours

pub mod routes;

pub use routes::{app_router, AppState};
