//! HTTP API for the disease detector.
//!
//! `api_router()` returns a composable `Router` with the health probe,
//! the vocabulary listing and `/predict`, wrapped in CORS and access
//! logging. `server` binds it and owns the shutdown channel.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
