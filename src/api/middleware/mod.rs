//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Access log: method, path, final status, latency
//! 2. Preflight status: CORS preflight answers become 204
//! 3. CORS (`tower_http::cors::CorsLayer`, configured in `router`)

pub mod access_log;
pub mod preflight;
