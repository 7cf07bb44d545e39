//! Sentry Cloud API Module
//! REST surface over the request analysis engine

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::{AppState, ServerEngine};
pub use middleware::start_cleanup_task;
pub use routes::create_router;
pub use types::*;
