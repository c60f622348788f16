//! Local HTTP API for health, readiness, stats, and metrics.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
