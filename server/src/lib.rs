//! HTTP admin service for the story configuration.
//!
//! The binary in `main.rs` only reads settings, loads the store and serves
//! [`build_router`]; everything else lives here so tests can drive the
//! router directly.

pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
