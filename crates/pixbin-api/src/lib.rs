//! Pixbin API Library
//!
//! This crate provides the HTTP handlers, upload admission pipeline, and
//! application setup for the pixbin image hosting service.

// Module declarations
mod api_doc;

// Public modules
pub mod error;
pub mod handlers;
pub mod limits;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;

// Re-exports
pub use error::ErrorResponse;
pub use state::AppState;
