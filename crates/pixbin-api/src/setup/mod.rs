//! Application setup and initialization
//!
//! Route and server wiring extracted from main.rs for better organization
//! and testability.

pub mod routes;
pub mod server;

pub use routes::setup_routes;
pub use server::start_server;
