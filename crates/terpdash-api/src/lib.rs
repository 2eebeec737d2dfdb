//! terpdash-api: HTTP API layer for terpdash
//!
//! Exposes the registry, dashboard, app directory, wallet session and bridge
//! transfer flow as JSON endpoints for the frontend.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::{AppState, StateError};
