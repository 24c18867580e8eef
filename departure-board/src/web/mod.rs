//! Web layer for the departure board.
//!
//! Serves the board page, the board state as JSON, settings management,
//! stop search and lifecycle signals from the browser.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use templates::*;
