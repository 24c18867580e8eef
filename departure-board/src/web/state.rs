//! Application state for the web layer.

use crate::board::Board;
use crate::efa::TransitSource;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
pub struct AppState<S> {
    /// The polling coordinator, which also owns settings and the source
    pub board: Board<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            board: self.board.clone(),
        }
    }
}

impl<S: TransitSource> AppState<S> {
    /// Create a new app state.
    pub fn new(board: Board<S>) -> Self {
        Self { board }
    }
}
