//! Route definitions for the REST API.

mod health;
mod memos;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Memo operations
        .route("/api/memo", post(memos::create_memo))
        .route(
            "/api/memo/:id",
            get(memos::get_memo).put(memos::update_memo),
        )
        // Attach state
        .with_state(state)
}

pub use health::*;
pub use memos::*;
