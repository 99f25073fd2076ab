//! Order API Module
//!
//! Intake, listing, status transitions and terminal-status deletion.
//! All mutations publish on the event bus after their commit.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // Intake (customer auth) + listing (operator auth)
        .route("/", post(handler::create).get(handler::list))
        // Detail (owner or operator), soft delete (operator, terminal only)
        .route("/{id}", get(handler::get_by_id).delete(handler::delete))
        // Lifecycle transition (operator auth)
        .route("/{id}/status", post(handler::transition_status))
}
