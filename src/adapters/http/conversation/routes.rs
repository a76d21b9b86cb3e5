//! HTTP routes for conversation endpoints.

use axum::{routing::post, Router};

use super::handlers::{post_message, ConversationHandlers};

/// Mounted under `/api/tenants`.
pub fn conversation_routes(handlers: ConversationHandlers) -> Router {
    Router::new()
        .route("/:tenant_id/messages", post(post_message))
        .with_state(handlers)
}
