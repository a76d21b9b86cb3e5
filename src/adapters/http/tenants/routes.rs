//! HTTP routes for tenant administration.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{bot_status, register_admin, start_bot, stop_bot, TenantHandlers};

/// Mounted under `/api/tenants`.
pub fn tenant_routes(handlers: TenantHandlers) -> Router {
    Router::new()
        .route("/:tenant_id/admin", post(register_admin))
        .route("/:tenant_id/bot", get(bot_status))
        .route("/:tenant_id/bot/start", post(start_bot))
        .route("/:tenant_id/bot/stop", post(stop_bot))
        .with_state(handlers)
}
