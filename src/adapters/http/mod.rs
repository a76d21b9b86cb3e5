//! HTTP adapters - REST API.
//!
//! - `/api/tenants/:tenant_id/messages` - inbound prospect messages
//! - `/api/tenants/:tenant_id/admin`, `/bot/*` - tenant administration
//! - `/health` - liveness

pub mod conversation;
mod error;
mod health;
pub mod tenants;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::EngagementSupervisor;

pub use conversation::{conversation_routes, ConversationHandlers};
pub use error::ErrorResponse;
pub use health::{health_routes, HealthResponse};
pub use tenants::{tenant_routes, TenantHandlers};

/// Assembles the full API with request tracing and a per-request timeout.
pub fn api_router(
    conversation: ConversationHandlers,
    tenants: TenantHandlers,
    supervisor: Arc<EngagementSupervisor>,
    request_timeout: Duration,
) -> Router {
    Router::new()
        .nest(
            "/api/tenants",
            conversation_routes(conversation).merge(tenant_routes(tenants)),
        )
        .merge(health_routes(supervisor))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}
