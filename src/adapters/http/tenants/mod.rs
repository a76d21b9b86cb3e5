//! HTTP adapter for tenant administration.

mod dto;
mod handlers;
mod routes;

pub use dto::{AdminRegisteredResponse, BotStatusResponse, RegisterAdminRequest};
pub use handlers::TenantHandlers;
pub use routes::tenant_routes;
