//! HTTP handlers for tenant administration: admin registration and bot control.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::adapters::http::error::{parse_tenant_id, ErrorResponse};
use crate::application::{
    BotControlError, BotControlHandler, RegisterAdminCommand, RegisterAdminError,
    RegisterAdminHandler,
};

use super::dto::{AdminRegisteredResponse, BotStatusResponse, RegisterAdminRequest};

#[derive(Clone)]
pub struct TenantHandlers {
    register_admin: Arc<RegisterAdminHandler>,
    bot_control: Arc<BotControlHandler>,
}

impl TenantHandlers {
    pub fn new(register_admin: Arc<RegisterAdminHandler>, bot_control: Arc<BotControlHandler>) -> Self {
        Self {
            register_admin,
            bot_control,
        }
    }
}

/// POST /api/tenants/:tenant_id/admin
pub async fn register_admin(
    State(handlers): State<TenantHandlers>,
    Path(tenant_id): Path<String>,
    Json(req): Json<RegisterAdminRequest>,
) -> Response {
    let tenant_id = match parse_tenant_id(&tenant_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = RegisterAdminCommand {
        tenant_id,
        channel_id: req.channel_id,
    };
    match handlers.register_admin.handle(cmd).await {
        Ok(registered) => {
            (StatusCode::OK, Json(AdminRegisteredResponse::from(registered))).into_response()
        }
        Err(e) => register_admin_error(e),
    }
}

/// POST /api/tenants/:tenant_id/bot/start
pub async fn start_bot(State(handlers): State<TenantHandlers>, Path(tenant_id): Path<String>) -> Response {
    let tenant_id = match parse_tenant_id(&tenant_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match handlers.bot_control.start(tenant_id).await {
        Ok(status) => (StatusCode::OK, Json(BotStatusResponse::from(status))).into_response(),
        Err(e) => bot_control_error(e),
    }
}

/// POST /api/tenants/:tenant_id/bot/stop
pub async fn stop_bot(State(handlers): State<TenantHandlers>, Path(tenant_id): Path<String>) -> Response {
    let tenant_id = match parse_tenant_id(&tenant_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match handlers.bot_control.stop(tenant_id).await {
        Ok(status) => (StatusCode::OK, Json(BotStatusResponse::from(status))).into_response(),
        Err(e) => bot_control_error(e),
    }
}

/// GET /api/tenants/:tenant_id/bot
pub async fn bot_status(State(handlers): State<TenantHandlers>, Path(tenant_id): Path<String>) -> Response {
    let tenant_id = match parse_tenant_id(&tenant_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let status = handlers.bot_control.status(tenant_id).await;
    (StatusCode::OK, Json(BotStatusResponse::from(status))).into_response()
}

fn register_admin_error(error: RegisterAdminError) -> Response {
    match error {
        RegisterAdminError::EmptyChannel => {
            ErrorResponse::bad_request("channel_id cannot be empty").into_response(StatusCode::BAD_REQUEST)
        }
        RegisterAdminError::TenantNotFound(id) => {
            ErrorResponse::not_found("Tenant", &id.to_string()).into_response(StatusCode::NOT_FOUND)
        }
        RegisterAdminError::Repository(msg) => {
            error!(error = %msg, "admin registration failed");
            ErrorResponse::internal("Admin registration failed")
                .into_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn bot_control_error(error: BotControlError) -> Response {
    match error {
        BotControlError::TenantNotFound(id) => {
            ErrorResponse::not_found("Tenant", &id.to_string()).into_response(StatusCode::NOT_FOUND)
        }
        BotControlError::TenantInactive(id) => {
            ErrorResponse::conflict(format!("Tenant is not active: {}", id))
                .into_response(StatusCode::CONFLICT)
        }
        BotControlError::Repository(msg) => {
            error!(error = %msg, "bot control failed");
            ErrorResponse::internal("Bot control failed").into_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TenantId;

    #[test]
    fn register_admin_error_mapping() {
        assert_eq!(register_admin_error(RegisterAdminError::EmptyChannel).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            register_admin_error(RegisterAdminError::TenantNotFound(TenantId::new())).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn bot_control_error_mapping() {
        assert_eq!(
            bot_control_error(BotControlError::TenantInactive(TenantId::new())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            bot_control_error(BotControlError::Repository("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
