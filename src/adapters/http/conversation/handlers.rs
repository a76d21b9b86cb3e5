//! HTTP handler for inbound prospect messages.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::adapters::http::error::{parse_tenant_id, ErrorResponse};
use crate::application::{HandleMessageCommand, HandleMessageError, HandleMessageHandler};
use crate::domain::conversation::Input;

use super::dto::{InboundMessageRequest, MessageResponse};

#[derive(Clone)]
pub struct ConversationHandlers {
    handle_message: Arc<HandleMessageHandler>,
}

impl ConversationHandlers {
    pub fn new(handle_message: Arc<HandleMessageHandler>) -> Self {
        Self { handle_message }
    }
}

/// POST /api/tenants/:tenant_id/messages
pub async fn post_message(
    State(handlers): State<ConversationHandlers>,
    Path(tenant_id): Path<String>,
    Json(req): Json<InboundMessageRequest>,
) -> Response {
    let tenant_id = match parse_tenant_id(&tenant_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    // commands arrive raw ("/start@agency_bot")
    let input = match req.input {
        Input::Command(raw) => Input::command(raw),
        other => other,
    };
    let cmd = HandleMessageCommand::new(tenant_id, req.lead_ref, input);

    match handlers.handle_message.handle(cmd).await {
        Ok(result) => (StatusCode::OK, Json(MessageResponse::from(result))).into_response(),
        Err(e) => handle_message_error(e),
    }
}

fn handle_message_error(error: HandleMessageError) -> Response {
    match error {
        HandleMessageError::TenantNotFound(id) => {
            ErrorResponse::not_found("Tenant", &id.to_string()).into_response(StatusCode::NOT_FOUND)
        }
        HandleMessageError::TenantInactive(id) => {
            ErrorResponse::conflict(format!("Tenant bot is not active: {}", id))
                .into_response(StatusCode::CONFLICT)
        }
        HandleMessageError::EmptyLeadRef => {
            ErrorResponse::bad_request("lead_ref cannot be empty").into_response(StatusCode::BAD_REQUEST)
        }
        HandleMessageError::Repository(msg) | HandleMessageError::Aborted(msg) => {
            error!(error = %msg, "inbound message failed");
            ErrorResponse::internal("Message could not be processed")
                .into_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
