//! HTTP DTOs for tenant administration endpoints.

use serde::{Deserialize, Serialize};

use crate::application::{AdminRegistered, BotStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterAdminRequest {
    pub channel_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminRegisteredResponse {
    pub tenant_id: String,
    pub channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced: Option<String>,
}

impl From<AdminRegistered> for AdminRegisteredResponse {
    fn from(registered: AdminRegistered) -> Self {
        Self {
            tenant_id: registered.tenant_id.to_string(),
            channel_id: registered.channel_id,
            replaced: registered.replaced,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BotStatusResponse {
    pub tenant_id: String,
    pub running: bool,
    pub changed: bool,
}

impl From<BotStatus> for BotStatusResponse {
    fn from(status: BotStatus) -> Self {
        Self {
            tenant_id: status.tenant_id.to_string(),
            running: status.running,
            changed: status.changed,
        }
    }
}
