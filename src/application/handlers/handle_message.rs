//! HandleMessageHandler - Command handler for inbound prospect messages.
//!
//! 1. Resolve the tenant and take the per-lead lock
//! 2. Load or create the lead
//! 3. Run the conversation engine
//! 4. Commit the field-scoped patch (retrying version conflicts with
//!    writers that touched disjoint fields)
//! 5. Execute intents: send the reply, dispatch the hot-lead alert
//!
//! A fatal engine error or a failed commit answers the prospect with a
//! retry-later message and leaves the lead untouched.
//!
//! Each step runs on its own task. Dropping the caller's future (request
//! timeout, client disconnect) detaches from the step instead of cancelling
//! it, so a committed state change is always followed by its intents.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::alerts::{AlertDispatcher, AlertOutcome};
use crate::application::lead_locks::LeadLocks;
use crate::domain::conversation::{
    templates, Collaborators, ConversationEngine, Input, Intent, MessageKey, Response,
};
use crate::domain::foundation::{DomainError, ErrorCode, LeadId, TenantId, Timestamp};
use crate::domain::lead::{Lead, LeadPatch};
use crate::domain::tenant::Tenant;
use crate::ports::{CompletionService, LeadStore, MessagingGateway, PropertyMatcher, TenantRepository};

/// Commit attempts before giving up on version conflicts.
const MAX_COMMIT_ATTEMPTS: usize = 3;

/// Command carrying one normalized inbound message.
#[derive(Debug, Clone)]
pub struct HandleMessageCommand {
    pub tenant_id: TenantId,
    /// Channel address of the prospect.
    pub lead_ref: String,
    pub input: Input,
}

impl HandleMessageCommand {
    pub fn new(tenant_id: TenantId, lead_ref: impl Into<String>, input: Input) -> Self {
        Self {
            tenant_id,
            lead_ref: lead_ref.into(),
            input,
        }
    }
}

/// Result of handling one inbound message.
#[derive(Debug, Clone)]
pub struct HandleMessageResult {
    pub lead_id: LeadId,
    pub response: Response,
    /// False when nothing was committed and the prospect was asked to retry.
    pub committed: bool,
    pub reply_delivered: bool,
    /// Present when the response asked for an admin alert.
    pub alert: Option<AlertOutcome>,
}

impl HandleMessageResult {
    /// A response that leaves `lead` exactly as it was.
    pub fn retry_later(lead: &Lead) -> Self {
        Self {
            lead_id: lead.id,
            response: Response::structured(
                MessageKey::RetryLater,
                templates::retry_later(),
                Vec::new(),
                lead.conversation_state,
            ),
            committed: false,
            reply_delivered: false,
            alert: None,
        }
    }
}

/// Errors that prevent any reply at all.
#[derive(Debug, Clone, Error)]
pub enum HandleMessageError {
    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    #[error("Tenant bot is not active: {0}")]
    TenantInactive(TenantId),

    #[error("Validation error: lead reference cannot be empty")]
    EmptyLeadRef,

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Message step aborted: {0}")]
    Aborted(String),
}

impl From<DomainError> for HandleMessageError {
    fn from(err: DomainError) -> Self {
        HandleMessageError::Repository(err.to_string())
    }
}

/// Handler for inbound prospect messages.
pub struct HandleMessageHandler {
    core: Arc<StepRunner>,
}

struct StepRunner {
    tenants: Arc<dyn TenantRepository>,
    leads: Arc<dyn LeadStore>,
    gateway: Arc<dyn MessagingGateway>,
    completion: Arc<dyn CompletionService>,
    properties: Arc<dyn PropertyMatcher>,
    alerts: Arc<AlertDispatcher>,
    engine: ConversationEngine,
    locks: LeadLocks,
}

impl HandleMessageHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        leads: Arc<dyn LeadStore>,
        gateway: Arc<dyn MessagingGateway>,
        completion: Arc<dyn CompletionService>,
        properties: Arc<dyn PropertyMatcher>,
        alerts: Arc<AlertDispatcher>,
        engine: ConversationEngine,
    ) -> Self {
        Self {
            core: Arc::new(StepRunner {
                tenants,
                leads,
                gateway,
                completion,
                properties,
                alerts,
                engine,
                locks: LeadLocks::new(),
            }),
        }
    }

    /// Handles one inbound message to completion, even if the caller stops
    /// waiting for the result.
    pub async fn handle(
        &self,
        cmd: HandleMessageCommand,
    ) -> Result<HandleMessageResult, HandleMessageError> {
        let core = Arc::clone(&self.core);
        tokio::spawn(async move { core.handle(cmd).await })
            .await
            .map_err(|e| HandleMessageError::Aborted(e.to_string()))?
    }
}

impl StepRunner {
    async fn handle(
        &self,
        cmd: HandleMessageCommand,
    ) -> Result<HandleMessageResult, HandleMessageError> {
        let lead_ref = cmd.lead_ref.trim();
        if lead_ref.is_empty() {
            return Err(HandleMessageError::EmptyLeadRef);
        }

        let tenant = self.tenants.get_tenant(&cmd.tenant_id).await.map_err(|e| {
            if e.is_not_found() {
                HandleMessageError::TenantNotFound(cmd.tenant_id)
            } else {
                HandleMessageError::from(e)
            }
        })?;
        if !tenant.active {
            return Err(HandleMessageError::TenantInactive(tenant.id));
        }

        let _guard = self.locks.acquire(tenant.id, lead_ref).await;

        let lead = self
            .leads
            .find_or_create_lead(&tenant.id, lead_ref, &tenant.config.default_language)
            .await?;

        let collaborators = Collaborators {
            completion: self.completion.as_ref(),
            properties: self.properties.as_ref(),
        };
        let response = match self
            .engine
            .handle(&lead, &tenant.config, &cmd.input, &collaborators)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(tenant_id = %tenant.id, lead_id = %lead.id, error = %e, "conversation step failed");
                return Ok(self.answer_retry_later(&tenant, &lead).await);
            }
        };

        let patch = response
            .field_updates
            .clone()
            .with_state(response.next_state)
            .with_updated_at(Timestamp::now());
        let committed = match self.commit(&tenant.id, &lead, &patch).await {
            Ok(committed) => committed,
            Err(e) => {
                error!(tenant_id = %tenant.id, lead_id = %lead.id, error = %e, "failed to commit conversation step");
                return Ok(self.answer_retry_later(&tenant, &lead).await);
            }
        };

        info!(
            tenant_id = %tenant.id,
            lead_id = %committed.id,
            from = %lead.conversation_state,
            to = %committed.conversation_state,
            "lead advanced"
        );

        let mut reply_delivered = false;
        let mut alert = None;
        for intent in &response.intents {
            match intent {
                Intent::SendMessage(message) => {
                    match self
                        .gateway
                        .send(&tenant.id, &committed.external_ref, message)
                        .await
                    {
                        Ok(()) => reply_delivered = true,
                        Err(e) => warn!(
                            tenant_id = %tenant.id,
                            lead_id = %committed.id,
                            error = %e,
                            "reply delivery failed"
                        ),
                    }
                }
                Intent::NotifyAdmin => {
                    alert = Some(self.alerts.dispatch(&tenant, &committed).await);
                }
                Intent::Noop => {}
            }
        }

        Ok(HandleMessageResult {
            lead_id: committed.id,
            response,
            committed: true,
            reply_delivered,
            alert,
        })
    }

    /// Writes `patch` against the version read, re-reading on conflict.
    ///
    /// Another conversation step cannot run concurrently (per-lead lock), so a
    /// conflict comes from the scheduler or the alert dispatcher, which own
    /// disjoint fields. If the conversation state itself moved, give up.
    async fn commit(&self, tenant_id: &TenantId, lead: &Lead, patch: &LeadPatch) -> Result<Lead, DomainError> {
        let mut expected = lead.version;
        let mut attempt = 1;
        loop {
            match self
                .leads
                .update_lead_fields(tenant_id, &lead.id, patch, Some(expected))
                .await
            {
                Ok(updated) => return Ok(updated),
                Err(e) if e.is_conflict() && attempt < MAX_COMMIT_ATTEMPTS => {
                    let current = self.leads.get_lead(tenant_id, &lead.id).await?;
                    if current.conversation_state != lead.conversation_state {
                        return Err(DomainError::new(
                            ErrorCode::VersionConflict,
                            "conversation state changed concurrently",
                        ));
                    }
                    expected = current.version;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn answer_retry_later(&self, tenant: &Tenant, lead: &Lead) -> HandleMessageResult {
        let mut result = HandleMessageResult::retry_later(lead);
        if let Some(message) = result.response.reply() {
            match self.gateway.send(&tenant.id, &lead.external_ref, message).await {
                Ok(()) => result.reply_delivered = true,
                Err(e) => warn!(tenant_id = %tenant.id, lead_id = %lead.id, error = %e, "retry-later delivery failed"),
            }
        }
        result
    }
}
