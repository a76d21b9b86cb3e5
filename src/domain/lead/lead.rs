//! Lead record and field-scoped patches.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Language, LeadId, TenantId, Timestamp};

use super::{
    BudgetRange, ConversationState, GhostStage, PropertyType, Purpose, TransactionType, UrgencyScore,
};

/// One prospect's conversation record, scoped to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub tenant_id: TenantId,
    /// Channel address of the prospect (chat id, phone handle).
    pub external_ref: String,
    pub conversation_state: ConversationState,
    pub language: Option<Language>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub budget_min: Option<u64>,
    pub budget_max: Option<u64>,
    pub property_type: Option<PropertyType>,
    pub transaction_type: Option<TransactionType>,
    pub purpose: Option<Purpose>,
    pub booking_slot: Option<String>,
    pub ghost_stage: GhostStage,
    pub urgency_score: UrgencyScore,
    pub admin_alert_sent: bool,
    pub created_at: Timestamp,
    /// Last conversation activity; drives inactivity calculations.
    pub updated_at: Timestamp,
    /// Optimistic-concurrency counter, bumped on every write.
    pub version: u64,
}

impl Lead {
    /// Creates a lead for a first inbound message.
    pub fn new(
        tenant_id: TenantId,
        external_ref: impl Into<String>,
        language: Language,
        now: Timestamp,
    ) -> Self {
        Self {
            id: LeadId::new(),
            tenant_id,
            external_ref: external_ref.into(),
            conversation_state: ConversationState::Start,
            language: Some(language),
            name: None,
            phone: None,
            budget_min: None,
            budget_max: None,
            property_type: None,
            transaction_type: None,
            purpose: None,
            booking_slot: None,
            ghost_stage: GhostStage::None,
            urgency_score: UrgencyScore::default(),
            admin_alert_sent: false,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Returns true once a phone number has been captured.
    pub fn has_contact(&self) -> bool {
        self.phone.is_some()
    }

    /// The budget the lead stated, preferring the upper bound.
    pub fn stated_budget(&self) -> Option<u64> {
        self.budget_max.or(self.budget_min)
    }

    /// Language to converse in, falling back to the given default.
    pub fn language_or<'a>(&'a self, default: &'a Language) -> &'a Language {
        self.language.as_ref().unwrap_or(default)
    }

    /// Applies a field-scoped patch and bumps the version.
    ///
    /// `admin_alert_sent` is sticky: a patch can set it but never clear it.
    pub fn apply(&mut self, patch: &LeadPatch) {
        if let Some(state) = patch.conversation_state {
            self.conversation_state = state;
        }
        if let Some(ref language) = patch.language {
            self.language = Some(language.clone());
        }
        if let Some(ref name) = patch.name {
            self.name = Some(name.clone());
        }
        if let Some(ref phone) = patch.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(range) = patch.budget {
            self.budget_min = range.min;
            self.budget_max = range.max;
        }
        if let Some(kind) = patch.property_type {
            self.property_type = Some(kind);
        }
        if let Some(tx) = patch.transaction_type {
            self.transaction_type = Some(tx);
        }
        if let Some(purpose) = patch.purpose {
            self.purpose = Some(purpose);
        }
        if let Some(ref slot) = patch.booking_slot {
            self.booking_slot = Some(slot.clone());
        }
        if let Some(score) = patch.urgency_score {
            self.urgency_score = score;
        }
        if let Some(stage) = patch.ghost_stage {
            self.ghost_stage = stage;
        }
        if patch.admin_alert_sent == Some(true) {
            self.admin_alert_sent = true;
        }
        if let Some(at) = patch.updated_at {
            self.updated_at = at;
        }
        self.version += 1;
    }
}

/// A partial update touching only the fields that are `Some`.
///
/// The conversation writer, the engagement scheduler and the alert dispatcher
/// each own disjoint fields, so their patches merge instead of overwriting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadPatch {
    pub conversation_state: Option<ConversationState>,
    pub language: Option<Language>,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// Replaces both bounds; an absent bound is cleared.
    pub budget: Option<BudgetRange>,
    pub property_type: Option<PropertyType>,
    pub transaction_type: Option<TransactionType>,
    pub purpose: Option<Purpose>,
    pub booking_slot: Option<String>,
    pub urgency_score: Option<UrgencyScore>,
    pub ghost_stage: Option<GhostStage>,
    pub admin_alert_sent: Option<bool>,
    pub updated_at: Option<Timestamp>,
}

impl LeadPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch written by the engagement scheduler.
    pub fn ghost_stage(stage: GhostStage) -> Self {
        Self {
            ghost_stage: Some(stage),
            ..Self::default()
        }
    }

    /// Patch written by the alert dispatcher.
    pub fn alert_sent() -> Self {
        Self {
            admin_alert_sent: Some(true),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: ConversationState) -> Self {
        self.conversation_state = Some(state);
        self
    }

    pub fn with_updated_at(mut self, at: Timestamp) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlays `other` on top of this patch; fields set in `other` win.
    pub fn merge(mut self, other: LeadPatch) -> Self {
        macro_rules! take {
            ($($field:ident),+) => {
                $(if other.$field.is_some() { self.$field = other.$field; })+
            };
        }
        take!(
            conversation_state,
            language,
            name,
            phone,
            budget,
            property_type,
            transaction_type,
            purpose,
            booking_slot,
            urgency_score,
            ghost_stage,
            admin_alert_sent,
            updated_at
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead() -> Lead {
        Lead::new(TenantId::new(), "chat-1", Language::english(), Timestamp::now())
    }

    #[test]
    fn new_lead_starts_at_start_with_no_contact() {
        let lead = lead();
        assert_eq!(lead.conversation_state, ConversationState::Start);
        assert_eq!(lead.ghost_stage, GhostStage::None);
        assert!(!lead.has_contact());
        assert_eq!(lead.version, 0);
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut lead = lead();
        lead.name = Some("Anna".to_string());
        let before_updated = lead.updated_at;

        lead.apply(&LeadPatch::ghost_stage(GhostStage::FastSent));

        assert_eq!(lead.ghost_stage, GhostStage::FastSent);
        assert_eq!(lead.name.as_deref(), Some("Anna"));
        assert_eq!(lead.updated_at, before_updated);
        assert_eq!(lead.version, 1);
    }

    #[test]
    fn admin_alert_flag_is_never_reset() {
        let mut lead = lead();
        lead.apply(&LeadPatch::alert_sent());
        lead.apply(&LeadPatch {
            admin_alert_sent: Some(false),
            ..LeadPatch::default()
        });
        assert!(lead.admin_alert_sent);
    }

    #[test]
    fn merge_prefers_later_fields() {
        let base = LeadPatch {
            name: Some("A".into()),
            phone: Some("+1".into()),
            ..LeadPatch::default()
        };
        let merged = base.merge(LeadPatch {
            name: Some("B".into()),
            ..LeadPatch::default()
        });
        assert_eq!(merged.name.as_deref(), Some("B"));
        assert_eq!(merged.phone.as_deref(), Some("+1"));
    }

    #[test]
    fn budget_answer_replaces_both_bounds() {
        let mut lead = lead();
        lead.budget_min = Some(3_000_000);

        lead.apply(&LeadPatch {
            budget: Some(BudgetRange {
                min: None,
                max: Some(500_000),
            }),
            ..LeadPatch::default()
        });

        assert_eq!(lead.budget_min, None);
        assert_eq!(lead.budget_max, Some(500_000));
    }

    #[test]
    fn stated_budget_prefers_upper_bound() {
        let mut lead = lead();
        lead.budget_min = Some(500_000);
        assert_eq!(lead.stated_budget(), Some(500_000));
        lead.budget_max = Some(1_000_000);
        assert_eq!(lead.stated_budget(), Some(1_000_000));
    }
}
