//! Staged re-engagement policy.

use chrono::Duration;

use crate::domain::foundation::Timestamp;
use crate::domain::lead::{GhostStage, Lead};

/// Which nudge an inactive lead is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NudgeKind {
    /// Short "still there?" ping after brief silence.
    Fast,
    /// Knowledge-backed message after a longer silence.
    Value,
}

impl NudgeKind {
    /// Stage recorded once this nudge is sent.
    pub fn target_stage(&self) -> GhostStage {
        match self {
            NudgeKind::Fast => GhostStage::FastSent,
            NudgeKind::Value => GhostStage::ValueSent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NudgeKind::Fast => "fast",
            NudgeKind::Value => "value",
        }
    }
}

/// Inactivity thresholds for the two nudge stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NudgePolicy {
    pub fast_after: Duration,
    pub value_after: Duration,
}

impl Default for NudgePolicy {
    fn default() -> Self {
        Self {
            fast_after: Duration::minutes(15),
            value_after: Duration::hours(2),
        }
    }
}

impl NudgePolicy {
    pub fn new(fast_after: Duration, value_after: Duration) -> Self {
        Self {
            fast_after,
            value_after,
        }
    }

    /// Stages that can still receive a nudge.
    pub const OPEN_STAGES: [GhostStage; 2] = [GhostStage::None, GhostStage::FastSent];

    /// Leads last active before this instant are candidates.
    pub fn cutoff(&self, now: Timestamp) -> Timestamp {
        now.minus(self.fast_after.min(self.value_after))
    }

    /// Decides which nudge, if any, `lead` is due at `now`.
    ///
    /// The longer threshold is checked first so a lead silent for hours gets
    /// the value nudge even if it never received the fast one.
    pub fn decide(&self, lead: &Lead, now: Timestamp) -> Option<NudgeKind> {
        if !lead.has_contact() || lead.conversation_state.is_booked() {
            return None;
        }
        let inactive = now.duration_since(&lead.updated_at);

        match lead.ghost_stage {
            GhostStage::None | GhostStage::FastSent if inactive >= self.value_after => {
                Some(NudgeKind::Value)
            }
            GhostStage::None if inactive >= self.fast_after => Some(NudgeKind::Fast),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Language, TenantId};
    use crate::domain::lead::ConversationState;

    fn captured_lead(now: Timestamp, idle_minutes: i64, stage: GhostStage) -> Lead {
        let mut lead = Lead::new(TenantId::new(), "chat", Language::english(), now);
        lead.phone = Some("+971501234567".into());
        lead.conversation_state = ConversationState::Budget;
        lead.updated_at = now.minus_minutes(idle_minutes);
        lead.ghost_stage = stage;
        lead
    }

    #[test]
    fn fast_nudge_after_fifteen_minutes() {
        let now = Timestamp::now();
        let policy = NudgePolicy::default();
        assert_eq!(policy.decide(&captured_lead(now, 14, GhostStage::None), now), None);
        assert_eq!(
            policy.decide(&captured_lead(now, 16, GhostStage::None), now),
            Some(NudgeKind::Fast)
        );
    }

    #[test]
    fn fast_sent_waits_for_value_threshold() {
        let now = Timestamp::now();
        let policy = NudgePolicy::default();
        assert_eq!(policy.decide(&captured_lead(now, 30, GhostStage::FastSent), now), None);
        assert_eq!(
            policy.decide(&captured_lead(now, 121, GhostStage::FastSent), now),
            Some(NudgeKind::Value)
        );
    }

    #[test]
    fn long_silence_skips_straight_to_value() {
        let now = Timestamp::now();
        assert_eq!(
            NudgePolicy::default().decide(&captured_lead(now, 180, GhostStage::None), now),
            Some(NudgeKind::Value)
        );
    }

    #[test]
    fn value_sent_is_final() {
        let now = Timestamp::now();
        assert_eq!(
            NudgePolicy::default().decide(&captured_lead(now, 10_000, GhostStage::ValueSent), now),
            None
        );
    }

    #[test]
    fn leads_without_phone_or_booked_are_ignored() {
        let now = Timestamp::now();
        let policy = NudgePolicy::default();

        let mut no_phone = captured_lead(now, 200, GhostStage::None);
        no_phone.phone = None;
        assert_eq!(policy.decide(&no_phone, now), None);

        let mut booked = captured_lead(now, 200, GhostStage::None);
        booked.conversation_state = ConversationState::Booked;
        assert_eq!(policy.decide(&booked, now), None);
    }

    #[test]
    fn cutoff_uses_shorter_threshold() {
        let now = Timestamp::now();
        assert_eq!(NudgePolicy::default().cutoff(now), now.minus_minutes(15));
    }
}
