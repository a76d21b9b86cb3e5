//! Daily admin digest.

use chrono::Duration;

use crate::domain::foundation::{LeadId, TenantId, Timestamp};
use crate::domain::lead::{ConversationState, Lead};

/// One qualified lead as listed in the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestEntry {
    pub lead_id: LeadId,
    pub name: Option<String>,
    pub phone: String,
    pub stated_budget: Option<u64>,
    pub urgency: u8,
    pub state: ConversationState,
}

impl DigestEntry {
    fn from_lead(lead: &Lead, phone: &str) -> Self {
        Self {
            lead_id: lead.id,
            name: lead.name.clone(),
            phone: phone.to_string(),
            stated_budget: lead.stated_budget(),
            urgency: lead.urgency_score.value(),
            state: lead.conversation_state,
        }
    }

    fn line(&self) -> String {
        let budget = self
            .stated_budget
            .map(|b| b.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "{} {} | budget {} | urgency {}/10 | {}",
            self.name.as_deref().unwrap_or("(no name)"),
            self.phone,
            budget,
            self.urgency,
            self.state
        )
    }
}

/// Summary of a tenant's lead activity over a trailing window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyDigest {
    pub tenant_id: TenantId,
    pub window_start: Timestamp,
    pub window_end: Timestamp,
    pub touched: usize,
    pub with_phone: usize,
    pub booked: usize,
    /// Qualified leads (phone captured, not booked) by stated budget, highest first.
    pub ranked: Vec<DigestEntry>,
    /// The qualified lead with the highest urgency.
    pub top: Option<DigestEntry>,
}

impl DailyDigest {
    pub const WINDOW_HOURS: i64 = 24;

    /// Builds the digest from leads touched in `[end - window, end]`.
    ///
    /// Leads outside the window are ignored, so callers may pass a superset.
    pub fn build(tenant_id: TenantId, leads: &[Lead], window_end: Timestamp, window: Duration) -> Self {
        let window_start = window_end.minus(window);
        let touched: Vec<&Lead> = leads
            .iter()
            .filter(|l| l.tenant_id == tenant_id)
            .filter(|l| !l.updated_at.is_before(&window_start) && !l.updated_at.is_after(&window_end))
            .collect();

        let with_phone = touched.iter().filter(|l| l.has_contact()).count();
        let booked = touched
            .iter()
            .filter(|l| l.conversation_state.is_booked())
            .count();

        let mut ranked: Vec<DigestEntry> = touched
            .iter()
            .filter(|l| !l.conversation_state.is_booked())
            .filter_map(|l| l.phone.as_deref().map(|phone| DigestEntry::from_lead(l, phone)))
            .collect();
        // Stable: equal budgets keep activity order. Unstated budgets sort last.
        ranked.sort_by(|a, b| b.stated_budget.cmp(&a.stated_budget));

        let mut top: Option<&DigestEntry> = None;
        for entry in &ranked {
            let better = match top {
                None => true,
                Some(best) => (entry.urgency, entry.stated_budget) > (best.urgency, best.stated_budget),
            };
            if better {
                top = Some(entry);
            }
        }
        let top = top.cloned();

        Self {
            tenant_id,
            window_start,
            window_end,
            touched: touched.len(),
            with_phone,
            booked,
            ranked,
            top,
        }
    }

    /// Renders the digest for the admin channel.
    pub fn render(&self, agency_name: &str) -> String {
        let mut text = format!(
            "Daily digest for {agency_name}\nLeads active: {}\nWith phone: {}\nBooked: {}",
            self.touched, self.with_phone, self.booked
        );
        if let Some(top) = &self.top {
            text.push_str("\n\nTop lead: ");
            text.push_str(&top.line());
        }
        if !self.ranked.is_empty() {
            text.push_str("\n\nQualified leads by budget:");
            for (i, entry) in self.ranked.iter().enumerate() {
                text.push_str(&format!("\n{}. {}", i + 1, entry.line()));
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Language;
    use crate::domain::lead::UrgencyScore;

    fn lead(tenant: TenantId, now: Timestamp, phone: Option<&str>, budget: Option<u64>, urgency: u8) -> Lead {
        let mut lead = Lead::new(tenant, "chat", Language::english(), now.minus_hours(1));
        lead.phone = phone.map(str::to_string);
        lead.budget_max = budget;
        lead.urgency_score = UrgencyScore::new(urgency).unwrap();
        lead.conversation_state = ConversationState::ValueProposition;
        lead
    }

    #[test]
    fn counts_and_ranks_qualified_leads() {
        let tenant = TenantId::new();
        let now = Timestamp::now();
        let mut booked = lead(tenant, now, Some("+971500000003"), Some(9_000_000), 9);
        booked.conversation_state = ConversationState::Booked;
        let leads = vec![
            lead(tenant, now, Some("+971500000001"), Some(500_000), 3),
            lead(tenant, now, None, Some(5_000_000), 8),
            lead(tenant, now, Some("+971500000002"), Some(2_000_000), 1),
            lead(tenant, now, Some("+971500000004"), None, 2),
            booked,
        ];

        let digest = DailyDigest::build(tenant, &leads, now, Duration::hours(24));

        assert_eq!(digest.touched, 5);
        assert_eq!(digest.with_phone, 4);
        assert_eq!(digest.booked, 1);
        let budgets: Vec<_> = digest.ranked.iter().map(|e| e.stated_budget).collect();
        assert_eq!(budgets, vec![Some(2_000_000), Some(500_000), None]);
        assert_eq!(digest.top.as_ref().map(|t| t.urgency), Some(3));
    }

    #[test]
    fn urgency_ties_break_on_budget() {
        let tenant = TenantId::new();
        let now = Timestamp::now();
        let leads = vec![
            lead(tenant, now, Some("+971500000001"), Some(500_000), 5),
            lead(tenant, now, Some("+971500000002"), Some(800_000), 5),
        ];
        let digest = DailyDigest::build(tenant, &leads, now, Duration::hours(24));
        assert_eq!(digest.top.and_then(|t| t.stated_budget), Some(800_000));
    }

    #[test]
    fn ignores_leads_outside_window_and_other_tenants() {
        let tenant = TenantId::new();
        let now = Timestamp::now();
        let mut stale = lead(tenant, now, Some("+971500000001"), None, 1);
        stale.updated_at = now.minus_hours(30);
        let foreign = lead(TenantId::new(), now, Some("+971500000002"), None, 1);

        let digest = DailyDigest::build(tenant, &[stale, foreign], now, Duration::hours(24));
        assert_eq!(digest.touched, 0);
        assert!(digest.top.is_none());
        assert!(digest.render("Acme").contains("Leads active: 0"));
    }
}
