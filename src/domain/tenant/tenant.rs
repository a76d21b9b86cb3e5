//! Tenant (agency) and its bot configuration.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Language, TenantId};

use super::KnowledgeEntry;

/// Per-tenant bot configuration passed explicitly into the conversation
/// engine and the knowledge retriever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantConfig {
    pub agency_name: String,
    pub default_language: Language,
    pub supported_languages: Vec<Language>,
    /// Viewing slots offered at the booking step, in display order.
    pub booking_slots: Vec<String>,
    /// Knowledge snapshot, in insertion order.
    pub knowledge_base: Vec<KnowledgeEntry>,
}

impl TenantConfig {
    pub fn new(agency_name: impl Into<String>, default_language: Language) -> Self {
        Self {
            agency_name: agency_name.into(),
            supported_languages: vec![default_language.clone()],
            default_language,
            booking_slots: Vec::new(),
            knowledge_base: Vec::new(),
        }
    }

    pub fn with_languages(mut self, languages: Vec<Language>) -> Self {
        self.supported_languages = languages;
        self
    }

    pub fn with_booking_slots(mut self, slots: Vec<String>) -> Self {
        self.booking_slots = slots;
        self
    }

    pub fn with_knowledge(mut self, entries: Vec<KnowledgeEntry>) -> Self {
        self.knowledge_base = entries;
        self
    }

    /// Finds a supported language by code.
    pub fn supported_language(&self, code: &str) -> Option<&Language> {
        self.supported_languages.iter().find(|l| l.matches(code))
    }
}

/// One agency owning its bots, leads and knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Where hot-lead alerts and digests go; unset until an admin registers.
    pub admin_channel_id: Option<String>,
    pub active: bool,
    pub config: TenantConfig,
}

impl Tenant {
    pub fn new(name: impl Into<String>, config: TenantConfig) -> Self {
        Self {
            id: TenantId::new(),
            name: name.into(),
            admin_channel_id: None,
            active: true,
            config,
        }
    }

    pub fn with_id(mut self, id: TenantId) -> Self {
        self.id = id;
        self
    }

    pub fn with_admin_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.admin_channel_id = Some(channel_id.into());
        self
    }

    /// The admin channel, if one has been registered.
    pub fn admin_channel(&self) -> Option<&str> {
        self.admin_channel_id.as_deref().filter(|c| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tenant_has_no_admin_channel() {
        let tenant = Tenant::new("Acme", TenantConfig::new("Acme Realty", Language::english()));
        assert!(tenant.admin_channel().is_none());
        assert!(tenant.active);
    }

    #[test]
    fn empty_admin_channel_counts_as_unset() {
        let tenant = Tenant::new("Acme", TenantConfig::new("Acme", Language::english()))
            .with_admin_channel("");
        assert!(tenant.admin_channel().is_none());
    }

    #[test]
    fn supported_language_lookup_is_case_insensitive() {
        let config = TenantConfig::new("Acme", Language::english())
            .with_languages(vec![Language::english(), Language::new("ru").unwrap()]);
        assert!(config.supported_language("RU").is_some());
        assert!(config.supported_language("de").is_none());
    }
}
