//! Tenant-owned knowledge snippet.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Language, ValidationError};

/// A scored snippet of domain facts (escrow rules, visa policy, area guides)
/// that the bot injects into replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub title: String,
    pub content: String,
    /// Lowercased, de-duplicated keywords.
    pub keywords: Vec<String>,
    pub language: Language,
    /// 0..=100, higher wins ties.
    pub priority: u8,
    pub category: String,
}

impl KnowledgeEntry {
    pub const MAX_PRIORITY: u8 = 100;

    /// Creates an entry, validating title, content and priority.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        keywords: impl IntoIterator<Item = impl AsRef<str>>,
        language: Language,
        priority: u8,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let content = content.into();
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title"));
        }
        if content.trim().is_empty() {
            return Err(ValidationError::empty_field("content"));
        }
        if priority > Self::MAX_PRIORITY {
            return Err(ValidationError::out_of_range(
                "priority",
                0,
                Self::MAX_PRIORITY as i64,
                priority as i64,
            ));
        }

        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }

        Ok(Self {
            title,
            content,
            keywords: normalized,
            language,
            priority,
            category: "general".to_string(),
        })
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}
