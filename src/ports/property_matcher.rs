//! Property matcher port.
//!
//! The listing catalogue is owned elsewhere; the conversation engine only asks
//! which listings fit a lead's stated criteria.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, TenantId};
use crate::domain::lead::{Lead, PropertyType, TransactionType};

/// Search criteria derived from a lead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyCriteria {
    pub property_type: Option<PropertyType>,
    pub transaction_type: Option<TransactionType>,
    pub budget_min: Option<u64>,
    pub budget_max: Option<u64>,
}

impl PropertyCriteria {
    pub fn for_lead(lead: &Lead) -> Self {
        Self {
            property_type: lead.property_type,
            transaction_type: lead.transaction_type,
            budget_min: lead.budget_min,
            budget_max: lead.budget_max,
        }
    }

    /// Returns true if a listing satisfies every stated criterion.
    pub fn accepts(&self, listing: &PropertySummary) -> bool {
        self.property_type.map_or(true, |t| t == listing.property_type)
            && self.transaction_type.map_or(true, |t| t == listing.transaction_type)
            && self.budget_min.map_or(true, |min| listing.price >= min)
            && self.budget_max.map_or(true, |max| listing.price <= max)
    }
}

/// A listing as presented in a value proposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub title: String,
    pub area: String,
    pub price: u64,
    pub property_type: PropertyType,
    pub transaction_type: TransactionType,
}

#[async_trait]
pub trait PropertyMatcher: Send + Sync {
    /// Up to `limit` listings matching `criteria`, best first.
    async fn match_properties(
        &self,
        tenant_id: &TenantId,
        criteria: &PropertyCriteria,
        limit: usize,
    ) -> Result<Vec<PropertySummary>, DomainError>;
}
