//! Property matcher over a fixed listing set.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::foundation::{DomainError, TenantId};
use crate::ports::{PropertyCriteria, PropertyMatcher, PropertySummary};

/// Serves listings from memory, tenant-specific first, shared otherwise.
#[derive(Debug, Clone, Default)]
pub struct StaticPropertyMatcher {
    shared: Vec<PropertySummary>,
    per_tenant: HashMap<TenantId, Vec<PropertySummary>>,
}

impl StaticPropertyMatcher {
    pub fn new(shared: Vec<PropertySummary>) -> Self {
        Self {
            shared,
            per_tenant: HashMap::new(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId, listings: Vec<PropertySummary>) -> Self {
        self.per_tenant.insert(tenant_id, listings);
        self
    }
}

#[async_trait]
impl PropertyMatcher for StaticPropertyMatcher {
    async fn match_properties(
        &self,
        tenant_id: &TenantId,
        criteria: &PropertyCriteria,
        limit: usize,
    ) -> Result<Vec<PropertySummary>, DomainError> {
        let listings = self.per_tenant.get(tenant_id).unwrap_or(&self.shared);
        Ok(listings
            .iter()
            .filter(|listing| criteria.accepts(listing))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lead::{PropertyType, TransactionType};

    fn listing(title: &str, price: u64) -> PropertySummary {
        PropertySummary {
            title: title.into(),
            area: "Downtown".into(),
            price,
            property_type: PropertyType::Apartment,
            transaction_type: TransactionType::Buy,
        }
    }

    #[tokio::test]
    async fn filters_and_limits() {
        let matcher = StaticPropertyMatcher::new(vec![
            listing("a", 400_000),
            listing("b", 900_000),
            listing("c", 950_000),
            listing("d", 2_000_000),
        ]);
        let criteria = PropertyCriteria {
            budget_max: Some(1_000_000),
            ..PropertyCriteria::default()
        };

        let found = matcher.match_properties(&TenantId::new(), &criteria, 2).await.unwrap();
        let titles: Vec<_> = found.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn tenant_listings_override_shared() {
        let tenant = TenantId::new();
        let matcher = StaticPropertyMatcher::new(vec![listing("shared", 1)])
            .with_tenant(tenant, vec![listing("own", 1)]);

        let found = matcher
            .match_properties(&tenant, &PropertyCriteria::default(), 5)
            .await
            .unwrap();
        assert_eq!(found[0].title, "own");
    }
}
