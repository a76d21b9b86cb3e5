//! Seed data for in-memory runs

use serde::Deserialize;

/// JSON files loaded into the in-memory adapters on startup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedConfig {
    /// Array of tenants (with config and knowledge base)
    pub tenants_file: Option<String>,

    /// Array of property listings shared by all tenants
    pub listings_file: Option<String>,
}
