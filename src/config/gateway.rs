//! Outbound messaging gateway configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Where replies, nudges and admin alerts are posted
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Webhook receiving outbound messages as JSON. When unset, messages are
    /// only logged (development).
    pub webhook_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        match self.webhook_url.as_deref() {
            Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                return Err(ValidationError::InvalidUrl("GATEWAY__WEBHOOK_URL"));
            }
            None if production => {
                return Err(ValidationError::MissingRequired("GATEWAY__WEBHOOK_URL"));
            }
            _ => {}
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_optional_outside_production() {
        let config = GatewayConfig::default();
        assert!(config.validate(false).is_ok());
        assert_eq!(
            config.validate(true),
            Err(ValidationError::MissingRequired("GATEWAY__WEBHOOK_URL"))
        );
    }

    #[test]
    fn test_webhook_must_be_http() {
        let config = GatewayConfig {
            webhook_url: Some("ftp://bots".to_string()),
            ..Default::default()
        };
        assert!(config.validate(false).is_err());
    }
}
