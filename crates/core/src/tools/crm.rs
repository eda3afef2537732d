//! Static CRM: customer profiles keyed by customer id.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::tools::traits::CustomerDirectory;

/// Customer tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerTier {
    #[default]
    Standard,
    Premium,
    Enterprise,
}

impl CustomerTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerTier::Standard => "standard",
            CustomerTier::Premium => "premium",
            CustomerTier::Enterprise => "enterprise",
        }
    }

    /// Tiers that get acknowledged in responses.
    pub fn is_valued(&self) -> bool {
        !matches!(self, CustomerTier::Standard)
    }
}

impl fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account metadata for a customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerProfile {
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub tier: CustomerTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signup_date: Option<NaiveDate>,
    #[serde(default)]
    pub open_tickets: u32,
    #[serde(default)]
    pub lifetime_value: f64,
    #[serde(default = "default_account_status")]
    pub account_status: String,
    /// False for the placeholder profile returned for unknown ids.
    #[serde(default = "default_known")]
    pub known: bool,
}

fn default_account_status() -> String {
    "active".to_string()
}

fn default_known() -> bool {
    true
}

impl CustomerProfile {
    /// Placeholder profile for a customer the directory does not know.
    pub fn unknown(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            name: None,
            tier: CustomerTier::Standard,
            signup_date: None,
            open_tickets: 0,
            lifetime_value: 0.0,
            account_status: default_account_status(),
            known: false,
        }
    }

    /// Name to address the customer by, if known.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }

    /// Derived flags used by the pipeline for personalization.
    pub fn flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if !self.known {
            flags.push("unknown_customer".to_string());
        }
        if self.tier.is_valued() {
            flags.push("priority_support".to_string());
        }
        if self.open_tickets >= 3 {
            flags.push("frequent_contact".to_string());
        }
        flags
    }
}

/// CRM configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrmConfig {
    #[serde(default)]
    pub profiles: Vec<CustomerProfile>,
}

/// In-memory customer directory.
#[derive(Debug, Default)]
pub struct StaticCrm {
    profiles: HashMap<String, CustomerProfile>,
}

impl StaticCrm {
    pub fn new(profiles: impl IntoIterator<Item = CustomerProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.customer_id.clone(), p))
                .collect(),
        }
    }

    pub fn from_config(config: &CrmConfig) -> Self {
        Self::new(config.profiles.iter().cloned())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl CustomerDirectory for StaticCrm {
    fn name(&self) -> &str {
        "static_crm"
    }

    async fn lookup(&self, customer_id: &str) -> CustomerProfile {
        match self.profiles.get(customer_id) {
            Some(profile) => profile.clone(),
            None => {
                tracing::debug!(customer_id, "Unknown customer, using default profile");
                CustomerProfile::unknown(customer_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> CustomerProfile {
        CustomerProfile {
            customer_id: "CUST-001".to_string(),
            name: Some("Alice".to_string()),
            tier: CustomerTier::Premium,
            signup_date: NaiveDate::from_ymd_opt(2022, 3, 14),
            open_tickets: 4,
            lifetime_value: 1250.0,
            account_status: "active".to_string(),
            known: true,
        }
    }

    #[tokio::test]
    async fn test_lookup_known_customer() {
        let crm = StaticCrm::new(vec![alice()]);
        let profile = crm.lookup("CUST-001").await;
        assert_eq!(profile.display_name(), Some("Alice"));
        assert_eq!(profile.tier, CustomerTier::Premium);
        assert!(profile.known);
    }

    #[tokio::test]
    async fn test_lookup_unknown_customer_returns_default() {
        let crm = StaticCrm::default();
        let profile = crm.lookup("CUST-404").await;
        assert_eq!(profile.customer_id, "CUST-404");
        assert_eq!(profile.tier, CustomerTier::Standard);
        assert_eq!(profile.open_tickets, 0);
        assert!(!profile.known);
        assert!(profile.display_name().is_none());
    }

    #[test]
    fn test_flags() {
        assert_eq!(
            alice().flags(),
            vec!["priority_support".to_string(), "frequent_contact".to_string()]
        );
        assert_eq!(
            CustomerProfile::unknown("x").flags(),
            vec!["unknown_customer".to_string()]
        );
    }

    #[test]
    fn test_profile_deserialize_with_defaults() {
        let toml = r#"
            [[profiles]]
            customer_id = "CUST-002"
            name = "Bob"
            tier = "enterprise"
            signup_date = "2021-07-01"
        "#;
        let config: CrmConfig = toml::from_str(toml).unwrap();
        let profile = &config.profiles[0];
        assert_eq!(profile.tier, CustomerTier::Enterprise);
        assert_eq!(profile.signup_date, NaiveDate::from_ymd_opt(2021, 7, 1));
        assert_eq!(profile.account_status, "active");
        assert!(profile.known);
        assert_eq!(StaticCrm::from_config(&config).len(), 1);
    }
}
