//! Static knowledge base backed by a configurable topic table.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::matching::KeywordSet;
use crate::ticket::TicketCategory;
use crate::tools::traits::{KnowledgeBase, ToolError};

/// One topic in the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeEntry {
    /// Stable topic identifier (e.g. "password_reset").
    pub topic: String,
    /// Human readable title.
    pub title: String,
    /// Category this topic belongs to.
    pub category: TicketCategory,
    /// Keywords that select this topic.
    pub keywords: Vec<String>,
    /// Ordered remediation steps.
    #[serde(default)]
    pub steps: Vec<String>,
    /// Troubleshooting notes appended after the steps.
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Result of a successful search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeMatch {
    pub entry: KnowledgeEntry,
    /// Keywords from the entry found in the query.
    pub matched_keywords: Vec<String>,
}

/// Knowledge base configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Whether the built-in topic table is included.
    #[serde(default = "default_include_builtin")]
    pub include_builtin: bool,
    /// Extra topics. These take precedence over built-in topics on ties.
    #[serde(default)]
    pub entries: Vec<KnowledgeEntry>,
}

fn default_include_builtin() -> bool {
    true
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            include_builtin: default_include_builtin(),
            entries: Vec::new(),
        }
    }
}

impl KnowledgeBaseConfig {
    /// Effective topic table: configured entries first, then built-ins.
    pub fn table(&self) -> Vec<KnowledgeEntry> {
        let mut table = self.entries.clone();
        if self.include_builtin {
            table.extend(default_entries());
        }
        table
    }
}

fn entry(
    topic: &str,
    title: &str,
    category: TicketCategory,
    keywords: &[&str],
    steps: &[&str],
    notes: &[&str],
) -> KnowledgeEntry {
    KnowledgeEntry {
        topic: topic.to_string(),
        title: title.to_string(),
        category,
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        steps: steps.iter().map(|s| s.to_string()).collect(),
        notes: notes.iter().map(|s| s.to_string()).collect(),
    }
}

static BUILTIN_ENTRIES: Lazy<Vec<KnowledgeEntry>> = Lazy::new(|| {
    vec![
        entry(
            "password_reset",
            "Password reset",
            TicketCategory::Technical,
            &["password", "forgot password", "reset password", "login", "log in", "sign in", "locked out"],
            &[
                "Go to the sign-in page and select \"Forgot password\".",
                "Enter the email address associated with your account.",
                "Open the reset link we email you. The link is valid for 30 minutes.",
                "Choose a new password with at least 12 characters.",
                "Sign in with the new password and update any saved credentials on your devices.",
            ],
            &[
                "If the reset email does not arrive within 10 minutes, check your spam folder.",
                "After 5 failed attempts the account locks for 15 minutes.",
            ],
        ),
        entry(
            "app_crash",
            "Application crashes",
            TicketCategory::Technical,
            &["crash", "crashes", "crashing", "freeze", "freezes", "not responding", "startup"],
            &[
                "Update the app to the latest version from your app store.",
                "Clear the app cache from your device settings.",
                "Restart your device.",
                "If the problem continues, uninstall and reinstall the app.",
            ],
            &["Reinstalling does not delete your account data; it is stored on our servers."],
        ),
        entry(
            "connectivity",
            "Connection and sync problems",
            TicketCategory::Technical,
            &["connection", "network", "offline", "timeout", "sync", "syncing", "slow"],
            &[
                "Check that your device is online and can open other websites.",
                "Sign out and sign back in to refresh your session.",
                "Disable any VPN or proxy and try again.",
                "Trigger a manual sync from Settings > Data > Sync now.",
            ],
            &["Our status page lists any ongoing service incidents."],
        ),
        entry(
            "refund",
            "Refund requests",
            TicketCategory::Billing,
            &["refund", "money back", "reimburse", "reimbursement", "chargeback"],
            &[
                "Open Billing > Payment history in your account.",
                "Select the charge you want refunded and choose \"Request refund\".",
                "Pick a reason and submit the request.",
                "Refunds are returned to the original payment method within 5-10 business days.",
            ],
            &["Charges older than 60 days are reviewed manually by the billing team."],
        ),
        entry(
            "billing_charge",
            "Charges and invoices",
            TicketCategory::Billing,
            &["billing", "invoice", "charged", "charge", "payment", "receipt", "overcharged", "double charged"],
            &[
                "Open Billing > Payment history to review recent charges.",
                "Download the invoice for any charge from the same page.",
                "Compare the charge date with your plan renewal date.",
                "If a charge looks wrong, reply with the invoice number so we can investigate.",
            ],
            &["Pending authorizations from your bank usually disappear within 3 business days."],
        ),
        entry(
            "subscription",
            "Subscription changes",
            TicketCategory::Billing,
            &["subscription", "plan", "upgrade", "downgrade", "renewal", "renew", "cancel subscription"],
            &[
                "Open Billing > Subscription.",
                "Select \"Change plan\" to upgrade or downgrade.",
                "Review the prorated amount shown before confirming.",
                "Confirm the change. It takes effect immediately.",
            ],
            &["Cancelling keeps your access until the end of the current billing period."],
        ),
        entry(
            "account_settings",
            "Account settings",
            TicketCategory::General,
            &["account", "profile", "email address", "username", "settings", "preferences"],
            &[
                "Sign in and open Settings > Account.",
                "Edit the field you want to change.",
                "Save your changes and confirm through the verification email if prompted.",
            ],
            &["Email address changes require confirming both the old and the new address."],
        ),
        entry(
            "general_info",
            "General information",
            TicketCategory::General,
            &["hours", "contact", "information", "feature", "question", "documentation", "how do i"],
            &[
                "Browse our help center for guides and frequently asked questions.",
                "Check the documentation section for detailed feature walkthroughs.",
                "Reach our support team Monday to Friday, 9:00-18:00 CET.",
            ],
            &["Feature requests are reviewed by the product team every month."],
        ),
    ]
});

/// The built-in topic table.
pub fn default_entries() -> Vec<KnowledgeEntry> {
    BUILTIN_ENTRIES.clone()
}

/// Knowledge base over a fixed topic table.
///
/// The best entry is the one with the most distinct keyword hits; ties are
/// broken by table order.
pub struct StaticKnowledgeBase {
    entries: Vec<(KnowledgeEntry, KeywordSet)>,
}

impl StaticKnowledgeBase {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Result<Self, ToolError> {
        let entries = entries
            .into_iter()
            .map(|entry| {
                let keywords = KeywordSet::new(&entry.keywords)
                    .map_err(|e| ToolError::InvalidTable(format!("topic '{}': {}", entry.topic, e)))?;
                if keywords.is_empty() {
                    return Err(ToolError::InvalidTable(format!(
                        "topic '{}' has no keywords",
                        entry.topic
                    )));
                }
                Ok((entry, keywords))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn from_config(config: &KnowledgeBaseConfig) -> Result<Self, ToolError> {
        Self::new(config.table())
    }

    /// Knowledge base with only the built-in topics.
    pub fn builtin() -> Result<Self, ToolError> {
        Self::new(default_entries())
    }

    pub fn topics(&self) -> impl Iterator<Item = &KnowledgeEntry> {
        self.entries.iter().map(|(e, _)| e)
    }

    fn best_match(&self, query: &str) -> Option<KnowledgeMatch> {
        let mut best: Option<(&KnowledgeEntry, Vec<&str>)> = None;
        for (entry, keywords) in &self.entries {
            let hits = keywords.matches(query);
            if hits.is_empty() {
                continue;
            }
            let better = best
                .as_ref()
                .map_or(true, |(_, best_hits)| hits.len() > best_hits.len());
            if better {
                best = Some((entry, hits));
            }
        }
        best.map(|(entry, hits)| KnowledgeMatch {
            entry: entry.clone(),
            matched_keywords: hits.into_iter().map(String::from).collect(),
        })
    }
}

#[async_trait]
impl KnowledgeBase for StaticKnowledgeBase {
    fn name(&self) -> &str {
        "static_knowledge_base"
    }

    async fn search(&self, query: &str) -> Result<Option<KnowledgeMatch>, ToolError> {
        let result = self.best_match(query);
        match &result {
            Some(m) => tracing::debug!(
                topic = %m.entry.topic,
                hits = m.matched_keywords.len(),
                "Knowledge base match"
            ),
            None => tracing::debug!("Knowledge base found no matching topic"),
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> StaticKnowledgeBase {
        StaticKnowledgeBase::builtin().unwrap()
    }

    #[tokio::test]
    async fn test_password_query_matches_reset_topic() {
        let result = kb()
            .search("Cannot login forgot password, urgent")
            .await
            .unwrap()
            .expect("should match");
        assert_eq!(result.entry.topic, "password_reset");
        assert_eq!(result.entry.category, TicketCategory::Technical);
        assert!(result.matched_keywords.contains(&"password".to_string()));
        assert!(!result.entry.steps.is_empty());
    }

    #[tokio::test]
    async fn test_refund_query() {
        let result = kb()
            .search("Refund request billing issue")
            .await
            .unwrap()
            .unwrap();
        // refund and billing_charge tie on hits; refund comes first in the table.
        assert_eq!(result.entry.topic, "refund");
    }

    #[tokio::test]
    async fn test_no_match_returns_none() {
        let result = kb()
            .search("Something weird happened with the widget")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_most_hits_wins() {
        let result = kb()
            .search("I was double charged, the invoice and receipt disagree about my refund")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.entry.topic, "billing_charge");
    }

    #[tokio::test]
    async fn test_configured_entries_take_precedence_on_ties() {
        let config = KnowledgeBaseConfig {
            include_builtin: true,
            entries: vec![entry(
                "custom_refund",
                "Custom refund",
                TicketCategory::Billing,
                &["refund"],
                &["Call us."],
                &[],
            )],
        };
        let kb = StaticKnowledgeBase::from_config(&config).unwrap();
        let result = kb.search("refund please").await.unwrap().unwrap();
        assert_eq!(result.entry.topic, "custom_refund");
    }

    #[test]
    fn test_entry_without_keywords_is_rejected() {
        let result = StaticKnowledgeBase::new(vec![entry(
            "empty",
            "Empty",
            TicketCategory::General,
            &[],
            &[],
            &[],
        )]);
        assert!(matches!(result, Err(ToolError::InvalidTable(_))));
    }

    #[test]
    fn test_entry_with_only_blank_keywords_is_rejected() {
        let result = StaticKnowledgeBase::new(vec![entry(
            "blank",
            "Blank",
            TicketCategory::General,
            &[" ", ""],
            &["Do something."],
            &[],
        )]);
        assert!(matches!(result, Err(ToolError::InvalidTable(_))));
    }

    #[tokio::test]
    async fn test_blank_keyword_does_not_match_everything() {
        let kb = StaticKnowledgeBase::new(vec![entry(
            "widget",
            "Widget",
            TicketCategory::General,
            &[" ", "widget"],
            &["Unplug it."],
            &[],
        )])
        .unwrap();
        assert!(kb.search("my invoice is wrong").await.unwrap().is_none());
        let found = kb.search("the widget is broken").await.unwrap().unwrap();
        assert_eq!(found.matched_keywords, vec!["widget".to_string()]);
    }

    #[test]
    fn test_builtin_table_covers_all_specialist_categories() {
        let kb = kb();
        for category in [
            TicketCategory::Technical,
            TicketCategory::Billing,
            TicketCategory::General,
        ] {
            assert!(kb.topics().any(|e| e.category == category));
        }
    }

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            include_builtin = false

            [[entries]]
            topic = "vpn"
            title = "VPN setup"
            category = "technical"
            keywords = ["vpn"]
            steps = ["Install the client.", "Import the profile."]
        "#;
        let config: KnowledgeBaseConfig = toml::from_str(toml).unwrap();
        assert!(!config.include_builtin);
        assert_eq!(config.table().len(), 1);
        assert_eq!(config.table()[0].steps.len(), 2);
        assert!(config.table()[0].notes.is_empty());
    }
}
