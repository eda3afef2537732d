//! Intake classification rules.
//!
//! Rules are evaluated in table order over the ticket's subject and
//! description. The first matching topic rule decides the topic; every
//! matching urgency or priority rule contributes its effect.

use serde::{Deserialize, Serialize};

use crate::matching::KeywordSet;
use crate::ticket::{TicketCategory, DEFAULT_PRIORITY, HIGHEST_PRIORITY, LOWEST_PRIORITY};

/// What a rule does when it matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleEffect {
    /// Set the topical category.
    Topic { category: TicketCategory },
    /// Mark the ticket urgent: category `Urgent`, priority 1.
    Urgent,
    /// Raise priority to at least this level.
    Priority { level: u8 },
}

/// One row of the rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub effect: RuleEffect,
}

impl IntakeRule {
    pub fn new(name: &str, keywords: &[&str], effect: RuleEffect) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            effect,
        }
    }

    /// Reason this rule is malformed, if it is.
    pub fn problem(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("rule name is empty".to_string());
        }
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Some(format!("rule '{}' has no keywords", self.name));
        }
        match self.effect {
            RuleEffect::Topic {
                category: TicketCategory::Urgent,
            } => Some(format!(
                "rule '{}': urgent is not a topic, use the urgent effect",
                self.name
            )),
            RuleEffect::Priority { level } if !(HIGHEST_PRIORITY..=LOWEST_PRIORITY).contains(&level) => {
                Some(format!(
                    "rule '{}': priority {} outside {}..={}",
                    self.name, level, HIGHEST_PRIORITY, LOWEST_PRIORITY
                ))
            }
            _ => None,
        }
    }
}

/// Intake configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Rule table. Replaces the built-in table when non-empty.
    #[serde(default = "default_rules")]
    pub rules: Vec<IntakeRule>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

/// The built-in rule table.
pub fn default_rules() -> Vec<IntakeRule> {
    vec![
        IntakeRule::new(
            "technical",
            &[
                "password", "login", "log in", "sign in", "locked out", "crash", "crashes",
                "crashing", "error", "bug", "app", "install", "connection", "network", "sync",
                "slow", "freeze",
            ],
            RuleEffect::Topic {
                category: TicketCategory::Technical,
            },
        ),
        IntakeRule::new(
            "billing",
            &[
                "refund", "billing", "invoice", "charge", "charged", "payment", "subscription",
                "plan", "receipt", "price", "overcharged",
            ],
            RuleEffect::Topic {
                category: TicketCategory::Billing,
            },
        ),
        IntakeRule::new(
            "general",
            &[
                "question", "information", "hours", "account", "profile", "settings",
                "feature", "documentation", "how do i", "contact",
            ],
            RuleEffect::Topic {
                category: TicketCategory::General,
            },
        ),
        IntakeRule::new(
            "urgent",
            &[
                "urgent", "asap", "immediately", "emergency", "critical", "right away",
            ],
            RuleEffect::Urgent,
        ),
        IntakeRule::new(
            "service_impact",
            &["not working", "broken", "down", "outage", "cannot", "can't"],
            RuleEffect::Priority { level: 2 },
        ),
    ]
}

/// Result of classifying a ticket's text.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: TicketCategory,
    pub topic: TicketCategory,
    pub priority: u8,
    pub matched_rules: Vec<String>,
}

/// A rule table with compiled keyword sets.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<(IntakeRule, KeywordSet)>,
}

impl RuleTable {
    pub fn new(rules: Vec<IntakeRule>) -> Result<Self, String> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                if let Some(problem) = rule.problem() {
                    return Err(problem);
                }
                let keywords = KeywordSet::new(&rule.keywords)
                    .map_err(|e| format!("rule '{}': {}", rule.name, e))?;
                Ok((rule, keywords))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn from_config(config: &IntakeConfig) -> Result<Self, String> {
        if config.rules.is_empty() {
            return Self::new(default_rules());
        }
        Self::new(config.rules.clone())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classify free text. Deterministic; never fails.
    pub fn classify(&self, text: &str) -> Classification {
        let mut topic = None;
        let mut urgent = false;
        let mut priority = DEFAULT_PRIORITY;
        let mut matched_rules = Vec::new();

        for (rule, keywords) in &self.rules {
            if !keywords.is_match(text) {
                continue;
            }
            match rule.effect {
                RuleEffect::Topic { category } => {
                    if topic.is_some() {
                        continue;
                    }
                    topic = Some(category);
                }
                RuleEffect::Urgent => {
                    urgent = true;
                    priority = HIGHEST_PRIORITY;
                }
                RuleEffect::Priority { level } => priority = priority.min(level),
            }
            matched_rules.push(rule.name.clone());
        }

        let topic = topic.unwrap_or(TicketCategory::General);
        Classification {
            category: if urgent { TicketCategory::Urgent } else { topic },
            topic,
            priority,
            matched_rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RuleTable {
        RuleTable::new(default_rules()).unwrap()
    }

    #[test]
    fn test_urgent_login() {
        let c = table().classify("Cannot login forgot password, urgent");
        assert_eq!(c.category, TicketCategory::Urgent);
        assert_eq!(c.topic, TicketCategory::Technical);
        assert_eq!(c.priority, 1);
        assert_eq!(c.matched_rules, vec!["technical", "urgent", "service_impact"]);
    }

    #[test]
    fn test_billing_defaults_to_priority_three() {
        let c = table().classify("Refund request billing issue");
        assert_eq!(c.category, TicketCategory::Billing);
        assert_eq!(c.priority, DEFAULT_PRIORITY);
    }

    #[test]
    fn test_first_topic_rule_wins() {
        let c = table().classify("The app charged me twice");
        assert_eq!(c.topic, TicketCategory::Technical);
        assert_eq!(c.matched_rules, vec!["technical"]);
    }

    #[test]
    fn test_no_match_defaults_to_general() {
        let c = table().classify("Something weird happened with the widget");
        assert_eq!(c.category, TicketCategory::General);
        assert_eq!(c.priority, DEFAULT_PRIORITY);
        assert!(c.matched_rules.is_empty());
    }

    #[test]
    fn test_priority_rules_only_raise() {
        let rules = vec![
            IntakeRule::new("p2", &["slow"], RuleEffect::Priority { level: 2 }),
            IntakeRule::new("p4", &["whenever"], RuleEffect::Priority { level: 4 }),
        ];
        let table = RuleTable::new(rules).unwrap();
        assert_eq!(table.classify("slow, fix whenever").priority, 2);
        assert_eq!(table.classify("fix whenever").priority, DEFAULT_PRIORITY);
    }

    #[test]
    fn test_urgency_keeps_topic() {
        let c = table().classify("Payment failed, need help asap");
        assert_eq!(c.category, TicketCategory::Urgent);
        assert_eq!(c.topic, TicketCategory::Billing);
    }

    #[test]
    fn test_malformed_rules_rejected() {
        let empty = IntakeRule::new("empty", &[], RuleEffect::Urgent);
        assert!(RuleTable::new(vec![empty]).is_err());

        let urgent_topic = IntakeRule::new(
            "bad",
            &["x"],
            RuleEffect::Topic {
                category: TicketCategory::Urgent,
            },
        );
        assert!(RuleTable::new(vec![urgent_topic]).is_err());

        let bad_level = IntakeRule::new("bad", &["x"], RuleEffect::Priority { level: 9 });
        assert!(bad_level.problem().is_some());
    }

    #[test]
    fn test_empty_config_uses_builtin_table() {
        let config = IntakeConfig { rules: Vec::new() };
        assert_eq!(RuleTable::from_config(&config).unwrap().len(), default_rules().len());
    }

    #[test]
    fn test_rules_deserialize() {
        let toml = r#"
            [[rules]]
            name = "vip"
            keywords = ["escalate"]
            effect = { kind = "urgent" }

            [[rules]]
            name = "shipping"
            keywords = ["delivery", "shipping"]
            effect = { kind = "topic", category = "general" }

            [[rules]]
            name = "slow"
            keywords = ["slow"]
            effect = { kind = "priority", level = 2 }
        "#;
        let config: IntakeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.rules.len(), 3);
        assert_eq!(config.rules[0].effect, RuleEffect::Urgent);
        assert_eq!(config.rules[2].effect, RuleEffect::Priority { level: 2 });

        let table = RuleTable::from_config(&config).unwrap();
        let c = table.classify("Shipping is slow");
        assert_eq!(c.topic, TicketCategory::General);
        assert_eq!(c.priority, 2);
    }
}
