//! Rule Store - versioned cross-border rules
//!
//! Rules are keyed by the exact `(from, to, transaction_type)` triple.
//! The store is read-only after load; a rule change means building a new
//! store, which gets a new fingerprint.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::Path;

use pulse_core::{Amount, Jurisdiction, TransactionType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ComplianceError, ComplianceResult};

/// Lookup key for a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleKey {
    pub from: Jurisdiction,
    pub to: Jurisdiction,
    pub transaction_type: TransactionType,
}

impl RuleKey {
    pub fn new(from: Jurisdiction, to: Jurisdiction, transaction_type: TransactionType) -> Self {
        Self {
            from,
            to,
            transaction_type,
        }
    }
}

impl std::fmt::Display for RuleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {} {}", self.from, self.to, self.transaction_type)
    }
}

/// A published cross-border rule. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub from: Jurisdiction,
    pub to: Jurisdiction,
    pub transaction_type: TransactionType,
    #[serde(default = "default_version")]
    pub version: u32,
    pub min_amount: Amount,
    pub max_amount: Amount,
    pub reporting_threshold: Amount,
    #[serde(default)]
    pub required_documents: Vec<String>,
    #[serde(default)]
    pub tax_implications: String,
    #[serde(default)]
    pub restrictions: Vec<String>,
}

fn default_version() -> u32 {
    1
}

impl Rule {
    /// Get the lookup key of this rule
    pub fn key(&self) -> RuleKey {
        RuleKey::new(self.from, self.to, self.transaction_type)
    }

    /// Whether `amount` lies within `[min_amount, max_amount]`
    pub fn permits(&self, amount: Decimal) -> bool {
        self.min_amount.value() <= amount && amount <= self.max_amount.value()
    }

    /// Whether `amount` meets the reporting threshold
    pub fn requires_report(&self, amount: Decimal) -> bool {
        amount >= self.reporting_threshold.value()
    }

    fn validate(&self) -> ComplianceResult<()> {
        if self.min_amount > self.max_amount {
            return Err(ComplianceError::ConfigError(format!(
                "rule {}: min_amount {} exceeds max_amount {}",
                self.key(),
                self.min_amount,
                self.max_amount
            )));
        }
        Ok(())
    }
}

/// Read-only store of cross-border rules
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: BTreeMap<RuleKey, Rule>,
}

impl RuleStore {
    /// Build a store from a list of rules
    ///
    /// When two rules share a key, the higher `version` wins.
    /// Two rules with the same key and version are a configuration error.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> ComplianceResult<Self> {
        let mut map = BTreeMap::new();

        for rule in rules {
            rule.validate()?;

            match map.entry(rule.key()) {
                Entry::Vacant(slot) => {
                    slot.insert(rule);
                }
                Entry::Occupied(mut slot) => {
                    let existing: &Rule = slot.get();
                    if existing.version == rule.version {
                        return Err(ComplianceError::ConfigError(format!(
                            "duplicate rule {} at version {}",
                            rule.key(),
                            rule.version
                        )));
                    }
                    if rule.version > existing.version {
                        slot.insert(rule);
                    }
                }
            }
        }

        Ok(Self { rules: map })
    }

    /// Load rules from a JSON file containing an array of rules
    pub fn from_file(path: &Path) -> ComplianceResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let rules: Vec<Rule> = serde_json::from_str(&content)?;
        Self::from_rules(rules)
    }

    /// Built-in rule set used when no rule file is configured
    pub fn builtin() -> Self {
        // Validated by `test_builtin_rules_are_valid`.
        let rules = builtin_rules()
            .into_iter()
            .map(|rule| (rule.key(), rule))
            .collect();
        Self { rules }
    }

    /// Look up the rule for an exact key
    pub fn lookup(
        &self,
        from: Jurisdiction,
        to: Jurisdiction,
        transaction_type: TransactionType,
    ) -> ComplianceResult<&Rule> {
        self.rules
            .get(&RuleKey::new(from, to, transaction_type))
            .ok_or(ComplianceError::RuleNotFound {
                from,
                to,
                transaction_type,
            })
    }

    /// Iterate rules in key order
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// SHA-256 over the canonical JSON of all rules in key order
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for rule in self.rules.values() {
            // Serializing plain data cannot fail.
            if let Ok(bytes) = serde_json::to_vec(rule) {
                hasher.update(&bytes);
                hasher.update(b"\n");
            }
        }
        hex::encode(hasher.finalize())
    }
}

fn amount(units: u64) -> Amount {
    Amount::from_units(units)
}

fn docs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Default cross-border rules
pub fn builtin_rules() -> Vec<Rule> {
    use Jurisdiction::*;
    use TransactionType::*;

    vec![
        Rule {
            from: Us,
            to: Eu,
            transaction_type: Payment,
            version: 1,
            min_amount: amount(0),
            max_amount: amount(10_000),
            reporting_threshold: amount(10_000),
            required_documents: docs(&["Commercial invoice", "Beneficiary KYC record"]),
            tax_implications: "No withholding; VAT reverse charge may apply".to_string(),
            restrictions: docs(&["Sanctioned counterparties prohibited"]),
        },
        Rule {
            from: Eu,
            to: Us,
            transaction_type: Payment,
            version: 1,
            min_amount: amount(0),
            max_amount: amount(50_000),
            reporting_threshold: amount(12_500),
            required_documents: docs(&["Commercial invoice", "W-8BEN-E form"]),
            tax_implications: "Treaty rate withholding may apply".to_string(),
            restrictions: Vec::new(),
        },
        Rule {
            from: Us,
            to: Uk,
            transaction_type: Transfer,
            version: 1,
            min_amount: amount(1),
            max_amount: amount(250_000),
            reporting_threshold: amount(10_000),
            required_documents: docs(&["Source of funds declaration"]),
            tax_implications: "No withholding on intra-group transfers".to_string(),
            restrictions: docs(&["Intra-group transfers only"]),
        },
        Rule {
            from: Us,
            to: Ca,
            transaction_type: Payroll,
            version: 1,
            min_amount: amount(0),
            max_amount: amount(100_000),
            reporting_threshold: amount(25_000),
            required_documents: docs(&["Employment agreement", "T4 registration"]),
            tax_implications: "Canadian payroll withholding and CPP contributions".to_string(),
            restrictions: Vec::new(),
        },
        Rule {
            from: Eu,
            to: Uk,
            transaction_type: Invoice,
            version: 1,
            min_amount: amount(0),
            max_amount: amount(500_000),
            reporting_threshold: amount(100_000),
            required_documents: docs(&["VAT invoice", "Customs declaration for goods"]),
            tax_implications: "UK import VAT applies".to_string(),
            restrictions: Vec::new(),
        },
        Rule {
            from: Sg,
            to: Us,
            transaction_type: Contract,
            version: 1,
            min_amount: amount(1_000),
            max_amount: amount(1_000_000),
            reporting_threshold: amount(100_000),
            required_documents: docs(&["Signed contract", "Export control classification"]),
            tax_implications: "US-sourced income subject to 30% withholding absent treaty"
                .to_string(),
            restrictions: docs(&["Export-controlled technology requires licence"]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rule(from: Jurisdiction, to: Jurisdiction, version: u32, max: u64) -> Rule {
        Rule {
            from,
            to,
            transaction_type: TransactionType::Payment,
            version,
            min_amount: Amount::ZERO,
            max_amount: amount(max),
            reporting_threshold: amount(max),
            required_documents: vec![],
            tax_implications: String::new(),
            restrictions: vec![],
        }
    }

    #[test]
    fn test_builtin_rules_are_valid() {
        let store = RuleStore::from_rules(builtin_rules()).unwrap();
        assert_eq!(store.len(), builtin_rules().len());
        assert_eq!(store.fingerprint(), RuleStore::builtin().fingerprint());
    }

    #[test]
    fn test_lookup_exact_key() {
        let store = RuleStore::builtin();
        let rule = store
            .lookup(Jurisdiction::Us, Jurisdiction::Eu, TransactionType::Payment)
            .unwrap();
        assert_eq!(rule.max_amount.value(), dec!(10000));

        // Direction matters
        let reverse = store
            .lookup(Jurisdiction::Eu, Jurisdiction::Us, TransactionType::Payment)
            .unwrap();
        assert_eq!(reverse.max_amount.value(), dec!(50000));
    }

    #[test]
    fn test_lookup_missing_is_rule_not_found() {
        let store = RuleStore::builtin();
        let err = store
            .lookup(Jurisdiction::Ca, Jurisdiction::Jp, TransactionType::Invoice)
            .unwrap_err();
        assert!(err.is_config_gap());
    }

    #[test]
    fn test_higher_version_wins() {
        let store = RuleStore::from_rules(vec![
            rule(Jurisdiction::Us, Jurisdiction::Eu, 2, 20_000),
            rule(Jurisdiction::Us, Jurisdiction::Eu, 1, 10_000),
            rule(Jurisdiction::Us, Jurisdiction::Eu, 3, 30_000),
        ])
        .unwrap();

        let found = store
            .lookup(Jurisdiction::Us, Jurisdiction::Eu, TransactionType::Payment)
            .unwrap();
        assert_eq!(found.version, 3);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_version_rejected() {
        let result = RuleStore::from_rules(vec![
            rule(Jurisdiction::Us, Jurisdiction::Eu, 1, 20_000),
            rule(Jurisdiction::Us, Jurisdiction::Eu, 1, 10_000),
        ]);
        assert!(matches!(result, Err(ComplianceError::ConfigError(_))));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut bad = rule(Jurisdiction::Us, Jurisdiction::Eu, 1, 100);
        bad.min_amount = amount(500);
        assert!(RuleStore::from_rules(vec![bad]).is_err());
    }

    #[test]
    fn test_fingerprint_changes_with_rules() {
        let a = RuleStore::from_rules(vec![rule(Jurisdiction::Us, Jurisdiction::Eu, 1, 100)]).unwrap();
        let b = RuleStore::from_rules(vec![rule(Jurisdiction::Us, Jurisdiction::Eu, 1, 200)]).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let json = r#"[
            {
                "from": "US",
                "to": "EU",
                "transaction_type": "payment",
                "min_amount": "0",
                "max_amount": "10000",
                "reporting_threshold": "10000",
                "required_documents": ["Invoice"]
            }
        ]"#;
        std::fs::write(&path, json).unwrap();

        let store = RuleStore::from_file(&path).unwrap();
        let rule = store
            .lookup(Jurisdiction::Us, Jurisdiction::Eu, TransactionType::Payment)
            .unwrap();
        assert_eq!(rule.version, 1);
        assert_eq!(rule.required_documents, vec!["Invoice".to_string()]);
        assert!(rule.restrictions.is_empty());
    }

    #[test]
    fn test_permits_and_reporting_bounds() {
        let store = RuleStore::builtin();
        let rule = store
            .lookup(Jurisdiction::Us, Jurisdiction::Eu, TransactionType::Payment)
            .unwrap();

        assert!(rule.permits(dec!(0)));
        assert!(rule.permits(dec!(10000)));
        assert!(!rule.permits(dec!(10000.01)));
        assert!(rule.requires_report(dec!(10000)));
        assert!(!rule.requires_report(dec!(9999.99)));
    }
}
