//! Application context - wires everything together

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use pulse_compliance::{
    builtin_frameworks, load_frameworks, ComplianceConfig, ComplianceEngine, ComplianceLedger,
    Framework, RuleStore,
};

pub const CONFIG_FILE: &str = "config.json";
pub const RULES_FILE: &str = "rules.json";
pub const FRAMEWORKS_FILE: &str = "frameworks.json";
pub const LEDGER_FILE: &str = "compliance.jsonl";

/// Application context - owns the engine built from a data directory
///
/// Layout of the data directory:
///
/// ```text
/// data/
/// ├── config.json        (optional, defaults otherwise)
/// ├── rules.json         (optional, built-in rules otherwise)
/// ├── frameworks.json    (written by `init`)
/// └── compliance.jsonl   (ledger, replayed on startup)
/// ```
pub struct AppContext {
    pub engine: Arc<ComplianceEngine>,
    data_path: PathBuf,
}

impl AppContext {
    /// Create a new application context
    pub fn new(data_path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_path)?;

        let config = load_config(&data_path)?;
        let rules = load_rules(&data_path)?;
        let frameworks = load_catalog(&data_path)?;
        let ledger = ComplianceLedger::open(data_path.join(LEDGER_FILE))?;

        let engine = ComplianceEngine::builder()
            .config(config)
            .rules(rules)
            .frameworks(frameworks)
            .ledger(ledger)
            .build()?;

        tracing::debug!(
            data = %data_path.display(),
            replayed = engine.replayed_events(),
            "Application context ready"
        );

        Ok(Self {
            engine: Arc::new(engine),
            data_path,
        })
    }

    /// Whether `init` has written a framework catalog
    pub fn is_initialized(&self) -> bool {
        self.data_path.join(FRAMEWORKS_FILE).exists()
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_path.join(LEDGER_FILE)
    }
}

fn load_config(data_path: &Path) -> Result<ComplianceConfig, anyhow::Error> {
    let path = data_path.join(CONFIG_FILE);
    if path.exists() {
        Ok(ComplianceConfig::from_file(&path)?)
    } else {
        Ok(ComplianceConfig::default())
    }
}

fn load_rules(data_path: &Path) -> Result<RuleStore, anyhow::Error> {
    let path = data_path.join(RULES_FILE);
    if path.exists() {
        Ok(RuleStore::from_file(&path)?)
    } else {
        Ok(RuleStore::builtin())
    }
}

fn load_catalog(data_path: &Path) -> Result<Vec<Framework>, anyhow::Error> {
    let path = data_path.join(FRAMEWORKS_FILE);
    if path.exists() {
        Ok(load_frameworks(&path)?)
    } else {
        // Review dates float with the clock until `init` pins them
        Ok(builtin_frameworks(Utc::now()))
    }
}
