use crate::checks::NullPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub customers: usize,
    pub devices: usize,
    pub accounts: usize,
    pub transactions: usize,
    pub auth_logs: usize,
    /// Customer-device links generated per customer.
    pub links_per_customer: usize,
    /// Calendar year all generated timestamps fall into.
    pub year: i32,
    pub auth_methods: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            customers: 100,
            devices: 80,
            accounts: 200,
            transactions: 800,
            auth_logs: 600,
            links_per_customer: 3,
            year: 2025,
            auth_methods: vec!["OTP".into(), "BIOMETRIC".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Single-transaction amount (VND) from which strong auth is required.
    pub high_value_threshold: f64,
    /// Daily per-customer total (VND) above which strong auth is required.
    pub daily_volume_threshold: f64,
    pub strong_auth_methods: Vec<String>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            high_value_threshold: 10_000_000.0,
            daily_volume_threshold: 20_000_000.0,
            strong_auth_methods: vec!["OTP".into(), "BIOMETRIC".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Required shape of a CCCD national number, matched against the whole value.
    pub national_id_pattern: String,
    pub foreign_key_nulls: NullPolicy,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            national_id_pattern: r"\d{12}".into(),
            foreign_key_nulls: NullPolicy::Violation,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DqConfig {
    pub generator: GeneratorConfig,
    pub risk: RiskConfig,
    pub checks: CheckConfig,
}

impl DqConfig {
    /// Load from a JSON file. Missing sections and fields fall back to
    /// the defaults. In tests, use `DqConfig::default_test()`.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DqConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Small population for fast tests.
    pub fn default_test() -> Self {
        Self {
            generator: GeneratorConfig {
                seed: 7,
                customers: 20,
                devices: 15,
                accounts: 30,
                transactions: 120,
                auth_logs: 80,
                ..GeneratorConfig::default()
            },
            ..Self::default()
        }
    }
}
