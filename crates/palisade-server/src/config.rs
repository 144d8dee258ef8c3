use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use palisade_core::ReputationConfig;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub scan: ScanConfig,
    pub reputation: ReputationConfig,
    pub cache: CacheConfig,
    pub batch: BatchConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Connection parameters for the Etherscan-compatible indexing API.
#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    pub base_url: String,
    pub api_key: String,
    /// Per-attempt request timeout.
    pub timeout_ms: u64,
    /// Retries after the first attempt; 3 means up to 4 requests total.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Records requested per list; large enough to avoid truncation for
    /// ordinary wallets.
    pub page_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// TTL for cached results in seconds.
    pub ttl_seconds: u64,
    /// Eviction kicks in once the entry count crosses this ceiling.
    pub max_entries: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    /// Addresses evaluated concurrently per batch group.
    pub group_size: usize,
}

/// Address tables and thresholds for the activity analyzer.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_known_protocols")]
    pub known_protocols: Vec<ProtocolEntry>,
    /// Mixer and sanctioned contracts; interacting with any of these flags
    /// the wallet and excludes the address from the positive protocol set.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
    /// Transfers above this value (in ether) within the last 24h raise
    /// large-inflow/outflow flags.
    pub large_transfer_eth: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProtocolEntry {
    pub name: String,
    pub address: String,
}

fn protocol(name: &str, address: &str) -> ProtocolEntry {
    ProtocolEntry {
        name: name.to_string(),
        address: address.to_string(),
    }
}

fn default_known_protocols() -> Vec<ProtocolEntry> {
    vec![
        protocol("uniswap_v2", "0x7a250d5630b4cf539739df2c5dacb4c659f2488d"),
        protocol("uniswap_v3", "0xe592427a0aece92de3edee1f18e0157c05861564"),
        protocol("sushiswap", "0xd9e1ce17f2641f24ae83637ab66a2cca9c378b9f"),
        protocol("aave_v2", "0x7d2768de32b0b80b7a3454c06bdac94a69ddc7a9"),
        protocol("compound", "0x4ddc2d193948926d02f9b1fe9e1daa0718270ed5"),
        protocol("curve_3pool", "0xbebc44782c7db0a1a60cb6fe97d0b483032ff1c7"),
        protocol("oneinch_v4", "0x1111111254fb6c44bac0bed2854e76f90643097d"),
        protocol("seaport", "0x00000000006c3852cbef3e08e8df289169ede581"),
    ]
}

fn default_denylist() -> Vec<String> {
    vec![
        // Tornado Cash router and fixed-denomination ETH pools
        "0x722122df12d4e14e13ac3b6895a86e84145b6967".to_string(),
        "0x12d66f87a04a9e220743712ce6d9bb1b5616b8fc".to_string(),
        "0x47ce0c6ed5b0ce3d3a51fdb1c52dc66a7c3c2936".to_string(),
        "0x910cbd523d972eb0a6f4cae4618ad62622b39dbf".to_string(),
        "0xa160cdab225685da1d56aa342ad8841c3b53f291".to_string(),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            scan: ScanConfig {
                base_url: "https://api.etherscan.io/api".to_string(),
                api_key: String::new(),
                timeout_ms: 10_000,
                max_retries: 3,
                backoff_base_ms: 500,
                backoff_max_ms: 8_000,
                page_size: 2_000,
            },
            reputation: ReputationConfig::default(),
            cache: CacheConfig {
                ttl_seconds: 300,
                max_entries: 1_000,
            },
            batch: BatchConfig { group_size: 8 },
            analysis: AnalysisConfig {
                known_protocols: default_known_protocols(),
                denylist: default_denylist(),
                large_transfer_eth: 10.0,
            },
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("scan.base_url", "https://api.etherscan.io/api")?
            .set_default("scan.api_key", "")?
            .set_default("scan.timeout_ms", 10_000)?
            .set_default("scan.max_retries", 3)?
            .set_default("scan.backoff_base_ms", 500)?
            .set_default("scan.backoff_max_ms", 8_000)?
            .set_default("scan.page_size", 2_000)?
            .set_default("reputation.bypass_threshold", 70)?
            .set_default("reputation.simple_threshold", 40)?
            .set_default("reputation.weights.transaction_activity", 30)?
            .set_default("reputation.weights.contract_interactions", 20)?
            .set_default("reputation.weights.wallet_age", 20)?
            .set_default("reputation.weights.token_diversity", 10)?
            .set_default("reputation.weights.risk_multiplier", 1)?
            .set_default("cache.ttl_seconds", 300)?
            .set_default("cache.max_entries", 1_000)?
            .set_default("batch.group_size", 8)?
            .set_default("analysis.large_transfer_eth", 10.0)?
            // Load from config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (PALISADE__SERVER__HOST, etc.)
            // Using double underscore as separator to handle nested keys with underscores
            .add_source(
                Environment::with_prefix("PALISADE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Eager validation at construction time; the process refuses to start
    /// on a bad configuration instead of warning at use time.
    pub fn validate(&self) -> AppResult<()> {
        self.reputation.validate().map_err(AppError::from)?;

        if self.scan.page_size == 0 {
            return Err(AppError::Config("scan.page_size must be at least 1".into()));
        }
        if self.scan.timeout_ms == 0 {
            return Err(AppError::Config("scan.timeout_ms must be nonzero".into()));
        }
        if self.scan.backoff_base_ms > self.scan.backoff_max_ms {
            return Err(AppError::Config(format!(
                "scan.backoff_base_ms ({}) must not exceed scan.backoff_max_ms ({})",
                self.scan.backoff_base_ms, self.scan.backoff_max_ms
            )));
        }
        if self.cache.ttl_seconds == 0 {
            return Err(AppError::Config("cache.ttl_seconds must be nonzero".into()));
        }
        if self.cache.max_entries == 0 {
            return Err(AppError::Config("cache.max_entries must be at least 1".into()));
        }
        if self.batch.group_size == 0 {
            return Err(AppError::Config("batch.group_size must be at least 1".into()));
        }
        if self.analysis.large_transfer_eth <= 0.0 {
            return Err(AppError::Config(
                "analysis.large_transfer_eth must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
