use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use palisade_core::{DataSource, ReputationResult, RiskFlag, TrustLevel, VerificationMode};

use crate::reputation::ReputationOptions;

// ============================================================================
// GET /api/v1/reputation/{address}
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReputationQuery {
    /// Evaluate from live ledger data; false selects the fallback path.
    #[serde(default = "default_live")]
    pub live: bool,
    /// Skip the cache read and recompute.
    #[serde(default)]
    pub refresh: bool,
    /// Override the configured cache TTL for this result, in seconds.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

fn default_live() -> bool {
    true
}

impl ReputationQuery {
    pub fn options(&self) -> ReputationOptions {
        ReputationOptions {
            live: self.live,
            refresh: self.refresh,
            ttl_override: self.ttl_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReputationResponse {
    pub address: String,
    pub score: u8,
    pub trust_level: TrustLevel,
    pub verification_mode: VerificationMode,
    pub data_source: DataSource,
    pub computed_at: DateTime<Utc>,
    pub wallet: WalletActivity,
}

#[derive(Debug, Serialize)]
pub struct WalletActivity {
    pub transaction_count: u32,
    pub contract_interactions: u32,
    pub known_protocols: Vec<String>,
    pub wallet_age_days: u32,
    pub token_count: u32,
    pub nft_count: u32,
    pub risk_flags: Vec<RiskFlag>,
    pub last_activity: i64,
}

impl From<ReputationResult> for ReputationResponse {
    fn from(result: ReputationResult) -> Self {
        let data = result.wallet_data;
        Self {
            address: data.address.clone(),
            score: result.score,
            trust_level: result.trust_level,
            verification_mode: result.verification_mode,
            data_source: result.data_source,
            computed_at: result.computed_at,
            wallet: WalletActivity {
                transaction_count: data.transaction_count,
                contract_interactions: data.contract_interactions,
                known_protocols: data.known_protocols,
                wallet_age_days: data.wallet_age_days,
                token_count: data.token_count,
                nft_count: data.nft_count,
                risk_flags: data.risk_flags,
                last_activity: data.last_activity,
            },
        }
    }
}

// ============================================================================
// POST /api/v1/reputation/batch
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub addresses: Vec<String>,
    #[serde(default = "default_live")]
    pub live: bool,
    #[serde(default)]
    pub refresh: bool,
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl BatchRequest {
    pub fn options(&self) -> ReputationOptions {
        ReputationOptions {
            live: self.live,
            refresh: self.refresh,
            ttl_override: self.ttl_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub requested: usize,
    pub evaluated: usize,
    pub results: HashMap<String, ReputationResponse>,
}

// ============================================================================
// Health and cache management
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cached_entries: usize,
}

#[derive(Debug, Serialize)]
pub struct CacheClearResponse {
    pub dropped: usize,
}
