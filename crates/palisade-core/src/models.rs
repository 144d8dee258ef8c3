//! Domain models for wallet reputation scoring
//!
//! These are the canonical structures shared between the scoring engine and
//! the reputation service: the activity snapshot derived from ledger data,
//! the risk signals attached to it, and the scored, classified result handed
//! back to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Classification enums
// =============================================================================

/// Coarse trust tier derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustLevel::Low => write!(f, "low"),
            TrustLevel::Medium => write!(f, "medium"),
            TrustLevel::High => write!(f, "high"),
        }
    }
}

/// Verification strictness a caller should apply for this wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMode {
    /// Score clears the bypass threshold; skip verification entirely.
    Bypass,
    /// Score clears the simple threshold; light verification.
    Simple,
    /// Everything else gets the full challenge.
    Advanced,
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationMode::Bypass => write!(f, "bypass"),
            VerificationMode::Simple => write!(f, "simple"),
            VerificationMode::Advanced => write!(f, "advanced"),
        }
    }
}

/// Provenance of a scored result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Derived from ledger data fetched for this request (or a cached copy of it).
    Live,
    /// Synthesized deterministically because live data was unavailable or not requested.
    Fallback,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Live => write!(f, "live"),
            DataSource::Fallback => write!(f, "fallback"),
        }
    }
}

// =============================================================================
// Risk flags
// =============================================================================

/// Severity attached to a mixer interaction flag.
pub const MIXER_SEVERITY: i32 = -30;
/// Severity attached to large inflow/outflow flags.
pub const LARGE_TRANSFER_SEVERITY: i32 = -10;
/// Severity attached to the no-activity flag.
pub const NO_ACTIVITY_SEVERITY: i32 = -20;

/// Kind of negative signal observed on a wallet. Closed set; scoring only
/// looks at severity, the kind is for callers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlagKind {
    MixerInteraction,
    LargeInflow,
    LargeOutflow,
    NoActivity,
}

impl fmt::Display for RiskFlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskFlagKind::MixerInteraction => write!(f, "mixer_interaction"),
            RiskFlagKind::LargeInflow => write!(f, "large_inflow"),
            RiskFlagKind::LargeOutflow => write!(f, "large_outflow"),
            RiskFlagKind::NoActivity => write!(f, "no_activity"),
        }
    }
}

/// A negative signal with its score penalty. Severity is always negative;
/// the constructors below are the only way flags are built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFlag {
    pub kind: RiskFlagKind,
    pub severity: i32,
    pub description: String,
}

impl RiskFlag {
    pub fn mixer_interaction(counterparty: &str) -> Self {
        Self {
            kind: RiskFlagKind::MixerInteraction,
            severity: MIXER_SEVERITY,
            description: format!("Interacted with known mixer contract {}", counterparty),
        }
    }

    pub fn large_inflow(tx_hash: &str) -> Self {
        Self {
            kind: RiskFlagKind::LargeInflow,
            severity: LARGE_TRANSFER_SEVERITY,
            description: format!("Large inbound transfer in the last 24h ({})", tx_hash),
        }
    }

    pub fn large_outflow(tx_hash: &str) -> Self {
        Self {
            kind: RiskFlagKind::LargeOutflow,
            severity: LARGE_TRANSFER_SEVERITY,
            description: format!("Large outbound transfer in the last 24h ({})", tx_hash),
        }
    }

    pub fn no_activity() -> Self {
        Self {
            kind: RiskFlagKind::NoActivity,
            severity: NO_ACTIVITY_SEVERITY,
            description: "No transaction history observed for this wallet".to_string(),
        }
    }
}

// =============================================================================
// Wallet activity snapshot
// =============================================================================

/// Derived snapshot of an address's on-chain activity, the scoring engine's
/// input. All counts are observations over the fetched history window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletData {
    /// Subject account identifier, echoed with the caller's casing.
    pub address: String,

    /// Count of ledger transactions observed (inbound and outbound).
    pub transaction_count: u32,

    /// Count of internal / contract-triggered transactions.
    pub contract_interactions: u32,

    /// Recognized protocol tags seen as counterparties, deduplicated and sorted.
    pub known_protocols: Vec<String>,

    /// Whole days since the earliest observed transaction; 0 with no history.
    pub wallet_age_days: u32,

    /// Distinct fungible token contracts touched.
    pub token_count: u32,

    /// Distinct non-fungible asset contracts touched.
    pub nft_count: u32,

    /// Negative signals, in detection order.
    pub risk_flags: Vec<RiskFlag>,

    /// Epoch millis of the most recent transaction, 0 with no history.
    pub last_activity: i64,
}

impl WalletData {
    /// Zero-activity snapshot for an address, used as the fallback base.
    pub fn empty(address: &str) -> Self {
        Self {
            address: address.to_string(),
            transaction_count: 0,
            contract_interactions: 0,
            known_protocols: Vec::new(),
            wallet_age_days: 0,
            token_count: 0,
            nft_count: 0,
            risk_flags: Vec::new(),
            last_activity: 0,
        }
    }

    pub fn total_assets(&self) -> u32 {
        self.token_count + self.nft_count
    }
}

/// The externally visible output of a reputation evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationResult {
    pub score: u8,
    pub trust_level: TrustLevel,
    pub verification_mode: VerificationMode,
    pub wallet_data: WalletData,
    pub data_source: DataSource,
    pub computed_at: DateTime<Utc>,
}

impl ReputationResult {
    pub fn address(&self) -> &str {
        &self.wallet_data.address
    }
}

// =============================================================================
// Scoring configuration
// =============================================================================

/// Point budgets for each scoring dimension. Bracket credits inside a
/// dimension are fractions of its budget, so tuning a budget rescales the
/// whole dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Budget for raw transaction activity.
    pub transaction_activity: u32,
    /// Budget split between contract usage and recognized protocols.
    pub contract_interactions: u32,
    /// Budget for wallet age.
    pub wallet_age: u32,
    /// Budget for token/NFT diversity.
    pub token_diversity: u32,
    /// Multiplier applied to summed risk severities (1 = apply as-is).
    pub risk_multiplier: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            transaction_activity: 30,
            contract_interactions: 20,
            wallet_age: 20,
            token_diversity: 10,
            risk_multiplier: 1,
        }
    }
}

impl ScoringWeights {
    /// Sum of the positive point budgets.
    pub fn total(&self) -> u32 {
        self.transaction_activity + self.contract_interactions + self.wallet_age + self.token_diversity
    }

    pub fn validate(&self) -> CoreResult<()> {
        let total = self.total();
        if total == 0 {
            return Err(CoreError::InvalidConfig(
                "scoring weights must not all be zero".to_string(),
            ));
        }
        if total > 100 {
            return Err(CoreError::InvalidConfig(format!(
                "scoring weight budgets must sum to at most 100, got {}",
                total
            )));
        }
        Ok(())
    }
}

/// Thresholds and weights for classification. Invariant: the bypass
/// threshold is strictly above the simple threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationConfig {
    /// Score at or above which verification is skipped entirely.
    pub bypass_threshold: u8,
    /// Score at or above which light verification is enough.
    pub simple_threshold: u8,
    pub weights: ScoringWeights,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            bypass_threshold: 70,
            simple_threshold: 40,
            weights: ScoringWeights::default(),
        }
    }
}

impl ReputationConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.bypass_threshold > 100 {
            return Err(CoreError::InvalidConfig(format!(
                "bypass threshold must be at most 100, got {}",
                self.bypass_threshold
            )));
        }
        if self.bypass_threshold <= self.simple_threshold {
            return Err(CoreError::InvalidConfig(format!(
                "bypass threshold ({}) must be above the simple threshold ({})",
                self.bypass_threshold, self.simple_threshold
            )));
        }
        self.weights.validate()
    }
}

/// Reject empty or whitespace-only addresses before any work happens.
pub fn validate_address(address: &str) -> CoreResult<()> {
    if address.trim().is_empty() {
        return Err(CoreError::InvalidInput(
            "address must not be empty".to_string(),
        ));
    }
    Ok(())
}
