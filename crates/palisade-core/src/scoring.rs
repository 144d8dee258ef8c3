//! Trust score calculation
//!
//! Reduces a [`WalletData`] snapshot to a bounded score through a weighted
//! sum over four positive dimensions (activity, contract usage, age, asset
//! diversity) plus the summed risk penalties, then classifies the score
//! into a trust tier and a recommended verification mode.

use crate::models::{ReputationConfig, ScoringWeights, TrustLevel, VerificationMode, WalletData};

/// Score at or above which a wallet is considered high trust.
const HIGH_TRUST_FLOOR: u8 = 70;
/// Score at or above which a wallet is considered medium trust.
const MEDIUM_TRUST_FLOOR: u8 = 40;

/// Compute the trust score for a wallet snapshot, clamped into [0, 100].
pub fn calculate_score(data: &WalletData, weights: &ScoringWeights) -> u8 {
    let mut total: i64 = 0;

    // Transaction activity: full budget for a deep history, half for a
    // steady one, a starter credit for any activity at all.
    let activity = weights.transaction_activity as i64;
    total += match data.transaction_count {
        0 => 0,
        1..=10 => activity / 6,
        11..=100 => activity / 2,
        _ => activity,
    };

    // Contract usage and recognized protocol interactions earn independent
    // credits, each half of the dimension budget.
    let contracts = weights.contract_interactions as i64;
    if data.contract_interactions > 0 {
        total += contracts / 2;
    }
    if !data.known_protocols.is_empty() {
        total += contracts / 2;
    }

    // Wallet age: six months for the full budget, one month for half.
    // The floor credit applies below that, including at age zero.
    let age = weights.wallet_age as i64;
    total += if data.wallet_age_days >= 180 {
        age
    } else if data.wallet_age_days >= 30 {
        age / 2
    } else {
        age / 4
    };

    // Asset diversity across fungible and non-fungible contracts.
    let diversity = weights.token_diversity as i64;
    total += match data.total_assets() {
        0 => 0,
        1..=2 => diversity * 3 / 10,
        3..=10 => diversity * 7 / 10,
        _ => diversity,
    };

    // Risk severities are already negative; summed without rescaling under
    // the default multiplier.
    let penalty: i64 = data.risk_flags.iter().map(|f| f.severity as i64).sum();
    total += penalty * weights.risk_multiplier as i64;

    total.clamp(0, 100) as u8
}

/// Trust tier for a score.
pub fn trust_level(score: u8) -> TrustLevel {
    if score >= HIGH_TRUST_FLOOR {
        TrustLevel::High
    } else if score >= MEDIUM_TRUST_FLOOR {
        TrustLevel::Medium
    } else {
        TrustLevel::Low
    }
}

/// Verification strictness for a score under the configured thresholds.
pub fn verification_mode(score: u8, config: &ReputationConfig) -> VerificationMode {
    if score >= config.bypass_threshold {
        VerificationMode::Bypass
    } else if score >= config.simple_threshold {
        VerificationMode::Simple
    } else {
        VerificationMode::Advanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskFlag;

    fn snapshot(tx: u32, internal: u32, protocols: &[&str], age: u32, tokens: u32, nfts: u32) -> WalletData {
        WalletData {
            address: "0x1111111111111111111111111111111111111111".to_string(),
            transaction_count: tx,
            contract_interactions: internal,
            known_protocols: protocols.iter().map(|s| s.to_string()).collect(),
            wallet_age_days: age,
            token_count: tokens,
            nft_count: nfts,
            risk_flags: Vec::new(),
            last_activity: 0,
        }
    }

    #[test]
    fn reference_scenario_scores_eighty() {
        // 150 txs, contract usage incl. one known protocol, 200 days old,
        // 12 assets, clean history: 30 + 20 + 20 + 10.
        let data = snapshot(150, 5, &["uniswap_v2"], 200, 9, 3);
        let score = calculate_score(&data, &ScoringWeights::default());
        assert_eq!(score, 80);
        assert_eq!(trust_level(score), TrustLevel::High);
        assert_eq!(
            verification_mode(score, &ReputationConfig::default()),
            VerificationMode::Bypass
        );
    }

    #[test]
    fn activity_brackets_are_monotonic() {
        let weights = ScoringWeights::default();
        let low = calculate_score(&snapshot(5, 0, &[], 10, 0, 0), &weights);
        let mid = calculate_score(&snapshot(50, 0, &[], 10, 0, 0), &weights);
        let high = calculate_score(&snapshot(150, 0, &[], 10, 0, 0), &weights);
        assert!(mid >= low, "11-100 bracket must not score below 1-10");
        assert!(high >= mid, "101+ bracket must not score below 11-100");
    }

    #[test]
    fn zero_transaction_wallet_keeps_age_floor() {
        // A wallet with no history still gets the sub-month age credit;
        // only the activity dimension is zeroed.
        let score = calculate_score(&snapshot(0, 0, &[], 0, 0, 0), &ScoringWeights::default());
        assert_eq!(score, 5);
    }

    #[test]
    fn contract_credits_are_independent() {
        let weights = ScoringWeights::default();
        let neither = calculate_score(&snapshot(1, 0, &[], 0, 0, 0), &weights);
        let internal_only = calculate_score(&snapshot(1, 3, &[], 0, 0, 0), &weights);
        let both = calculate_score(&snapshot(1, 3, &["aave_v2"], 0, 0, 0), &weights);
        assert_eq!(internal_only - neither, 10);
        assert_eq!(both - internal_only, 10);
    }

    #[test]
    fn diversity_brackets() {
        let weights = ScoringWeights::default();
        let base = calculate_score(&snapshot(1, 0, &[], 0, 0, 0), &weights);
        assert_eq!(calculate_score(&snapshot(1, 0, &[], 0, 1, 0), &weights) - base, 3);
        assert_eq!(calculate_score(&snapshot(1, 0, &[], 0, 2, 1), &weights) - base, 7);
        assert_eq!(calculate_score(&snapshot(1, 0, &[], 0, 8, 4), &weights) - base, 10);
    }

    #[test]
    fn mixer_flag_costs_exactly_thirty() {
        let weights = ScoringWeights::default();
        let mut data = snapshot(150, 5, &["uniswap_v2"], 200, 9, 3);
        let clean = calculate_score(&data, &weights);
        data.risk_flags.push(RiskFlag::mixer_interaction("0xmixer"));
        let flagged = calculate_score(&data, &weights);
        assert_eq!(clean - flagged, 30);
    }

    #[test]
    fn score_clamps_at_zero() {
        let mut data = snapshot(1, 0, &[], 0, 0, 0);
        data.risk_flags.push(RiskFlag::mixer_interaction("0xmixer"));
        data.risk_flags.push(RiskFlag::mixer_interaction("0xmixer2"));
        data.risk_flags.push(RiskFlag::no_activity());
        assert_eq!(calculate_score(&data, &ScoringWeights::default()), 0);
    }

    #[test]
    fn score_clamps_at_one_hundred() {
        // Inflated budgets would push past 100 without the clamp.
        let weights = ScoringWeights {
            transaction_activity: 80,
            contract_interactions: 20,
            wallet_age: 10,
            token_diversity: 10,
            risk_multiplier: 1,
        };
        let data = snapshot(500, 10, &["uniswap_v2", "aave_v2"], 400, 20, 5);
        assert_eq!(calculate_score(&data, &weights), 100);
    }

    #[test]
    fn classification_boundaries() {
        let config = ReputationConfig::default();
        assert_eq!(trust_level(70), TrustLevel::High);
        assert_eq!(verification_mode(70, &config), VerificationMode::Bypass);
        assert_eq!(trust_level(69), TrustLevel::Medium);
        assert_eq!(verification_mode(69, &config), VerificationMode::Simple);
        assert_eq!(trust_level(40), TrustLevel::Medium);
        assert_eq!(verification_mode(40, &config), VerificationMode::Simple);
        assert_eq!(trust_level(39), TrustLevel::Low);
        assert_eq!(verification_mode(39, &config), VerificationMode::Advanced);
        assert_eq!(trust_level(0), TrustLevel::Low);
        assert_eq!(verification_mode(0, &config), VerificationMode::Advanced);
        assert_eq!(trust_level(100), TrustLevel::High);
        assert_eq!(verification_mode(100, &config), VerificationMode::Bypass);
    }
}
