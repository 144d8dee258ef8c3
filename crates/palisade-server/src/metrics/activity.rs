//! Activity analysis over raw account history
//!
//! Pure functions from fetched record lists to the structured signals the
//! scoring engine consumes. Evaluation time is passed in explicitly; nothing
//! here touches the network, the clock, or mutable state.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use palisade_core::RiskFlag;

use crate::config::AnalysisConfig;
use crate::indexer::{TransferRecord, TxRecord};

const DAY_MS: i64 = 86_400_000;

/// Negative signals over the transaction list: a denylisted (mixer)
/// counterparty anywhere in the history, and over-threshold transfers
/// within the last 24 hours, split by direction. At most one flag per
/// condition. Absence of history is deliberately not flagged here; that is
/// a property of the whole fetch, raised by the orchestrator.
pub fn analyze_risk_flags(
    transactions: &[TxRecord],
    subject: &str,
    analysis: &AnalysisConfig,
    now_ms: i64,
) -> Vec<RiskFlag> {
    let subject = subject.to_ascii_lowercase();
    let denylist: HashSet<String> = analysis
        .denylist
        .iter()
        .map(|a| a.to_ascii_lowercase())
        .collect();
    let threshold = large_transfer_threshold_wei(analysis.large_transfer_eth);
    let window_start = now_ms - DAY_MS;

    let mut mixer: Option<RiskFlag> = None;
    let mut inflow: Option<RiskFlag> = None;
    let mut outflow: Option<RiskFlag> = None;

    for tx in transactions {
        let from = tx.from.to_ascii_lowercase();
        let to = tx.to.to_ascii_lowercase();

        if mixer.is_none() {
            let counterparty = if from == subject { &to } else { &from };
            if denylist.contains(counterparty) {
                mixer = Some(RiskFlag::mixer_interaction(counterparty));
            }
        }

        // Reverted transactions moved no value; they never raise transfer flags.
        let reverted = tx.is_error == "1";
        if !reverted && tx.timestamp_ms() >= window_start && tx.value_wei() > threshold {
            if from == subject && outflow.is_none() {
                outflow = Some(RiskFlag::large_outflow(&tx.hash));
            } else if to == subject && inflow.is_none() {
                inflow = Some(RiskFlag::large_inflow(&tx.hash));
            }
        }
    }

    let mut flags = Vec::new();
    flags.extend(mixer);
    flags.extend(inflow);
    flags.extend(outflow);
    flags
}

/// Recognized protocol tags seen as transaction counterparties, sorted and
/// deduplicated. Denylisted addresses never contribute a positive tag, even
/// if they also appear in the protocol table.
pub fn detect_protocol_interactions(
    transactions: &[TxRecord],
    subject: &str,
    analysis: &AnalysisConfig,
) -> Vec<String> {
    let subject = subject.to_ascii_lowercase();
    let denylist: HashSet<String> = analysis
        .denylist
        .iter()
        .map(|a| a.to_ascii_lowercase())
        .collect();
    let table: HashMap<String, &str> = analysis
        .known_protocols
        .iter()
        .map(|p| (p.address.to_ascii_lowercase(), p.name.as_str()))
        .collect();

    let mut tags: HashSet<&str> = HashSet::new();
    for tx in transactions {
        for counterparty in [tx.from.to_ascii_lowercase(), tx.to.to_ascii_lowercase()] {
            if counterparty == subject || denylist.contains(&counterparty) {
                continue;
            }
            if let Some(name) = table.get(&counterparty) {
                tags.insert(name);
            }
        }
    }

    let mut tags: Vec<String> = tags.into_iter().map(|t| t.to_string()).collect();
    tags.sort();
    tags
}

/// Whole days since the earliest observed transaction; 0 with no history.
pub fn calculate_wallet_age(transactions: &[TxRecord], now_ms: i64) -> u32 {
    let earliest = transactions
        .iter()
        .map(|tx| tx.timestamp_ms())
        .filter(|ts| *ts > 0)
        .min();

    match earliest {
        Some(earliest) => ((now_ms - earliest).max(0) / DAY_MS) as u32,
        None => 0,
    }
}

/// Distinct fungible / non-fungible contract addresses touched, counted
/// independently per list.
pub fn count_assets(
    token_transfers: &[TransferRecord],
    nft_transfers: &[TransferRecord],
) -> (u32, u32) {
    (
        distinct_contracts(token_transfers),
        distinct_contracts(nft_transfers),
    )
}

fn distinct_contracts(transfers: &[TransferRecord]) -> u32 {
    transfers
        .iter()
        .map(|t| t.contract_address.to_ascii_lowercase())
        .filter(|a| !a.is_empty())
        .collect::<HashSet<_>>()
        .len() as u32
}

/// Epoch millis of the most recent transaction, 0 with no history.
pub fn last_activity(transactions: &[TxRecord]) -> i64 {
    transactions
        .iter()
        .map(|tx| tx.timestamp_ms())
        .max()
        .unwrap_or(0)
}

fn large_transfer_threshold_wei(eth: f64) -> Decimal {
    let wei_per_eth = dec!(1000000000000000000);
    Decimal::from_f64_retain(eth).unwrap_or_default() * wei_per_eth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use palisade_core::RiskFlagKind;

    const SUBJECT: &str = "0x1111111111111111111111111111111111111111";
    const OTHER: &str = "0x2222222222222222222222222222222222222222";
    const MIXER: &str = "0x722122df12d4e14e13ac3b6895a86e84145b6967";
    const NOW_MS: i64 = 1_700_000_000_000;

    fn analysis() -> AnalysisConfig {
        AppConfig::default().analysis
    }

    fn tx(from: &str, to: &str, value_eth: u64, age_hours: i64) -> TxRecord {
        TxRecord {
            hash: format!("0xhash{}{}", value_eth, age_hours),
            from: from.to_string(),
            to: to.to_string(),
            value: format!("{}000000000000000000", value_eth),
            time_stamp: ((NOW_MS / 1_000) - age_hours * 3_600).to_string(),
            is_error: "0".to_string(),
        }
    }

    fn transfer(contract: &str) -> TransferRecord {
        TransferRecord {
            hash: "0xt".to_string(),
            from: SUBJECT.to_string(),
            to: OTHER.to_string(),
            contract_address: contract.to_string(),
            token_symbol: "TOK".to_string(),
            time_stamp: "1700000000".to_string(),
        }
    }

    #[test]
    fn clean_history_raises_no_flags() {
        let txs = vec![tx(SUBJECT, OTHER, 1, 2), tx(OTHER, SUBJECT, 2, 50)];
        assert!(analyze_risk_flags(&txs, SUBJECT, &analysis(), NOW_MS).is_empty());
    }

    #[test]
    fn mixer_counterparty_is_flagged_case_insensitively() {
        let txs = vec![tx(SUBJECT, &MIXER.to_uppercase(), 1, 2)];
        let flags = analyze_risk_flags(&txs, SUBJECT, &analysis(), NOW_MS);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].kind, RiskFlagKind::MixerInteraction);
        assert_eq!(flags[0].severity, -30);
    }

    #[test]
    fn large_recent_transfers_are_flagged_by_direction() {
        let txs = vec![
            tx(OTHER, SUBJECT, 50, 2),  // large inflow inside the window
            tx(SUBJECT, OTHER, 25, 10), // large outflow inside the window
        ];
        let flags = analyze_risk_flags(&txs, SUBJECT, &analysis(), NOW_MS);
        let kinds: Vec<RiskFlagKind> = flags.iter().map(|f| f.kind).collect();
        assert!(kinds.contains(&RiskFlagKind::LargeInflow));
        assert!(kinds.contains(&RiskFlagKind::LargeOutflow));
        assert_eq!(flags.len(), 2);
    }

    #[test]
    fn old_large_transfers_are_outside_the_window() {
        let txs = vec![tx(OTHER, SUBJECT, 50, 30)];
        assert!(analyze_risk_flags(&txs, SUBJECT, &analysis(), NOW_MS).is_empty());
    }

    #[test]
    fn threshold_is_exclusive() {
        // Exactly at the configured threshold does not flag; above it does.
        let at = vec![tx(OTHER, SUBJECT, 10, 2)];
        assert!(analyze_risk_flags(&at, SUBJECT, &analysis(), NOW_MS).is_empty());
        let above = vec![tx(OTHER, SUBJECT, 11, 2)];
        assert_eq!(analyze_risk_flags(&above, SUBJECT, &analysis(), NOW_MS).len(), 1);
    }

    #[test]
    fn reverted_transfers_raise_no_value_flags() {
        let mut reverted = tx(OTHER, SUBJECT, 50, 2);
        reverted.is_error = "1".to_string();
        assert!(analyze_risk_flags(&[reverted], SUBJECT, &analysis(), NOW_MS).is_empty());
    }

    #[test]
    fn repeated_conditions_flag_once() {
        let txs = vec![
            tx(SUBJECT, MIXER, 1, 2),
            tx(SUBJECT, MIXER, 1, 3),
            tx(OTHER, SUBJECT, 50, 1),
            tx(OTHER, SUBJECT, 60, 2),
        ];
        let flags = analyze_risk_flags(&txs, SUBJECT, &analysis(), NOW_MS);
        assert_eq!(flags.len(), 2); // one mixer, one inflow
    }

    #[test]
    fn known_protocols_are_detected_and_sorted() {
        let uniswap = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";
        let aave = "0x7d2768de32b0b80b7a3454c06bdac94a69ddc7a9";
        let txs = vec![
            tx(SUBJECT, uniswap, 1, 2),
            tx(SUBJECT, &aave.to_uppercase(), 1, 3),
            tx(SUBJECT, uniswap, 1, 4),
            tx(SUBJECT, OTHER, 1, 5),
        ];
        let tags = detect_protocol_interactions(&txs, SUBJECT, &analysis());
        assert_eq!(tags, vec!["aave_v2".to_string(), "uniswap_v2".to_string()]);
    }

    #[test]
    fn denylisted_contracts_never_count_as_protocols() {
        let mut analysis = analysis();
        // A denylisted address that is also (mis)listed as a protocol.
        analysis.known_protocols.push(crate::config::ProtocolEntry {
            name: "not_really".to_string(),
            address: MIXER.to_string(),
        });
        let txs = vec![tx(SUBJECT, MIXER, 1, 2)];
        assert!(detect_protocol_interactions(&txs, SUBJECT, &analysis).is_empty());
    }

    #[test]
    fn wallet_age_comes_from_the_earliest_transaction() {
        let txs = vec![
            tx(SUBJECT, OTHER, 1, 24 * 10),
            tx(SUBJECT, OTHER, 1, 24 * 200),
            tx(SUBJECT, OTHER, 1, 24 * 50),
        ];
        assert_eq!(calculate_wallet_age(&txs, NOW_MS), 200);
        assert_eq!(calculate_wallet_age(&[], NOW_MS), 0);
    }

    #[test]
    fn asset_counts_collapse_duplicates_per_list() {
        let tokens = vec![transfer("0xaaa"), transfer("0xAAA"), transfer("0xbbb")];
        let nfts = vec![transfer("0xccc"), transfer("")];
        assert_eq!(count_assets(&tokens, &nfts), (2, 1));
    }

    #[test]
    fn last_activity_is_the_newest_timestamp() {
        let txs = vec![tx(SUBJECT, OTHER, 1, 48), tx(SUBJECT, OTHER, 1, 2)];
        assert_eq!(last_activity(&txs), NOW_MS - 2 * 3_600 * 1_000);
        assert_eq!(last_activity(&[]), 0);
    }
}
