//! Reputation service - the orchestrator
//!
//! Composes cache, ledger client, analyzer and scoring engine into the two
//! operations callers see: single-address evaluation and bounded-concurrency
//! batch evaluation. Every failure past input validation degrades to a
//! deterministic fallback result tagged with its provenance; the only error
//! a caller of `get_reputation` can observe is an invalid address.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use palisade_core::{
    calculate_score, fallback_score, trust_level, validate_address, verification_mode, DataSource,
    ReputationResult, RiskFlag, WalletData,
};

use crate::cache::{CacheKey, ReputationCache};
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::indexer::LedgerDataSource;
use crate::metrics::activity;

/// Per-request evaluation options.
#[derive(Debug, Clone)]
pub struct ReputationOptions {
    /// Evaluate from live ledger data. When false the deterministic
    /// fallback path is used directly (and cached under the fallback key).
    pub live: bool,
    /// Skip the cache read and recompute; the result is still written back.
    pub refresh: bool,
    /// Override the configured cache TTL for this result.
    pub ttl_override: Option<Duration>,
}

impl Default for ReputationOptions {
    fn default() -> Self {
        Self {
            live: true,
            refresh: false,
            ttl_override: None,
        }
    }
}

#[derive(Clone)]
pub struct ReputationService<C> {
    client: C,
    cache: Arc<ReputationCache>,
    config: Arc<AppConfig>,
}

impl<C: LedgerDataSource> ReputationService<C> {
    pub fn new(client: C, cache: Arc<ReputationCache>, config: Arc<AppConfig>) -> Self {
        Self {
            client,
            cache,
            config,
        }
    }

    /// Evaluate one address: cache lookup, then the live pipeline, with the
    /// fallback scorer substituted on any terminal live failure. Results
    /// carry their classification as computed at write time; a cache hit is
    /// returned exactly as stored.
    pub async fn get_reputation(
        &self,
        address: &str,
        opts: &ReputationOptions,
    ) -> AppResult<ReputationResult> {
        validate_address(address)?;

        let source_mode = if opts.live {
            DataSource::Live
        } else {
            DataSource::Fallback
        };
        let key = CacheKey::new(address, source_mode);

        if !opts.refresh {
            if let Some(cached) = self.cache.get(&key).await {
                tracing::debug!(wallet = %address, source = %source_mode, "Reputation served from cache");
                return Ok(cached);
            }
        }

        let result = if opts.live {
            match self.evaluate_live(address).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(
                        wallet = %address,
                        error = %e,
                        "Live evaluation unavailable, using fallback score"
                    );
                    self.evaluate_fallback(address)
                }
            }
        } else {
            self.evaluate_fallback(address)
        };

        self.cache.put(key, result.clone(), opts.ttl_override).await;
        Ok(result)
    }

    /// Evaluate a list of addresses in bounded-concurrency groups. Each
    /// group is joined fully before the next begins; the token cancels
    /// between groups. Every distinct input address gets exactly one entry,
    /// failed members included (they receive the fallback result).
    pub async fn batch_get_reputation(
        &self,
        addresses: &[String],
        opts: &ReputationOptions,
        cancel: &CancellationToken,
    ) -> HashMap<String, ReputationResult> {
        let mut seen = HashSet::new();
        let distinct: Vec<&String> = addresses.iter().filter(|a| seen.insert(a.as_str())).collect();

        let group_size = self.config.batch.group_size;
        let mut results = HashMap::with_capacity(distinct.len());

        tracing::info!(
            requested = %addresses.len(),
            distinct = %distinct.len(),
            group_size = %group_size,
            "Starting batch reputation evaluation"
        );

        for group in distinct.chunks(group_size) {
            if cancel.is_cancelled() {
                tracing::info!(
                    completed = %results.len(),
                    remaining = %(distinct.len() - results.len()),
                    "Batch cancelled between groups"
                );
                break;
            }

            let evaluations = join_all(group.iter().map(|address| async move {
                let outcome = self.get_reputation(address.as_str(), opts).await;
                (address.to_string(), outcome)
            }))
            .await;

            for (address, outcome) in evaluations {
                let result = match outcome {
                    Ok(result) => result,
                    Err(e) => {
                        // One bad member never poisons the batch; it gets
                        // the deterministic fallback instead of an error.
                        tracing::warn!(
                            wallet = %address,
                            error = %e,
                            "Batch member failed, substituting fallback result"
                        );
                        self.evaluate_fallback(&address)
                    }
                };
                results.insert(address, result);
            }
        }

        results
    }

    /// Drop all cached results; returns the number of entries removed.
    pub async fn clear_cache(&self) -> usize {
        self.cache.clear().await
    }

    /// Cached entry count, stale entries included until swept.
    pub async fn cache_entries(&self) -> usize {
        self.cache.len().await
    }

    async fn evaluate_live(&self, address: &str) -> AppResult<ReputationResult> {
        // All four lists go out together. Only the primary transaction list
        // is load-bearing; the enrichment lists degrade to empty on failure.
        let (transactions, internal, tokens, nfts) = tokio::join!(
            self.client.transactions(address),
            self.client.internal_transactions(address),
            self.client.token_transfers(address),
            self.client.nft_transfers(address),
        );

        let transactions = transactions?;
        let internal = degrade(internal, address, "internal transactions");
        let tokens = degrade(tokens, address, "token transfers");
        let nfts = degrade(nfts, address, "nft transfers");

        let now_ms = Utc::now().timestamp_millis();
        let analysis = &self.config.analysis;

        let mut risk_flags = activity::analyze_risk_flags(&transactions, address, analysis, now_ms);
        if transactions.is_empty() {
            // Absence of history is a property of the whole fetch, so the
            // flag is raised here rather than in the analyzer.
            risk_flags.push(RiskFlag::no_activity());
        }

        let (token_count, nft_count) = activity::count_assets(&tokens, &nfts);
        let data = WalletData {
            address: address.to_string(),
            transaction_count: transactions.len() as u32,
            contract_interactions: internal.len() as u32,
            known_protocols: activity::detect_protocol_interactions(&transactions, address, analysis),
            wallet_age_days: activity::calculate_wallet_age(&transactions, now_ms),
            token_count,
            nft_count,
            risk_flags,
            last_activity: activity::last_activity(&transactions),
        };

        Ok(self.classify(data, DataSource::Live))
    }

    /// Deterministic result for an address when live data is unavailable or
    /// not requested: synthesized zero-activity snapshot, score straight
    /// from the fallback hash.
    fn evaluate_fallback(&self, address: &str) -> ReputationResult {
        let score = fallback_score(address);
        let mut data = WalletData::empty(address);
        data.risk_flags.push(RiskFlag::no_activity());

        ReputationResult {
            score,
            trust_level: trust_level(score),
            verification_mode: verification_mode(score, &self.config.reputation),
            wallet_data: data,
            data_source: DataSource::Fallback,
            computed_at: Utc::now(),
        }
    }

    fn classify(&self, data: WalletData, source: DataSource) -> ReputationResult {
        let score = calculate_score(&data, &self.config.reputation.weights);
        ReputationResult {
            score,
            trust_level: trust_level(score),
            verification_mode: verification_mode(score, &self.config.reputation),
            wallet_data: data,
            data_source: source,
            computed_at: Utc::now(),
        }
    }
}

fn degrade<T>(outcome: AppResult<Vec<T>>, address: &str, what: &str) -> Vec<T> {
    match outcome {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(
                wallet = %address,
                list = %what,
                error = %e,
                "Enrichment fetch failed, substituting empty list"
            );
            Vec::new()
        }
    }
}
