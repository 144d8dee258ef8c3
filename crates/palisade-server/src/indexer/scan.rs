use std::str::FromStr;
use std::time::{Duration, Instant};

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::ScanConfig;
use crate::error::{AppError, AppResult};

// ============================================================================
// Scan Client - Etherscan-compatible account history API
// ============================================================================

#[derive(Clone)]
pub struct ScanClient {
    client: Client,
    base_url: String,
    api_key: String,
    page_size: u32,
    max_retries: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl ScanClient {
    pub fn new(config: &ScanConfig) -> AppResult<Self> {
        tracing::debug!(base_url = %config.base_url, "Creating scan client");

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            page_size: config.page_size,
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
        })
    }

    /// Ordinary transactions for an address, newest first. `window`
    /// overrides the configured record count for this call.
    pub async fn get_transactions(
        &self,
        address: &str,
        window: Option<u32>,
    ) -> AppResult<Vec<TxRecord>> {
        self.fetch_list(address, "txlist", window).await
    }

    /// Internal (contract-triggered) transactions for an address.
    pub async fn get_internal_transactions(
        &self,
        address: &str,
        window: Option<u32>,
    ) -> AppResult<Vec<TxRecord>> {
        self.fetch_list(address, "txlistinternal", window).await
    }

    /// ERC-20 token transfer events touching an address.
    pub async fn get_token_transfers(
        &self,
        address: &str,
        window: Option<u32>,
    ) -> AppResult<Vec<TransferRecord>> {
        self.fetch_list(address, "tokentx", window).await
    }

    /// ERC-721 transfer events touching an address.
    pub async fn get_nft_transfers(
        &self,
        address: &str,
        window: Option<u32>,
    ) -> AppResult<Vec<TransferRecord>> {
        self.fetch_list(address, "tokennfttx", window).await
    }

    /// One account-module list with retry. A response that unambiguously
    /// says "no records" is a successful empty list; everything else that
    /// is not a parsed record list counts as a retryable failure, and the
    /// retry budget exhausting turns into `DataUnavailable`.
    async fn fetch_list<T: serde::de::DeserializeOwned>(
        &self,
        address: &str,
        action: &str,
        window: Option<u32>,
    ) -> AppResult<Vec<T>> {
        let start = Instant::now();
        let window = window.unwrap_or(self.page_size);
        let mut attempt: u32 = 0;

        loop {
            match self.fetch_once::<T>(address, action, window).await {
                Ok(records) => {
                    tracing::debug!(
                        wallet = %address,
                        action = %action,
                        count = %records.len(),
                        attempts = %(attempt + 1),
                        duration_ms = %start.elapsed().as_millis(),
                        "Fetched account records"
                    );
                    return Ok(records);
                }
                Err(reason) if attempt < self.max_retries => {
                    let delay = backoff_delay(self.backoff_base, self.backoff_max, attempt);
                    tracing::warn!(
                        wallet = %address,
                        action = %action,
                        attempt = %(attempt + 1),
                        delay_ms = %delay.as_millis(),
                        error = %reason,
                        "Scan request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(reason) => {
                    tracing::error!(
                        wallet = %address,
                        action = %action,
                        attempts = %(attempt + 1),
                        error = %reason,
                        "Scan request failed, retries exhausted"
                    );
                    return Err(AppError::DataUnavailable(format!(
                        "{} fetch failed after {} attempts: {}",
                        action,
                        attempt + 1,
                        reason
                    )));
                }
            }
        }
    }

    async fn fetch_once<T: serde::de::DeserializeOwned>(
        &self,
        address: &str,
        action: &str,
        window: u32,
    ) -> Result<Vec<T>, String> {
        let offset = window.to_string();
        let query = [
            ("module", "account"),
            ("action", action),
            ("address", address),
            ("page", "1"),
            ("offset", offset.as_str()),
            ("sort", "desc"),
            ("apikey", self.api_key.as_str()),
        ];

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP status {}", response.status()));
        }

        let envelope: ScanEnvelope = response
            .json()
            .await
            .map_err(|e| format!("malformed response body: {}", e))?;

        parse_envelope(envelope)
    }
}

/// Exponential backoff: base doubling per attempt, bounded by the maximum.
fn backoff_delay(base: Duration, max: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.min(16))).min(max)
}

// ============================================================================
// Scan API Types - status/message/result envelope
// ============================================================================

/// Every account-module response carries this envelope. `status` is "1" on
/// success with records; "0" covers both the benign "no records" case and
/// real failures (rate limits, NOTOK), told apart by the message.
#[derive(Debug, Deserialize)]
pub struct ScanEnvelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

/// Split the envelope into the three outcomes: records, empty-but-valid,
/// or a retryable failure. Callers never have to parse error strings.
fn parse_envelope<T: serde::de::DeserializeOwned>(envelope: ScanEnvelope) -> Result<Vec<T>, String> {
    if envelope.status == "1" {
        return serde_json::from_value(envelope.result)
            .map_err(|e| format!("malformed record list: {}", e));
    }

    if is_empty_result(&envelope.message) {
        return Ok(Vec::new());
    }

    let detail = envelope
        .result
        .as_str()
        .unwrap_or_default()
        .to_string();
    if detail.is_empty() {
        Err(format!("API error: {}", envelope.message))
    } else {
        Err(format!("API error: {} ({})", envelope.message, detail))
    }
}

fn is_empty_result(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("no transactions found") || message.contains("no records found")
}

/// One row of `txlist` / `txlistinternal`. The API returns every field as a
/// string; values are parsed lazily where the analyzer needs them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub time_stamp: String,
    #[serde(default)]
    pub is_error: String,
}

impl TxRecord {
    /// Block timestamp in epoch millis; 0 when the field is unparseable.
    pub fn timestamp_ms(&self) -> i64 {
        self.time_stamp.parse::<i64>().unwrap_or(0) * 1_000
    }

    /// Transfer value in wei; zero when the field is unparseable.
    pub fn value_wei(&self) -> Decimal {
        Decimal::from_str(&self.value).unwrap_or_default()
    }
}

/// One row of `tokentx` / `tokennfttx`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub contract_address: String,
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default)]
    pub time_stamp: String,
}
