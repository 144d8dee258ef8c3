pub mod scan;

use std::future::Future;

pub use scan::{ScanClient, TransferRecord, TxRecord};

use crate::error::AppResult;

/// Seam over the four account-history fetches so the orchestrator can be
/// exercised against counting or failing doubles. Implementations return
/// `Ok(vec![])` for an address with genuinely no records; an `Err` always
/// means the data could not be fetched.
pub trait LedgerDataSource: Send + Sync {
    fn transactions(&self, address: &str)
        -> impl Future<Output = AppResult<Vec<TxRecord>>> + Send;

    fn internal_transactions(&self, address: &str)
        -> impl Future<Output = AppResult<Vec<TxRecord>>> + Send;

    fn token_transfers(&self, address: &str)
        -> impl Future<Output = AppResult<Vec<TransferRecord>>> + Send;

    fn nft_transfers(&self, address: &str)
        -> impl Future<Output = AppResult<Vec<TransferRecord>>> + Send;
}

impl LedgerDataSource for ScanClient {
    async fn transactions(&self, address: &str) -> AppResult<Vec<TxRecord>> {
        self.get_transactions(address, None).await
    }

    async fn internal_transactions(&self, address: &str) -> AppResult<Vec<TxRecord>> {
        self.get_internal_transactions(address, None).await
    }

    async fn token_transfers(&self, address: &str) -> AppResult<Vec<TransferRecord>> {
        self.get_token_transfers(address, None).await
    }

    async fn nft_transfers(&self, address: &str) -> AppResult<Vec<TransferRecord>> {
        self.get_nft_transfers(address, None).await
    }
}
