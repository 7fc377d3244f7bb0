//! Capabilities this crate consumes but does not implement: the wallet, the
//! ledger node and the indexer.

use async_trait::async_trait;

use crate::{
    error::{BoxError, ConfirmationError},
    models::{ApplicationInfo, Confirmation, PendingInfo, TransactionPage, TransactionQuery},
    transaction::SuggestedParams,
};

#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, txn: Vec<u8>) -> Result<Vec<u8>, BoxError>;

    /// Signs every leg of a group. The output order matches the input order.
    async fn sign_group(&self, txns: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, BoxError>;
}

#[async_trait]
pub trait Algod: Send + Sync {
    async fn suggested_params(&self) -> Result<SuggestedParams, BoxError>;

    async fn compile(&self, source: &str) -> Result<Vec<u8>, BoxError>;

    /// Submits one signed transaction, or every leg of a group in order.
    /// Returns the id of the first transaction.
    async fn submit(&self, signed: &[Vec<u8>]) -> Result<String, BoxError>;

    async fn await_confirmation(
        &self,
        tx_id: &str,
        max_rounds: u64,
    ) -> Result<Confirmation, ConfirmationError>;

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingInfo, BoxError>;
}

#[async_trait]
pub trait Indexer: Send + Sync {
    async fn search_transactions(&self, query: &TransactionQuery) -> Result<TransactionPage, BoxError>;

    async fn lookup_application(&self, app_id: u64) -> Result<ApplicationInfo, BoxError>;
}

#[async_trait]
impl<T: Signer + ?Sized> Signer for std::sync::Arc<T> {
    async fn sign(&self, txn: Vec<u8>) -> Result<Vec<u8>, BoxError> {
        (**self).sign(txn).await
    }

    async fn sign_group(&self, txns: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, BoxError> {
        (**self).sign_group(txns).await
    }
}

#[async_trait]
impl<T: Algod + ?Sized> Algod for std::sync::Arc<T> {
    async fn suggested_params(&self) -> Result<SuggestedParams, BoxError> {
        (**self).suggested_params().await
    }

    async fn compile(&self, source: &str) -> Result<Vec<u8>, BoxError> {
        (**self).compile(source).await
    }

    async fn submit(&self, signed: &[Vec<u8>]) -> Result<String, BoxError> {
        (**self).submit(signed).await
    }

    async fn await_confirmation(
        &self,
        tx_id: &str,
        max_rounds: u64,
    ) -> Result<Confirmation, ConfirmationError> {
        (**self).await_confirmation(tx_id, max_rounds).await
    }

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingInfo, BoxError> {
        (**self).pending_transaction(tx_id).await
    }
}

#[async_trait]
impl<T: Indexer + ?Sized> Indexer for std::sync::Arc<T> {
    async fn search_transactions(&self, query: &TransactionQuery) -> Result<TransactionPage, BoxError> {
        (**self).search_transactions(query).await
    }

    async fn lookup_application(&self, app_id: u64) -> Result<ApplicationInfo, BoxError> {
        (**self).lookup_application(app_id).await
    }
}
