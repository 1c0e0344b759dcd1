use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tx::TransactionDraft;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxReceipt {
    pub digest: String,
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Execution failed: {0}")]
    Execution(String),
}

/// External wallet capability: holds the connected address and signs/executes
/// built drafts. Wallet cryptography lives entirely behind this boundary.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn current_address(&self) -> Option<String>;

    async fn sign_and_execute(&self, draft: &TransactionDraft) -> Result<TxReceipt, WalletError>;
}
