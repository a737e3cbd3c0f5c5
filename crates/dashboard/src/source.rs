use async_trait::async_trait;
use core_types::{StoreError, Transaction, UserId};

/// Read access to a user's ledger.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Every transaction owned by `user_id`, in no particular order.
    async fn get_transactions(&self, user_id: UserId) -> Result<Vec<Transaction>, StoreError>;
}
