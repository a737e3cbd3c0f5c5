use async_trait::async_trait;
use core_types::{StoreError, TaxConfig, TaxRecord, UserId};
use uuid::Uuid;

/// Storage capability for tax configuration and tax records.
///
/// Implemented by whatever persistence the hosting application uses; the
/// calculator only ever talks to it through this trait.
#[async_trait]
pub trait TaxStore: Send + Sync {
    /// The rate override for `(user_id, year)`, if an administrator set one.
    async fn get_tax_config(
        &self,
        user_id: UserId,
        year: i32,
    ) -> Result<Option<TaxConfig>, StoreError>;

    /// Creates or replaces the override for the config's `(user_id, year)`.
    async fn save_tax_config(&self, config: TaxConfig) -> Result<TaxConfig, StoreError>;

    /// Stores a newly generated record and returns it as persisted.
    async fn persist_tax_record(&self, record: TaxRecord) -> Result<TaxRecord, StoreError>;

    /// The first record generated for `(user_id, year, month)`.
    async fn find_tax_record(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Option<TaxRecord>, StoreError>;

    async fn list_unpaid(&self, user_id: UserId) -> Result<Vec<TaxRecord>, StoreError>;

    /// Flags a record as paid. Fails with [`StoreError::NotFound`] when the record
    /// does not exist or belongs to another user.
    async fn mark_paid(&self, user_id: UserId, record_id: Uuid) -> Result<TaxRecord, StoreError>;
}
