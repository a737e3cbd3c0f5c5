use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use core_types::{StoreError, TaxConfig, TaxRates, TaxRecord, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use tax::{TaxCalculator, TaxError, TaxStore};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct FakeTaxStore {
    configs: Mutex<HashMap<(UserId, i32), TaxConfig>>,
    records: Mutex<Vec<TaxRecord>>,
    fail_config_lookup: bool,
}

#[async_trait]
impl TaxStore for FakeTaxStore {
    async fn get_tax_config(
        &self,
        user_id: UserId,
        year: i32,
    ) -> Result<Option<TaxConfig>, StoreError> {
        if self.fail_config_lookup {
            return Err(StoreError::Backend("config table unavailable".to_string()));
        }
        Ok(self.configs.lock().await.get(&(user_id, year)).cloned())
    }

    async fn save_tax_config(&self, config: TaxConfig) -> Result<TaxConfig, StoreError> {
        self.configs
            .lock()
            .await
            .insert((config.user_id, config.year), config.clone());
        Ok(config)
    }

    async fn persist_tax_record(&self, record: TaxRecord) -> Result<TaxRecord, StoreError> {
        self.records.lock().await.push(record.clone());
        Ok(record)
    }

    async fn find_tax_record(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Option<TaxRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|r| r.user_id == user_id && r.year == year && r.month == month)
            .cloned())
    }

    async fn list_unpaid(&self, user_id: UserId) -> Result<Vec<TaxRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|r| r.user_id == user_id && !r.paid)
            .cloned()
            .collect())
    }

    async fn mark_paid(&self, user_id: UserId, record_id: Uuid) -> Result<TaxRecord, StoreError> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id && r.user_id == user_id)
            .ok_or(StoreError::NotFound)?;
        record.paid = true;
        Ok(record.clone())
    }
}

fn calculator(store: Arc<FakeTaxStore>) -> TaxCalculator {
    TaxCalculator::new(store, TaxRates::default())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn default_rates_produce_expected_record() {
    let store = Arc::new(FakeTaxStore::default());
    let record = calculator(store.clone())
        .compute_tax(1, 2024, 5, dec!(100000))
        .await
        .unwrap();

    assert_eq!(record.vat_amount, dec!(15000.00));
    assert_eq!(record.tax_amount, dec!(0.00));
    assert_eq!(record.payable, dec!(115000.00));
    assert_eq!(record.due_date, date(2024, 6, 15));
    assert!(!record.paid);
    assert_eq!(store.records.lock().await.len(), 1);
}

#[tokio::test]
async fn december_is_due_in_january() {
    let store = Arc::new(FakeTaxStore::default());
    let record = calculator(store)
        .compute_tax(1, 2024, 12, dec!(500))
        .await
        .unwrap();
    assert_eq!(record.due_date, date(2025, 1, 15));
}

#[tokio::test]
async fn user_override_wins_over_defaults() {
    let store = Arc::new(FakeTaxStore::default());
    let calc = calculator(store.clone());
    calc.set_config(TaxConfig {
        user_id: 3,
        year: 2024,
        vat_rate: dec!(0.05),
        tax_rate: dec!(0.10),
        thresholds: HashMap::new(),
    })
    .await
    .unwrap();

    let with_override = calc.compute_tax(3, 2024, 2, dec!(1000)).await.unwrap();
    assert_eq!(with_override.vat_amount, dec!(50.00));
    assert_eq!(with_override.tax_amount, dec!(100.00));
    assert_eq!(with_override.payable, dec!(1150.00));

    // A different year of the same user is untouched by the override.
    let other_year = calc.compute_tax(3, 2025, 2, dec!(1000)).await.unwrap();
    assert_eq!(other_year.vat_amount, dec!(150.00));
}

#[tokio::test]
async fn failing_config_lookup_falls_back_to_defaults() {
    let store = Arc::new(FakeTaxStore {
        fail_config_lookup: true,
        ..Default::default()
    });
    let record = calculator(store)
        .compute_tax(1, 2024, 5, dec!(200))
        .await
        .unwrap();
    assert_eq!(record.vat_amount, dec!(30.00));
}

#[tokio::test]
async fn generation_is_not_idempotent() {
    let store = Arc::new(FakeTaxStore::default());
    let calc = calculator(store.clone());
    let first = calc.compute_tax(1, 2024, 5, dec!(10)).await.unwrap();
    let second = calc.compute_tax(1, 2024, 5, dec!(10)).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(store.records.lock().await.len(), 2);
    assert_eq!(calc.outstanding(1).await.unwrap(), dec!(23.00));
}

#[tokio::test]
async fn negative_override_is_rejected() {
    let store = Arc::new(FakeTaxStore::default());
    let result = calculator(store)
        .set_config(TaxConfig {
            user_id: 1,
            year: 2024,
            vat_rate: dec!(-0.1),
            tax_rate: Decimal::ZERO,
            thresholds: HashMap::new(),
        })
        .await;
    assert!(matches!(result, Err(TaxError::InvalidRate(_))));
}

#[tokio::test]
async fn due_within_filters_and_orders() {
    let store = Arc::new(FakeTaxStore::default());
    let calc = calculator(store.clone());
    let today = Utc::now().date_naive();

    // One long overdue period and one far in the future.
    let past = calc.compute_tax(1, 2020, 1, dec!(100)).await.unwrap();
    let far = calc.compute_tax(1, 2999, 1, dec!(100)).await.unwrap();
    let _other_user = calc.compute_tax(2, 2020, 1, dec!(100)).await.unwrap();

    let due = calc.due_within(1, 30, today).await.unwrap();
    let ids: Vec<_> = due.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![past.id]);

    let everything = calc.due_within(1, 365 * 1000, today).await.unwrap();
    assert_eq!(everything.len(), 2);
    assert_eq!(everything[1].id, far.id);
    assert!(everything[0].due_date <= today.checked_add_days(Days::new(30)).unwrap());
}

#[tokio::test]
async fn mark_paid_is_scoped_to_owner() {
    let store = Arc::new(FakeTaxStore::default());
    let calc = calculator(store.clone());
    let record = calc.compute_tax(1, 2024, 5, dec!(100)).await.unwrap();

    let foreign = calc.mark_paid(2, record.id).await;
    assert!(matches!(foreign, Err(TaxError::UnknownRecord(id)) if id == record.id));

    let paid = calc.mark_paid(1, record.id).await.unwrap();
    assert!(paid.paid);
    assert_eq!(calc.outstanding(1).await.unwrap(), Decimal::ZERO);
    assert!(calc.due_within(1, 365 * 1000, Utc::now().date_naive()).await.unwrap().is_empty());
}

#[tokio::test]
async fn record_lookup_reports_missing_period() {
    let store = Arc::new(FakeTaxStore::default());
    let calc = calculator(store);
    calc.compute_tax(1, 2024, 5, dec!(100)).await.unwrap();

    assert_eq!(calc.record_for(1, 2024, 5).await.unwrap().month, 5);
    assert!(matches!(
        calc.record_for(1, 2024, 6).await,
        Err(TaxError::RecordNotFound { month: 6, .. })
    ));
}
