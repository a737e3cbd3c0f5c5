use analytics::Forecaster;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{
    StoreError, TaxConfig, TaxRates, TaxRecord, Transaction, TransactionKind, UserId,
};
use dashboard::{DashboardError, DashboardService, LedgerSource};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tax::{TaxCalculator, TaxStore};
use tokio::sync::Mutex;
use uuid::Uuid;

/// One fake backing both capabilities, the way a real database would.
#[derive(Default)]
struct FakeBackend {
    transactions: Mutex<Vec<Transaction>>,
    records: Mutex<Vec<TaxRecord>>,
    ledger_down: bool,
}

impl FakeBackend {
    async fn book(&self, user_id: UserId, kind: TransactionKind, amount: Decimal, date: NaiveDate, category: &str) {
        self.transactions
            .lock()
            .await
            .push(Transaction::new(user_id, kind, amount, date, category));
    }
}

#[async_trait]
impl LedgerSource for FakeBackend {
    async fn get_transactions(&self, user_id: UserId) -> Result<Vec<Transaction>, StoreError> {
        if self.ledger_down {
            return Err(StoreError::Backend("ledger offline".to_string()));
        }
        Ok(self
            .transactions
            .lock()
            .await
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaxStore for FakeBackend {
    async fn get_tax_config(&self, _: UserId, _: i32) -> Result<Option<TaxConfig>, StoreError> {
        Ok(None)
    }

    async fn save_tax_config(&self, config: TaxConfig) -> Result<TaxConfig, StoreError> {
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

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn service(backend: Arc<FakeBackend>) -> DashboardService {
    let tax = TaxCalculator::new(backend.clone(), TaxRates::default());
    DashboardService::new(backend, tax, Forecaster::default())
}

#[tokio::test]
async fn summary_of_a_growing_year() {
    let backend = Arc::new(FakeBackend::default());
    for month in 1..=12u32 {
        let income = dec!(1000) + Decimal::from(month * 100);
        backend.book(1, TransactionKind::Income, income, date(2024, month, 5), "sales").await;
        backend.book(1, TransactionKind::Expense, dec!(500), date(2024, month, 10), "rent").await;
    }
    // Another user's activity never leaks in.
    backend.book(2, TransactionKind::Expense, dec!(99999), date(2024, 6, 1), "rent").await;

    let summary = service(backend).summary(1, date(2024, 12, 20)).await.unwrap();

    assert_eq!(summary.totals.income_total, dec!(19800));
    assert_eq!(summary.totals.expense_total, dec!(6000));
    assert_eq!(summary.totals.profit_total, dec!(13800));

    let values = summary.time_series.values();
    assert_eq!(values.len(), 12);
    assert_eq!(values[0], dec!(600));
    assert_eq!(values[11], dec!(1700));

    let forecast = summary.forecast.unwrap();
    assert_eq!(forecast.predictions[0].value, dec!(1800));
    assert_eq!(forecast.predictions[2].value, dec!(2000));
    assert_eq!(forecast.confidence, Decimal::ONE);

    assert_eq!(summary.tax_due, Decimal::ZERO);
    assert_eq!(summary.health_score, 92);
    assert_eq!(summary.health.unwrap().profit_trend, dec!(100));
}

#[tokio::test]
async fn empty_ledger_still_has_a_dense_window() {
    let backend = Arc::new(FakeBackend::default());
    let summary = service(backend).summary(9, date(2024, 3, 1)).await.unwrap();

    assert_eq!(summary.time_series.len(), 12);
    assert!(summary.time_series.values().iter().all(Decimal::is_zero));
    assert_eq!(summary.totals.profit_total, Decimal::ZERO);
    // Twelve zero months: flat trend, liquidity measured against a unit average.
    assert_eq!(summary.health_score, 58);
}

#[tokio::test]
async fn short_window_has_no_forecast() {
    let backend = Arc::new(FakeBackend::default());
    backend.book(1, TransactionKind::Income, dec!(10), date(2024, 3, 1), "sales").await;
    let summary = service(backend)
        .with_window(4)
        .summary(1, date(2024, 3, 31))
        .await
        .unwrap();

    assert_eq!(summary.time_series.len(), 4);
    assert!(summary.forecast.is_none());
}

#[tokio::test]
async fn generated_tax_counts_towards_health_until_paid() {
    let backend = Arc::new(FakeBackend::default());
    backend.book(4, TransactionKind::Income, dec!(60000), date(2024, 5, 3), "sales").await;
    backend.book(4, TransactionKind::Income, dec!(40000), date(2024, 5, 28), "services").await;
    backend.book(4, TransactionKind::Expense, dec!(30000), date(2024, 5, 20), "rent").await;
    backend.book(4, TransactionKind::Income, dec!(5000), date(2024, 6, 2), "sales").await;
    let service = service(backend);

    // Only May's income is taxable; expenses do not reduce the base.
    let record = service.generate_tax(4, 2024, 5).await.unwrap();
    assert_eq!(record.taxable_amount, dec!(100000));
    assert_eq!(record.vat_amount, dec!(15000.00));
    assert_eq!(record.payable, dec!(115000.00));
    assert_eq!(record.due_date, date(2024, 6, 15));

    let as_of = date(2024, 6, 30);
    let burdened = service.summary(4, as_of).await.unwrap();
    assert_eq!(burdened.tax_due, dec!(115000.00));

    service.tax().mark_paid(4, record.id).await.unwrap();
    let settled = service.summary(4, as_of).await.unwrap();
    assert_eq!(settled.tax_due, Decimal::ZERO);
    assert!(settled.health_score > burdened.health_score);
}

#[tokio::test]
async fn month_without_income_generates_zero_record() {
    let backend = Arc::new(FakeBackend::default());
    backend.book(5, TransactionKind::Expense, dec!(700), date(2024, 2, 14), "supplies").await;
    let record = service(backend).generate_tax(5, 2024, 2).await.unwrap();
    assert_eq!(record.taxable_amount, Decimal::ZERO);
    assert_eq!(record.payable, dec!(0.00));
}

#[tokio::test]
async fn category_breakdown_uses_income_share() {
    let backend = Arc::new(FakeBackend::default());
    backend.book(3, TransactionKind::Income, dec!(1000), date(2024, 1, 2), "sales").await;
    backend.book(3, TransactionKind::Expense, dec!(250), date(2024, 1, 9), "rent").await;

    let shares = service(backend).category_breakdown(3).await.unwrap();
    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].category, "rent");
    assert_eq!(shares[0].amount, dec!(-250));
    assert_eq!(shares[0].percentage, dec!(-25.00));
    assert_eq!(shares[1].category, "sales");
    assert_eq!(shares[1].percentage, dec!(100.00));
}

#[tokio::test]
async fn ledger_failure_is_surfaced() {
    let backend = Arc::new(FakeBackend {
        ledger_down: true,
        ..Default::default()
    });
    let err = service(backend).summary(1, date(2024, 1, 1)).await.unwrap_err();
    assert!(matches!(err, DashboardError::Ledger(StoreError::Backend(_))));
}
