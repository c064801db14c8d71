use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;

use crate::{
    error::{map_db_error, AppError, AppResult},
    models::{AppUser, Contract, ContractTerms, NewPayment, Payment, PaymentStatus},
    repository::{
        query::{PaymentFilter, PaymentOrder, PAYMENT_COLUMNS},
        users, ContractStore, PaymentStore, UserDirectory,
    },
};

const CONTRACT_COLUMNS: &str = "id, user_id, contract_type, address, jeonse_deposit, monthly_rent, \
     maintenance_fee, monthly_payment_day, start_date, end_date, created_at";

/// Postgres-backed store. One instance wraps one transaction, so a request
/// handler that commits at the end is all-or-nothing.
pub struct PgStore {
    tx: Mutex<Transaction<'static, Postgres>>,
}

impl PgStore {
    pub async fn begin(pool: &PgPool) -> AppResult<Self> {
        let tx = pool.begin().await.map_err(map_db_error)?;
        Ok(Self { tx: Mutex::new(tx) })
    }

    pub async fn commit(self) -> AppResult<()> {
        self.tx.into_inner().commit().await.map_err(map_db_error)
    }

    async fn fetch_payments(
        &self,
        filter: PaymentFilter,
        order: PaymentOrder,
        limit: Option<i64>,
    ) -> AppResult<Vec<Payment>> {
        let mut query = filter.select(order, limit);
        let mut tx = self.tx.lock().await;
        let rows = query
            .build_query_as::<PaymentRow>()
            .fetch_all(&mut **tx)
            .await
            .map_err(map_db_error)?;
        rows.into_iter().map(Payment::try_from).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    user_id: i64,
    name: String,
    category: String,
    amount: Decimal,
    payment_day: Option<i32>,
    is_recurring: bool,
    auto_pay: bool,
    due_date: Option<NaiveDate>,
    status: Option<String>,
    paid_date: Option<NaiveDate>,
    source_type: Option<String>,
    source_id: Option<i64>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = AppError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let category = row.category.parse().map_err(|_| {
            AppError::Internal(format!(
                "Payment {} has an unknown category '{}'.",
                row.id, row.category
            ))
        })?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            category,
            amount: row.amount,
            payment_day: row.payment_day,
            is_recurring: row.is_recurring,
            auto_pay: row.auto_pay,
            due_date: row.due_date,
            status: PaymentStatus::parse_or_upcoming(row.status.as_deref()),
            paid_date: row.paid_date,
            source_type: row.source_type,
            source_id: row.source_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ContractRow {
    id: i64,
    user_id: i64,
    contract_type: String,
    address: String,
    jeonse_deposit: Option<Decimal>,
    monthly_rent: Option<Decimal>,
    maintenance_fee: Option<Decimal>,
    monthly_payment_day: Option<i32>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    created_at: Option<DateTime<Utc>>,
}

impl From<ContractRow> for Contract {
    fn from(row: ContractRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            contract_type: row.contract_type,
            address: row.address,
            jeonse_deposit: row.jeonse_deposit,
            monthly_rent: row.monthly_rent,
            maintenance_fee: row.maintenance_fee,
            monthly_payment_day: row.monthly_payment_day,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        }
    }
}

impl PaymentStore for PgStore {
    async fn find_payment(&self, payment_id: i64) -> AppResult<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 LIMIT 1");
        let mut tx = self.tx.lock().await;
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(payment_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_db_error)?;
        row.map(Payment::try_from).transpose()
    }

    async fn list_payments_due_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<Payment>> {
        let filter = PaymentFilter::for_user(user_id).due_between(start, end);
        self.fetch_payments(filter, PaymentOrder::IdAsc, None).await
    }

    async fn list_recurring_payments(&self, user_id: i64) -> AppResult<Vec<Payment>> {
        let filter = PaymentFilter::for_user(user_id).recurring(true);
        self.fetch_payments(filter, PaymentOrder::IdAsc, None).await
    }

    async fn list_payments(
        &self,
        user_id: i64,
        status: Option<PaymentStatus>,
        limit: i64,
    ) -> AppResult<Vec<Payment>> {
        let filter = PaymentFilter::for_user(user_id).with_status(status);
        self.fetch_payments(filter, PaymentOrder::NewestFirst, Some(limit))
            .await
    }

    async fn list_payments_by_source(
        &self,
        user_id: i64,
        source_type: &str,
        source_id: i64,
    ) -> AppResult<Vec<Payment>> {
        let filter = PaymentFilter::for_user(user_id).from_source(source_type, source_id);
        self.fetch_payments(filter, PaymentOrder::IdAsc, None).await
    }

    async fn insert_payment(&self, payment: NewPayment) -> AppResult<Payment> {
        let sql = format!(
            "INSERT INTO payments (user_id, name, category, amount, payment_day, is_recurring, \
             auto_pay, due_date, status, paid_date, source_type, source_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {PAYMENT_COLUMNS}"
        );
        let mut tx = self.tx.lock().await;
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(payment.user_id)
            .bind(&payment.name)
            .bind(payment.category.as_str())
            .bind(payment.amount)
            .bind(payment.payment_day)
            .bind(payment.is_recurring)
            .bind(payment.auto_pay)
            .bind(payment.due_date)
            .bind(payment.status.as_str())
            .bind(payment.paid_date)
            .bind(&payment.source_type)
            .bind(payment.source_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(map_db_error)?;
        Payment::try_from(row)
    }

    async fn save_payment(&self, payment: &Payment) -> AppResult<Payment> {
        let sql = format!(
            "UPDATE payments SET name = $2, category = $3, amount = $4, payment_day = $5, \
             is_recurring = $6, auto_pay = $7, due_date = $8, status = $9, paid_date = $10, \
             source_type = $11, source_id = $12 \
             WHERE id = $1 RETURNING {PAYMENT_COLUMNS}"
        );
        let mut tx = self.tx.lock().await;
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(payment.id)
            .bind(&payment.name)
            .bind(payment.category.as_str())
            .bind(payment.amount)
            .bind(payment.payment_day)
            .bind(payment.is_recurring)
            .bind(payment.auto_pay)
            .bind(payment.due_date)
            .bind(payment.status.as_str())
            .bind(payment.paid_date)
            .bind(&payment.source_type)
            .bind(payment.source_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_db_error)?;
        row.map(Payment::try_from)
            .transpose()?
            .ok_or_else(|| AppError::NotFound("Payment not found.".to_string()))
    }

    async fn delete_payment(&self, payment_id: i64) -> AppResult<()> {
        let mut tx = self.tx.lock().await;
        sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(payment_id)
            .execute(&mut **tx)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn delete_payments_by_source(
        &self,
        user_id: i64,
        source_type: &str,
        source_id: i64,
    ) -> AppResult<u64> {
        let mut query = PaymentFilter::for_user(user_id)
            .from_source(source_type, source_id)
            .delete();
        let mut tx = self.tx.lock().await;
        let result = query
            .build()
            .execute(&mut **tx)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected())
    }
}

impl ContractStore for PgStore {
    async fn find_contract(&self, contract_id: i64) -> AppResult<Option<Contract>> {
        let sql = format!("SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = $1 LIMIT 1");
        let mut tx = self.tx.lock().await;
        let row = sqlx::query_as::<_, ContractRow>(&sql)
            .bind(contract_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_db_error)?;
        Ok(row.map(Contract::from))
    }

    async fn list_contracts(&self, user_id: i64) -> AppResult<Vec<Contract>> {
        let sql =
            format!("SELECT {CONTRACT_COLUMNS} FROM contracts WHERE user_id = $1 ORDER BY id ASC");
        let mut tx = self.tx.lock().await;
        let rows = sqlx::query_as::<_, ContractRow>(&sql)
            .bind(user_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(map_db_error)?;
        Ok(rows.into_iter().map(Contract::from).collect())
    }

    async fn insert_contract(&self, user_id: i64, terms: &ContractTerms) -> AppResult<Contract> {
        let sql = format!(
            "INSERT INTO contracts (user_id, contract_type, address, jeonse_deposit, monthly_rent, \
             maintenance_fee, monthly_payment_day, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {CONTRACT_COLUMNS}"
        );
        let mut tx = self.tx.lock().await;
        let row = sqlx::query_as::<_, ContractRow>(&sql)
            .bind(user_id)
            .bind(&terms.contract_type)
            .bind(&terms.address)
            .bind(terms.jeonse_deposit)
            .bind(terms.monthly_rent)
            .bind(terms.maintenance_fee)
            .bind(terms.monthly_payment_day)
            .bind(terms.start_date)
            .bind(terms.end_date)
            .fetch_one(&mut **tx)
            .await
            .map_err(map_db_error)?;
        Ok(Contract::from(row))
    }

    async fn update_contract(
        &self,
        contract_id: i64,
        terms: &ContractTerms,
    ) -> AppResult<Contract> {
        let sql = format!(
            "UPDATE contracts SET contract_type = $2, address = $3, jeonse_deposit = $4, \
             monthly_rent = $5, maintenance_fee = $6, monthly_payment_day = $7, start_date = $8, \
             end_date = $9 WHERE id = $1 RETURNING {CONTRACT_COLUMNS}"
        );
        let mut tx = self.tx.lock().await;
        let row = sqlx::query_as::<_, ContractRow>(&sql)
            .bind(contract_id)
            .bind(&terms.contract_type)
            .bind(&terms.address)
            .bind(terms.jeonse_deposit)
            .bind(terms.monthly_rent)
            .bind(terms.maintenance_fee)
            .bind(terms.monthly_payment_day)
            .bind(terms.start_date)
            .bind(terms.end_date)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_db_error)?;
        row.map(Contract::from)
            .ok_or_else(|| AppError::NotFound("Contract not found.".to_string()))
    }

    async fn delete_contract(&self, contract_id: i64) -> AppResult<()> {
        let mut tx = self.tx.lock().await;
        sqlx::query("DELETE FROM contracts WHERE id = $1")
            .bind(contract_id)
            .execute(&mut **tx)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }
}

impl UserDirectory for PgStore {
    async fn find_user(&self, user_id: i64) -> AppResult<Option<AppUser>> {
        let mut tx = self.tx.lock().await;
        users::find_user_by_id(&mut **tx, user_id).await
    }
}
