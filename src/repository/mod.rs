use std::future::Future;

use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{AppUser, Contract, ContractTerms, NewPayment, Payment, PaymentStatus},
};

#[cfg(test)]
pub mod memory;
pub mod pg_store;
pub mod query;
pub mod users;

/// Persistence for payment rows, always scoped to the owning user except
/// for lookups by id (which feed the ownership check).
pub trait PaymentStore {
    fn find_payment(&self, payment_id: i64)
        -> impl Future<Output = AppResult<Option<Payment>>> + Send;

    fn list_payments_due_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = AppResult<Vec<Payment>>> + Send;

    fn list_recurring_payments(
        &self,
        user_id: i64,
    ) -> impl Future<Output = AppResult<Vec<Payment>>> + Send;

    fn list_payments(
        &self,
        user_id: i64,
        status: Option<PaymentStatus>,
        limit: i64,
    ) -> impl Future<Output = AppResult<Vec<Payment>>> + Send;

    fn list_payments_by_source(
        &self,
        user_id: i64,
        source_type: &str,
        source_id: i64,
    ) -> impl Future<Output = AppResult<Vec<Payment>>> + Send;

    fn insert_payment(&self, payment: NewPayment)
        -> impl Future<Output = AppResult<Payment>> + Send;

    /// Persists every mutable column of `payment`, keyed by its id.
    fn save_payment(&self, payment: &Payment) -> impl Future<Output = AppResult<Payment>> + Send;

    fn delete_payment(&self, payment_id: i64) -> impl Future<Output = AppResult<()>> + Send;

    fn delete_payments_by_source(
        &self,
        user_id: i64,
        source_type: &str,
        source_id: i64,
    ) -> impl Future<Output = AppResult<u64>> + Send;
}

pub trait ContractStore {
    fn find_contract(&self, contract_id: i64)
        -> impl Future<Output = AppResult<Option<Contract>>> + Send;

    /// Contracts of a user, oldest first.
    fn list_contracts(&self, user_id: i64) -> impl Future<Output = AppResult<Vec<Contract>>> + Send;

    fn insert_contract(
        &self,
        user_id: i64,
        terms: &ContractTerms,
    ) -> impl Future<Output = AppResult<Contract>> + Send;

    fn update_contract(
        &self,
        contract_id: i64,
        terms: &ContractTerms,
    ) -> impl Future<Output = AppResult<Contract>> + Send;

    fn delete_contract(&self, contract_id: i64) -> impl Future<Output = AppResult<()>> + Send;
}

pub trait UserDirectory {
    fn find_user(&self, user_id: i64) -> impl Future<Output = AppResult<Option<AppUser>>> + Send;
}
