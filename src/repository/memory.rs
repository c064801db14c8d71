//! In-memory store used by the service tests.

use std::sync::Mutex;

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::{AppUser, Contract, ContractTerms, NewPayment, Payment, PaymentStatus},
    repository::{ContractStore, PaymentStore, UserDirectory},
};

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    payments: Vec<Payment>,
    contracts: Vec<Contract>,
    users: Vec<AppUser>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    pub fn with_user(user_id: i64) -> Self {
        let store = Self::default();
        store.add_user(user_id);
        store
    }

    pub fn add_user(&self, user_id: i64) {
        let mut state = self.state.lock().expect("memory store lock");
        state.users.push(AppUser {
            id: user_id,
            email: format!("user{user_id}@example.com"),
            name: None,
        });
    }

    /// Inserts a raw row as-is, bypassing service rules.
    pub fn seed_payment(&self, payment: NewPayment) -> Payment {
        let mut state = self.state.lock().expect("memory store lock");
        let stored = materialize(state.allocate_id(), payment);
        state.payments.push(stored.clone());
        stored
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.state.lock().expect("memory store lock").payments.clone()
    }
}

fn materialize(id: i64, payment: NewPayment) -> Payment {
    Payment {
        id,
        user_id: payment.user_id,
        name: payment.name,
        category: payment.category,
        amount: payment.amount,
        payment_day: payment.payment_day,
        is_recurring: payment.is_recurring,
        auto_pay: payment.auto_pay,
        due_date: payment.due_date,
        status: payment.status,
        paid_date: payment.paid_date,
        source_type: payment.source_type,
        source_id: payment.source_id,
        created_at: None,
    }
}

fn apply_terms(contract: &mut Contract, terms: &ContractTerms) {
    contract.contract_type = terms.contract_type.clone();
    contract.address = terms.address.clone();
    contract.jeonse_deposit = terms.jeonse_deposit;
    contract.monthly_rent = terms.monthly_rent;
    contract.maintenance_fee = terms.maintenance_fee;
    contract.monthly_payment_day = terms.monthly_payment_day;
    contract.start_date = terms.start_date;
    contract.end_date = terms.end_date;
}

impl PaymentStore for MemoryStore {
    async fn find_payment(&self, payment_id: i64) -> AppResult<Option<Payment>> {
        let state = self.state.lock().expect("memory store lock");
        Ok(state.payments.iter().find(|p| p.id == payment_id).cloned())
    }

    async fn list_payments_due_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<Payment>> {
        let state = self.state.lock().expect("memory store lock");
        Ok(state
            .payments
            .iter()
            .filter(|p| p.user_id == user_id)
            .filter(|p| p.due_date.is_some_and(|due| due >= start && due <= end))
            .cloned()
            .collect())
    }

    async fn list_recurring_payments(&self, user_id: i64) -> AppResult<Vec<Payment>> {
        let state = self.state.lock().expect("memory store lock");
        Ok(state
            .payments
            .iter()
            .filter(|p| p.user_id == user_id && p.is_recurring)
            .cloned()
            .collect())
    }

    async fn list_payments(
        &self,
        user_id: i64,
        status: Option<PaymentStatus>,
        limit: i64,
    ) -> AppResult<Vec<Payment>> {
        let state = self.state.lock().expect("memory store lock");
        let limit = usize::try_from(limit.clamp(1, 1000)).unwrap_or(1000);
        Ok(state
            .payments
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .filter(|p| status.map_or(true, |wanted| p.status == wanted))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_payments_by_source(
        &self,
        user_id: i64,
        source_type: &str,
        source_id: i64,
    ) -> AppResult<Vec<Payment>> {
        let state = self.state.lock().expect("memory store lock");
        Ok(state
            .payments
            .iter()
            .filter(|p| p.user_id == user_id && p.has_source(source_type, source_id))
            .cloned()
            .collect())
    }

    async fn insert_payment(&self, payment: NewPayment) -> AppResult<Payment> {
        Ok(self.seed_payment(payment))
    }

    async fn save_payment(&self, payment: &Payment) -> AppResult<Payment> {
        let mut state = self.state.lock().expect("memory store lock");
        let slot = state
            .payments
            .iter_mut()
            .find(|p| p.id == payment.id)
            .ok_or_else(|| AppError::NotFound("Payment not found.".to_string()))?;
        *slot = payment.clone();
        Ok(slot.clone())
    }

    async fn delete_payment(&self, payment_id: i64) -> AppResult<()> {
        let mut state = self.state.lock().expect("memory store lock");
        state.payments.retain(|p| p.id != payment_id);
        Ok(())
    }

    async fn delete_payments_by_source(
        &self,
        user_id: i64,
        source_type: &str,
        source_id: i64,
    ) -> AppResult<u64> {
        let mut state = self.state.lock().expect("memory store lock");
        let before = state.payments.len();
        state
            .payments
            .retain(|p| !(p.user_id == user_id && p.has_source(source_type, source_id)));
        Ok((before - state.payments.len()) as u64)
    }
}

impl ContractStore for MemoryStore {
    async fn find_contract(&self, contract_id: i64) -> AppResult<Option<Contract>> {
        let state = self.state.lock().expect("memory store lock");
        Ok(state.contracts.iter().find(|c| c.id == contract_id).cloned())
    }

    async fn list_contracts(&self, user_id: i64) -> AppResult<Vec<Contract>> {
        let state = self.state.lock().expect("memory store lock");
        Ok(state
            .contracts
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_contract(&self, user_id: i64, terms: &ContractTerms) -> AppResult<Contract> {
        let mut state = self.state.lock().expect("memory store lock");
        let mut contract = Contract {
            id: state.allocate_id(),
            user_id,
            contract_type: String::new(),
            address: String::new(),
            jeonse_deposit: None,
            monthly_rent: None,
            maintenance_fee: None,
            monthly_payment_day: None,
            start_date: None,
            end_date: None,
            created_at: None,
        };
        apply_terms(&mut contract, terms);
        state.contracts.push(contract.clone());
        Ok(contract)
    }

    async fn update_contract(
        &self,
        contract_id: i64,
        terms: &ContractTerms,
    ) -> AppResult<Contract> {
        let mut state = self.state.lock().expect("memory store lock");
        let contract = state
            .contracts
            .iter_mut()
            .find(|c| c.id == contract_id)
            .ok_or_else(|| AppError::NotFound("Contract not found.".to_string()))?;
        apply_terms(contract, terms);
        Ok(contract.clone())
    }

    async fn delete_contract(&self, contract_id: i64) -> AppResult<()> {
        let mut state = self.state.lock().expect("memory store lock");
        state.contracts.retain(|c| c.id != contract_id);
        Ok(())
    }
}

impl UserDirectory for MemoryStore {
    async fn find_user(&self, user_id: i64) -> AppResult<Option<AppUser>> {
        let state = self.state.lock().expect("memory store lock");
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }
}
