use crate::{
    error::{AppError, AppResult},
    models::{AppUser, Contract, Payment},
    repository::{ContractStore, PaymentStore, UserDirectory},
};

/// A row that belongs to exactly one user.
pub trait Owned {
    const LABEL: &'static str;

    fn owner_id(&self) -> i64;
}

impl Owned for Payment {
    const LABEL: &'static str = "Payment";

    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

impl Owned for Contract {
    const LABEL: &'static str = "Contract";

    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// NotFound when the row is missing, Forbidden when another user owns it.
pub fn assert_owner<T: Owned>(resource: Option<T>, user_id: i64) -> AppResult<T> {
    let Some(resource) = resource else {
        return Err(AppError::NotFound(format!("{} not found.", T::LABEL)));
    };
    if resource.owner_id() != user_id {
        tracing::warn!(
            user_id,
            owner_id = resource.owner_id(),
            resource = T::LABEL,
            "Rejected access to another user's row"
        );
        return Err(AppError::Forbidden(format!(
            "Forbidden: {} belongs to another user.",
            T::LABEL.to_lowercase()
        )));
    }
    Ok(resource)
}

pub async fn owned_payment<S: PaymentStore>(
    store: &S,
    user_id: i64,
    payment_id: i64,
) -> AppResult<Payment> {
    assert_owner(store.find_payment(payment_id).await?, user_id)
}

pub async fn owned_contract<S: ContractStore>(
    store: &S,
    user_id: i64,
    contract_id: i64,
) -> AppResult<Contract> {
    assert_owner(store.find_contract(contract_id).await?, user_id)
}

pub async fn require_app_user<S: UserDirectory>(store: &S, user_id: i64) -> AppResult<AppUser> {
    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{assert_owner, owned_payment, require_app_user};
    use crate::{
        error::AppError,
        models::{NewPayment, PaymentCategory, PaymentStatus},
        repository::memory::MemoryStore,
    };

    fn payment_for(user_id: i64) -> NewPayment {
        NewPayment {
            user_id,
            name: "Internet".to_string(),
            category: PaymentCategory::Utility,
            amount: Decimal::from(33_000),
            payment_day: Some(12),
            is_recurring: true,
            auto_pay: true,
            due_date: None,
            status: PaymentStatus::Upcoming,
            paid_date: None,
            source_type: None,
            source_id: None,
        }
    }

    #[tokio::test]
    async fn owner_can_read_row() {
        let store = MemoryStore::with_user(1);
        let stored = store.seed_payment(payment_for(1));
        let found = owned_payment(&store, 1, stored.id).await.expect("owned");
        assert_eq!(found.id, stored.id);
    }

    #[tokio::test]
    async fn other_user_is_forbidden() {
        let store = MemoryStore::with_user(1);
        let stored = store.seed_payment(payment_for(1));
        let error = owned_payment(&store, 2, stored.id).await.expect_err("forbidden");
        assert!(matches!(error, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn missing_row_is_not_found() {
        let store = MemoryStore::with_user(1);
        let error = owned_payment(&store, 1, 404).await.expect_err("missing");
        assert!(matches!(error, AppError::NotFound(message) if message == "Payment not found."));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = MemoryStore::with_user(1);
        assert!(require_app_user(&store, 1).await.is_ok());
        let error = require_app_user(&store, 9).await.expect_err("missing");
        assert!(matches!(error, AppError::NotFound(_)));
    }

    #[test]
    fn none_is_not_found_before_ownership() {
        let missing: Option<crate::models::Payment> = None;
        assert!(matches!(assert_owner(missing, 1), Err(AppError::NotFound(_))));
    }
}
