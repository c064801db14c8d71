use crate::{
    error::AppResult,
    models::{Contract, ContractTerms, CONTRACT_SOURCE},
    repository::{ContractStore, PaymentStore, UserDirectory},
    services::contract_sync::sync_contract_payments,
    tenancy::{owned_contract, require_app_user},
};

pub async fn list_contracts<S: ContractStore>(store: &S, user_id: i64) -> AppResult<Vec<Contract>> {
    store.list_contracts(user_id).await
}

pub async fn get_contract<S: ContractStore>(
    store: &S,
    user_id: i64,
    contract_id: i64,
) -> AppResult<Contract> {
    owned_contract(store, user_id, contract_id).await
}

pub async fn create_contract<S>(store: &S, user_id: i64, terms: &ContractTerms) -> AppResult<Contract>
where
    S: ContractStore + PaymentStore + UserDirectory,
{
    require_app_user(store, user_id).await?;
    let contract = store.insert_contract(user_id, terms).await?;
    sync_contract_payments(store, &contract).await?;
    tracing::info!(user_id, contract_id = contract.id, "Created contract");
    Ok(contract)
}

pub async fn update_contract<S>(
    store: &S,
    user_id: i64,
    contract_id: i64,
    terms: &ContractTerms,
) -> AppResult<Contract>
where
    S: ContractStore + PaymentStore,
{
    owned_contract(store, user_id, contract_id).await?;
    let contract = store.update_contract(contract_id, terms).await?;
    sync_contract_payments(store, &contract).await?;
    Ok(contract)
}

/// Removes the contract together with every payment it generated.
pub async fn delete_contract<S>(store: &S, user_id: i64, contract_id: i64) -> AppResult<()>
where
    S: ContractStore + PaymentStore,
{
    let contract = owned_contract(store, user_id, contract_id).await?;
    let removed = store
        .delete_payments_by_source(user_id, CONTRACT_SOURCE, contract.id)
        .await?;
    store.delete_contract(contract.id).await?;
    tracing::info!(
        user_id,
        contract_id,
        removed_payments = removed,
        "Deleted contract"
    );
    Ok(())
}
