use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    auth::require_user_id,
    db::begin_store,
    error::AppResult,
    models::Contract,
    schemas::{validate_input, ContractInput, ContractPath},
    services::contracts,
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/contracts",
            axum::routing::get(list_contracts).post(create_contract),
        )
        .route(
            "/contracts/{contract_id}",
            axum::routing::get(get_contract)
                .put(update_contract)
                .delete(delete_contract),
        )
}

async fn list_contracts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<Contract>>> {
    let user_id = require_user_id(&state, &headers).await?;
    let store = begin_store(&state).await?;
    Ok(Json(contracts::list_contracts(&store, user_id).await?))
}

async fn get_contract(
    State(state): State<AppState>,
    Path(path): Path<ContractPath>,
    headers: HeaderMap,
) -> AppResult<Json<Contract>> {
    let user_id = require_user_id(&state, &headers).await?;
    let store = begin_store(&state).await?;
    Ok(Json(
        contracts::get_contract(&store, user_id, path.contract_id).await?,
    ))
}

async fn create_contract(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ContractInput>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user_id(&state, &headers).await?;
    validate_input(&payload)?;
    let store = begin_store(&state).await?;

    let created = contracts::create_contract(&store, user_id, &payload.into_terms()).await?;
    store.commit().await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_contract(
    State(state): State<AppState>,
    Path(path): Path<ContractPath>,
    headers: HeaderMap,
    Json(payload): Json<ContractInput>,
) -> AppResult<Json<Contract>> {
    let user_id = require_user_id(&state, &headers).await?;
    validate_input(&payload)?;
    let store = begin_store(&state).await?;

    let updated =
        contracts::update_contract(&store, user_id, path.contract_id, &payload.into_terms())
            .await?;
    store.commit().await?;
    Ok(Json(updated))
}

async fn delete_contract(
    State(state): State<AppState>,
    Path(path): Path<ContractPath>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    let user_id = require_user_id(&state, &headers).await?;
    let store = begin_store(&state).await?;

    contracts::delete_contract(&store, user_id, path.contract_id).await?;
    store.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
