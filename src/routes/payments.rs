use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    auth::require_user_id,
    db::begin_store,
    error::AppResult,
    models::{Payment, PaymentStatus},
    schemas::{
        clamp_limit_in_range, validate_input, MonthPath, OccurrencePath, PaymentInput,
        PaymentPath, PaymentStatusQuery, PaymentsQuery, SourcePath,
    },
    services::{
        payment_calendar::{self, MonthlyCalendar},
        payment_overview::{self, PaymentOverview},
        payments,
        recurrence::MonthWindow,
    },
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/payments",
            axum::routing::get(list_payments).post(create_payment),
        )
        .route(
            "/payments/recurring",
            axum::routing::post(create_recurring_payment),
        )
        .route(
            "/payments/recurring/{template_id}/occurrences/{year}/{month}",
            axum::routing::post(materialize_occurrence),
        )
        .route(
            "/payments/calendar/{year}/{month}",
            axum::routing::get(monthly_calendar),
        )
        .route(
            "/payments/overview/{year}/{month}",
            axum::routing::get(payment_overview),
        )
        .route(
            "/payments/source/{source_type}/{source_id}",
            axum::routing::get(list_payments_by_source).delete(delete_payments_by_source),
        )
        .route(
            "/payments/{payment_id}",
            axum::routing::get(get_payment)
                .put(update_payment)
                .delete(delete_payment),
        )
        .route(
            "/payments/{payment_id}/status",
            axum::routing::patch(update_payment_status),
        )
}

async fn monthly_calendar(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
    headers: HeaderMap,
) -> AppResult<Json<MonthlyCalendar>> {
    let user_id = require_user_id(&state, &headers).await?;
    let window = MonthWindow::new(path.year, path.month)?;
    let store = begin_store(&state).await?;

    let calendar =
        payment_calendar::monthly_calendar(&store, user_id, &window, state.today()).await?;
    Ok(Json(calendar))
}

async fn payment_overview(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
    headers: HeaderMap,
) -> AppResult<Json<PaymentOverview>> {
    let user_id = require_user_id(&state, &headers).await?;
    let window = MonthWindow::new(path.year, path.month)?;
    let store = begin_store(&state).await?;

    let overview =
        payment_overview::payment_overview(&store, user_id, &window, state.today()).await?;
    Ok(Json(overview))
}

async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentsQuery>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<Payment>>> {
    let user_id = require_user_id(&state, &headers).await?;
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::parse::<PaymentStatus>)
        .transpose()?;
    let store = begin_store(&state).await?;

    let rows = payments::list_payments(
        &store,
        user_id,
        status,
        clamp_limit_in_range(query.limit, 1, 1000),
    )
    .await?;
    Ok(Json(rows))
}

async fn get_payment(
    State(state): State<AppState>,
    Path(path): Path<PaymentPath>,
    headers: HeaderMap,
) -> AppResult<Json<Payment>> {
    let user_id = require_user_id(&state, &headers).await?;
    let store = begin_store(&state).await?;
    let payment = payments::get_payment(&store, user_id, path.payment_id).await?;
    Ok(Json(payment))
}

async fn create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PaymentInput>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user_id(&state, &headers).await?;
    validate_input(&payload)?;
    let store = begin_store(&state).await?;

    let created = payments::create_payment(&store, user_id, &payload).await?;
    store.commit().await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn create_recurring_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PaymentInput>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user_id(&state, &headers).await?;
    validate_input(&payload)?;
    let store = begin_store(&state).await?;

    let template_id = payments::create_recurring_payment(&store, user_id, &payload).await?;
    store.commit().await?;
    Ok((StatusCode::CREATED, Json(template_id)))
}

async fn materialize_occurrence(
    State(state): State<AppState>,
    Path(path): Path<OccurrencePath>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user_id(&state, &headers).await?;
    let window = MonthWindow::new(path.year, path.month)?;
    let store = begin_store(&state).await?;

    let payment =
        payments::materialize_occurrence(&store, user_id, path.template_id, &window).await?;
    store.commit().await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

async fn update_payment(
    State(state): State<AppState>,
    Path(path): Path<PaymentPath>,
    headers: HeaderMap,
    Json(payload): Json<PaymentInput>,
) -> AppResult<Json<Payment>> {
    let user_id = require_user_id(&state, &headers).await?;
    validate_input(&payload)?;
    let store = begin_store(&state).await?;

    let updated = payments::update_payment(&store, user_id, path.payment_id, &payload).await?;
    store.commit().await?;
    Ok(Json(updated))
}

async fn update_payment_status(
    State(state): State<AppState>,
    Path(path): Path<PaymentPath>,
    Query(query): Query<PaymentStatusQuery>,
    headers: HeaderMap,
) -> AppResult<Json<Payment>> {
    let user_id = require_user_id(&state, &headers).await?;
    let status = query.status.parse::<PaymentStatus>()?;
    let store = begin_store(&state).await?;

    let updated = payments::update_payment_status(
        &store,
        user_id,
        path.payment_id,
        status,
        state.today(),
    )
    .await?;
    store.commit().await?;
    Ok(Json(updated))
}

async fn delete_payment(
    State(state): State<AppState>,
    Path(path): Path<PaymentPath>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    let user_id = require_user_id(&state, &headers).await?;
    let store = begin_store(&state).await?;

    payments::delete_payment(&store, user_id, path.payment_id).await?;
    store.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_payments_by_source(
    State(state): State<AppState>,
    Path(path): Path<SourcePath>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<Payment>>> {
    let user_id = require_user_id(&state, &headers).await?;
    let store = begin_store(&state).await?;

    let rows =
        payments::list_payments_by_source(&store, user_id, path.source_type.trim(), path.source_id)
            .await?;
    Ok(Json(rows))
}

async fn delete_payments_by_source(
    State(state): State<AppState>,
    Path(path): Path<SourcePath>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    let user_id = require_user_id(&state, &headers).await?;
    let store = begin_store(&state).await?;

    payments::delete_payments_by_source(&store, user_id, path.source_type.trim(), path.source_id)
        .await?;
    store.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
