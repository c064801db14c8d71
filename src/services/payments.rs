use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::{NewPayment, Payment, PaymentStatus},
    repository::{PaymentStore, UserDirectory},
    schemas::PaymentInput,
    services::recurrence::{occurrence_date, MonthWindow},
    tenancy::{owned_payment, require_app_user},
};

pub async fn list_payments<S: PaymentStore>(
    store: &S,
    user_id: i64,
    status: Option<PaymentStatus>,
    limit: i64,
) -> AppResult<Vec<Payment>> {
    store.list_payments(user_id, status, limit).await
}

pub async fn get_payment<S: PaymentStore>(
    store: &S,
    user_id: i64,
    payment_id: i64,
) -> AppResult<Payment> {
    owned_payment(store, user_id, payment_id).await
}

/// General create. Unrecognised status strings fall back to UPCOMING.
pub async fn create_payment<S>(store: &S, user_id: i64, input: &PaymentInput) -> AppResult<Payment>
where
    S: PaymentStore + UserDirectory,
{
    require_app_user(store, user_id).await?;
    let (category, amount) = input.required_fields()?;
    let payment = store
        .insert_payment(NewPayment {
            user_id,
            name: input.name.trim().to_string(),
            category,
            amount,
            payment_day: input.resolved_payment_day(),
            is_recurring: input.is_recurring,
            auto_pay: input.auto_pay,
            due_date: input.due_date,
            status: PaymentStatus::parse_or_upcoming(input.status.as_deref()),
            paid_date: None,
            source_type: input.source_type.clone(),
            source_id: input.source_id,
        })
        .await?;
    tracing::info!(user_id, payment_id = payment.id, "Created payment");
    Ok(payment)
}

/// Creates a recurring template and returns its id.
pub async fn create_recurring_payment<S>(
    store: &S,
    user_id: i64,
    input: &PaymentInput,
) -> AppResult<i64>
where
    S: PaymentStore + UserDirectory,
{
    require_app_user(store, user_id).await?;
    let (category, amount) = input.required_fields()?;
    let template = store
        .insert_payment(NewPayment {
            user_id,
            name: input.name.trim().to_string(),
            category,
            amount,
            payment_day: input.payment_day,
            is_recurring: true,
            auto_pay: input.auto_pay,
            due_date: input.due_date,
            status: PaymentStatus::Upcoming,
            paid_date: None,
            source_type: input.source_type.clone(),
            source_id: input.source_id,
        })
        .await?;
    tracing::info!(
        user_id,
        payment_id = template.id,
        "Created recurring payment template"
    );
    Ok(template.id)
}

/// Replaces the editable fields. Status, paid date and source are kept.
pub async fn update_payment<S: PaymentStore>(
    store: &S,
    user_id: i64,
    payment_id: i64,
    input: &PaymentInput,
) -> AppResult<Payment> {
    let mut payment = owned_payment(store, user_id, payment_id).await?;
    let (category, amount) = input.required_fields()?;
    payment.name = input.name.trim().to_string();
    payment.category = category;
    payment.amount = amount;
    payment.payment_day = input.resolved_payment_day();
    payment.is_recurring = input.is_recurring;
    payment.auto_pay = input.auto_pay;
    payment.due_date = input.due_date;
    store.save_payment(&payment).await
}

/// The only path that persists a status change.
pub async fn update_payment_status<S: PaymentStore>(
    store: &S,
    user_id: i64,
    payment_id: i64,
    status: PaymentStatus,
    today: NaiveDate,
) -> AppResult<Payment> {
    let mut payment = owned_payment(store, user_id, payment_id).await?;
    payment.status = status;
    payment.paid_date = (status == PaymentStatus::Paid).then_some(today);
    let saved = store.save_payment(&payment).await?;
    tracing::info!(
        user_id,
        payment_id,
        status = status.as_str(),
        "Updated payment status"
    );
    Ok(saved)
}

pub async fn delete_payment<S: PaymentStore>(
    store: &S,
    user_id: i64,
    payment_id: i64,
) -> AppResult<()> {
    let payment = owned_payment(store, user_id, payment_id).await?;
    store.delete_payment(payment.id).await
}

pub async fn list_payments_by_source<S: PaymentStore>(
    store: &S,
    user_id: i64,
    source_type: &str,
    source_id: i64,
) -> AppResult<Vec<Payment>> {
    store
        .list_payments_by_source(user_id, source_type, source_id)
        .await
}

pub async fn delete_payments_by_source<S: PaymentStore>(
    store: &S,
    user_id: i64,
    source_type: &str,
    source_id: i64,
) -> AppResult<u64> {
    let deleted = store
        .delete_payments_by_source(user_id, source_type, source_id)
        .await?;
    tracing::info!(
        user_id,
        source_type,
        source_id,
        deleted,
        "Deleted payments by source"
    );
    Ok(deleted)
}

/// Turns a template's slot in `window` into a concrete row so it can carry
/// its own status. Returns the existing row when the slot is already
/// materialized.
pub async fn materialize_occurrence<S: PaymentStore>(
    store: &S,
    user_id: i64,
    template_id: i64,
    window: &MonthWindow,
) -> AppResult<Payment> {
    let template = owned_payment(store, user_id, template_id).await?;
    if !template.is_recurring {
        return Err(AppError::BadRequest(
            "Only recurring payments can be materialized.".to_string(),
        ));
    }
    let due_date = occurrence_date(&template, window).ok_or_else(|| {
        AppError::BadRequest("Recurring payment has no payment day.".to_string())
    })?;

    let key = template.recurring_key();
    let existing = store
        .list_payments_due_between(user_id, window.start, window.end)
        .await?
        .into_iter()
        .find(|payment| {
            payment.id != template.id && !payment.is_recurring && payment.recurring_key() == key
        });
    if let Some(existing) = existing {
        return Ok(existing);
    }

    let payment = store
        .insert_payment(NewPayment {
            user_id,
            name: template.name.clone(),
            category: template.category,
            amount: template.amount,
            payment_day: template.payment_day,
            is_recurring: false,
            auto_pay: template.auto_pay,
            due_date: Some(due_date),
            status: PaymentStatus::Upcoming,
            paid_date: None,
            source_type: template.source_type.clone(),
            source_id: template.source_id,
        })
        .await?;
    tracing::info!(
        user_id,
        template_id,
        payment_id = payment.id,
        due_date = %due_date,
        "Materialized recurring occurrence"
    );
    Ok(payment)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{
        create_payment, create_recurring_payment, delete_payment, delete_payments_by_source,
        list_payments, list_payments_by_source, materialize_occurrence, update_payment,
        update_payment_status,
    };
    use crate::{
        error::AppError,
        models::{PaymentCategory, PaymentStatus},
        repository::memory::MemoryStore,
        schemas::PaymentInput,
        services::{payment_calendar::monthly_calendar, recurrence::MonthWindow},
    };

    const USER: i64 = 1;

    fn input(body: serde_json::Value) -> PaymentInput {
        serde_json::from_value(body).expect("payment input")
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).expect("valid date")
    }

    #[tokio::test]
    async fn create_parses_status_leniently() {
        let store = MemoryStore::with_user(USER);
        let paid = create_payment(
            &store,
            USER,
            &input(json!({"name": "Water", "category": "UTILITY", "amount": 1, "status": "paid"})),
        )
        .await
        .expect("create");
        assert_eq!(paid.status, PaymentStatus::Paid);

        let unknown = create_payment(
            &store,
            USER,
            &input(json!({"name": "Gas", "category": "UTILITY", "amount": 1, "status": "late"})),
        )
        .await
        .expect("create");
        assert_eq!(unknown.status, PaymentStatus::Upcoming);
    }

    #[tokio::test]
    async fn create_defaults_payment_day_from_due_date() {
        let store = MemoryStore::with_user(USER);
        let payment = create_payment(
            &store,
            USER,
            &input(json!({
                "name": " Insurance ",
                "category": "OTHER",
                "amount": "89000",
                "dueDate": "2026-04-19",
                "sourceType": "LOAN",
                "sourceId": 8
            })),
        )
        .await
        .expect("create");
        assert_eq!(payment.name, "Insurance");
        assert_eq!(payment.payment_day, Some(19));
        assert!(!payment.is_recurring);
        assert!(payment.has_source("LOAN", 8));
    }

    #[tokio::test]
    async fn unknown_user_cannot_create() {
        let store = MemoryStore::with_user(USER);
        let body = input(json!({"name": "Rent", "category": "RENT", "amount": 1}));
        let error = create_recurring_payment(&store, 99, &body)
            .await
            .expect_err("unknown user");
        assert!(matches!(error, AppError::NotFound(_)));
        assert!(store.payments().is_empty());
    }

    #[tokio::test]
    async fn recurring_template_is_forced_recurring_and_upcoming() {
        let store = MemoryStore::with_user(USER);
        let id = create_recurring_payment(
            &store,
            USER,
            &input(json!({
                "name": "Rent",
                "category": "RENT",
                "amount": 700000,
                "paymentDay": 25,
                "status": "PAID",
                "isRecurring": false
            })),
        )
        .await
        .expect("create");
        let stored = store.payments().into_iter().find(|p| p.id == id).expect("row");
        assert!(stored.is_recurring);
        assert_eq!(stored.status, PaymentStatus::Upcoming);
        assert_eq!(stored.payment_day, Some(25));
    }

    #[tokio::test]
    async fn status_update_tracks_paid_date() {
        let store = MemoryStore::with_user(USER);
        let payment = create_payment(
            &store,
            USER,
            &input(json!({"name": "Phone", "category": "UTILITY", "amount": 1, "dueDate": "2026-03-02"})),
        )
        .await
        .expect("create");

        let paid = update_payment_status(&store, USER, payment.id, PaymentStatus::Paid, date(3, 4))
            .await
            .expect("paid");
        assert_eq!(paid.paid_date, Some(date(3, 4)));

        let reopened =
            update_payment_status(&store, USER, payment.id, PaymentStatus::Upcoming, date(3, 5))
                .await
                .expect("reopened");
        assert_eq!(reopened.status, PaymentStatus::Upcoming);
        assert!(reopened.paid_date.is_none());
    }

    #[tokio::test]
    async fn other_users_rows_are_forbidden() {
        let store = MemoryStore::with_user(USER);
        store.add_user(2);
        let payment = create_payment(
            &store,
            USER,
            &input(json!({"name": "Rent", "category": "RENT", "amount": 1})),
        )
        .await
        .expect("create");

        let error = update_payment_status(&store, 2, payment.id, PaymentStatus::Paid, date(3, 1))
            .await
            .expect_err("forbidden");
        assert!(matches!(error, AppError::Forbidden(_)));
        let error = delete_payment(&store, 2, payment.id)
            .await
            .expect_err("forbidden");
        assert!(matches!(error, AppError::Forbidden(_)));
        assert_eq!(store.payments().len(), 1);

        let error = delete_payment(&store, USER, 12345)
            .await
            .expect_err("missing");
        assert!(matches!(error, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_replaces_fields_but_keeps_status() {
        let store = MemoryStore::with_user(USER);
        let payment = create_payment(
            &store,
            USER,
            &input(json!({"name": "Loan", "category": "LOAN", "amount": 1, "status": "PAID"})),
        )
        .await
        .expect("create");

        let updated = update_payment(
            &store,
            USER,
            payment.id,
            &input(json!({
                "name": "Car loan",
                "category": "LOAN",
                "amount": 250000,
                "paymentDay": 14,
                "isRecurring": true,
                "autoPay": true
            })),
        )
        .await
        .expect("update");
        assert_eq!(updated.id, payment.id);
        assert_eq!(updated.name, "Car loan");
        assert_eq!(updated.amount, Decimal::from(250_000));
        assert!(updated.is_recurring && updated.auto_pay);
        assert_eq!(updated.status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let store = MemoryStore::with_user(USER);
        for (name, status) in [("A", "PAID"), ("B", "UPCOMING"), ("C", "PAID")] {
            create_payment(
                &store,
                USER,
                &input(json!({"name": name, "category": "OTHER", "amount": 1, "status": status})),
            )
            .await
            .expect("create");
        }
        let paid = list_payments(&store, USER, Some(PaymentStatus::Paid), 100)
            .await
            .expect("list");
        assert_eq!(paid.len(), 2);
        assert_eq!(paid[0].name, "C");
        let limited = list_payments(&store, USER, None, 1).await.expect("list");
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn source_helpers_are_scoped() {
        let store = MemoryStore::with_user(USER);
        store.add_user(2);
        for user in [USER, 2] {
            create_payment(
                &store,
                user,
                &input(json!({
                    "name": "Electricity",
                    "category": "UTILITY",
                    "amount": 1,
                    "sourceType": "UTILITY",
                    "sourceId": 3
                })),
            )
            .await
            .expect("create");
        }

        let rows = list_payments_by_source(&store, USER, "UTILITY", 3)
            .await
            .expect("list");
        assert_eq!(rows.len(), 1);
        let deleted = delete_payments_by_source(&store, USER, "UTILITY", 3)
            .await
            .expect("delete");
        assert_eq!(deleted, 1);
        assert_eq!(store.payments().len(), 1);
        assert_eq!(store.payments()[0].user_id, 2);
    }

    #[tokio::test]
    async fn materialized_occurrence_replaces_virtual_one() {
        let store = MemoryStore::with_user(USER);
        let template_id = create_recurring_payment(
            &store,
            USER,
            &input(json!({"name": "Rent", "category": "RENT", "amount": 700000, "paymentDay": 31})),
        )
        .await
        .expect("template");
        let april = MonthWindow::new(2026, 4).expect("valid month");

        let row = materialize_occurrence(&store, USER, template_id, &april)
            .await
            .expect("materialize");
        assert_eq!(row.due_date, Some(date(4, 30)));
        assert!(!row.is_recurring);
        let again = materialize_occurrence(&store, USER, template_id, &april)
            .await
            .expect("materialize");
        assert_eq!(again.id, row.id);

        update_payment_status(&store, USER, row.id, PaymentStatus::Paid, date(4, 29))
            .await
            .expect("paid");
        let calendar = monthly_calendar(&store, USER, &april, date(4, 30))
            .await
            .expect("calendar");
        assert_eq!(calendar.payments.len(), 1);
        assert_eq!(calendar.payments[0].status, PaymentStatus::Paid);
        assert_eq!(calendar.paid_amount, Decimal::from(700_000));
        assert_eq!(calendar.payments[0].category, PaymentCategory::Rent);
    }

    #[tokio::test]
    async fn template_due_in_window_is_not_returned_as_occurrence() {
        let store = MemoryStore::with_user(USER);
        let template_id = create_recurring_payment(
            &store,
            USER,
            &input(json!({
                "name": "Internet",
                "category": "UTILITY",
                "amount": 33000,
                "paymentDay": 12,
                "dueDate": "2026-04-12"
            })),
        )
        .await
        .expect("template");
        let april = MonthWindow::new(2026, 4).expect("valid month");

        let row = materialize_occurrence(&store, USER, template_id, &april)
            .await
            .expect("materialize");
        assert_ne!(row.id, template_id);
        assert!(!row.is_recurring);
        assert_eq!(row.due_date, Some(date(4, 12)));

        update_payment_status(&store, USER, row.id, PaymentStatus::Paid, date(4, 12))
            .await
            .expect("paid");
        let template = store
            .payments()
            .into_iter()
            .find(|p| p.id == template_id)
            .expect("template kept");
        assert!(template.is_recurring);
        assert_eq!(template.status, PaymentStatus::Upcoming);
    }

    #[tokio::test]
    async fn one_off_rows_cannot_be_materialized() {
        let store = MemoryStore::with_user(USER);
        let payment = create_payment(
            &store,
            USER,
            &input(json!({"name": "Deposit", "category": "OTHER", "amount": 1})),
        )
        .await
        .expect("create");
        let april = MonthWindow::new(2026, 4).expect("valid month");
        let error = materialize_occurrence(&store, USER, payment.id, &april)
            .await
            .expect_err("not recurring");
        assert!(matches!(error, AppError::BadRequest(_)));
    }
}
