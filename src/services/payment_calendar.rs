use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    error::AppResult,
    models::{OccurrenceRef, Payment, PaymentOccurrence, PaymentStatus},
    repository::PaymentStore,
    services::{
        payment_status::effective_status,
        recurrence::{project_virtual_occurrences, MonthWindow},
    },
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCalendar {
    pub year: i32,
    pub month: u32,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub upcoming_amount: Decimal,
    pub payments: Vec<PaymentOccurrence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthTotals {
    pub total: Decimal,
    pub paid: Decimal,
    pub upcoming: Decimal,
}

impl MonthTotals {
    /// Upcoming is derived as total minus paid, so OVERDUE amounts count as
    /// upcoming and `total == paid + upcoming` holds exactly.
    pub fn from_occurrences(occurrences: &[PaymentOccurrence]) -> Self {
        let total = occurrences.iter().map(|o| o.amount).sum::<Decimal>();
        let paid = occurrences
            .iter()
            .filter(|o| o.status == PaymentStatus::Paid)
            .map(|o| o.amount)
            .sum::<Decimal>();
        Self {
            total,
            paid,
            upcoming: total - paid,
        }
    }
}

/// Every effective occurrence of the user's month: stored rows due in the
/// month (with read-time status) followed by projections of recurring
/// templates not already covered.
pub async fn monthly_occurrences<S: PaymentStore>(
    store: &S,
    user_id: i64,
    window: &MonthWindow,
    today: NaiveDate,
) -> AppResult<Vec<PaymentOccurrence>> {
    let materialized = store
        .list_payments_due_between(user_id, window.start, window.end)
        .await?;
    let templates = store.list_recurring_payments(user_id).await?;

    let mut occurrences = materialized
        .iter()
        .map(|payment| materialized_occurrence(payment, today))
        .collect::<Vec<_>>();
    let projected = project_virtual_occurrences(&templates, &materialized, window, today);

    tracing::debug!(
        user_id,
        year = window.year,
        month = window.month,
        materialized = occurrences.len(),
        projected = projected.len(),
        "Built monthly occurrences"
    );

    occurrences.extend(projected);
    Ok(occurrences)
}

pub async fn monthly_calendar<S: PaymentStore>(
    store: &S,
    user_id: i64,
    window: &MonthWindow,
    today: NaiveDate,
) -> AppResult<MonthlyCalendar> {
    let payments = monthly_occurrences(store, user_id, window, today).await?;
    let totals = MonthTotals::from_occurrences(&payments);
    Ok(MonthlyCalendar {
        year: window.year,
        month: window.month,
        total_amount: totals.total,
        paid_amount: totals.paid,
        upcoming_amount: totals.upcoming,
        payments,
    })
}

pub fn materialized_occurrence(payment: &Payment, today: NaiveDate) -> PaymentOccurrence {
    PaymentOccurrence {
        occurrence: OccurrenceRef::Materialized { id: payment.id },
        name: payment.name.clone(),
        category: payment.category,
        amount: payment.amount,
        payment_day: payment
            .resolved_day()
            .and_then(|day| i32::try_from(day).ok()),
        status: effective_status(payment.status, payment.due_date, today),
        auto_pay: payment.auto_pay,
        is_recurring: payment.is_recurring,
        due_date: payment.due_date,
        paid_date: payment.paid_date,
        source_type: payment.source_type.clone(),
        source_id: payment.source_id,
    }
}
