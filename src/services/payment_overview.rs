use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{
    error::AppResult,
    models::{Contract, PaymentCategory, PaymentOccurrence},
    repository::{ContractStore, PaymentStore},
    services::{
        payment_calendar::{monthly_occurrences, MonthTotals},
        recurrence::MonthWindow,
    },
};

const RECENT_PAYMENTS_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOverview {
    pub year: i32,
    pub month: u32,
    pub current_month_total: Decimal,
    pub current_month_paid: Decimal,
    pub current_month_upcoming: Decimal,
    pub previous_month_total: Decimal,
    pub month_over_month_change: Decimal,
    pub category_breakdown: BTreeMap<PaymentCategory, Decimal>,
    pub year_to_date_total: Decimal,
    pub recent_payments: Vec<PaymentOccurrence>,
    pub monthly_fixed_cost: Decimal,
}

/// Dashboard for one month. Every aggregated month uses the same `today`.
pub async fn payment_overview<S>(
    store: &S,
    user_id: i64,
    window: &MonthWindow,
    today: NaiveDate,
) -> AppResult<PaymentOverview>
where
    S: PaymentStore + ContractStore,
{
    let current = monthly_occurrences(store, user_id, window, today).await?;
    let current_totals = MonthTotals::from_occurrences(&current);

    let previous_window = window.previous()?;
    let previous = monthly_occurrences(store, user_id, &previous_window, today).await?;
    let previous_total = MonthTotals::from_occurrences(&previous).total;

    let mut year_to_date_total = current_totals.total;
    for month in 1..window.month {
        let earlier = MonthWindow::new(window.year, month)?;
        let occurrences = monthly_occurrences(store, user_id, &earlier, today).await?;
        year_to_date_total += MonthTotals::from_occurrences(&occurrences).total;
    }

    let contracts = store.list_contracts(user_id).await?;
    let monthly_fixed_cost = contracts.first().map_or(Decimal::ZERO, fixed_cost);

    tracing::debug!(
        user_id,
        year = window.year,
        month = window.month,
        contracts = contracts.len(),
        "Composed payment overview"
    );

    Ok(PaymentOverview {
        year: window.year,
        month: window.month,
        current_month_total: current_totals.total,
        current_month_paid: current_totals.paid,
        current_month_upcoming: current_totals.upcoming,
        previous_month_total: previous_total,
        month_over_month_change: month_over_month_change(current_totals.total, previous_total),
        category_breakdown: category_breakdown(&current),
        year_to_date_total,
        recent_payments: recent_payments(current, RECENT_PAYMENTS_LIMIT),
        monthly_fixed_cost,
    })
}

/// Percent change rounded half-up to one decimal. Zero when there is no
/// positive previous total to compare against.
pub fn month_over_month_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    ((current - previous) * Decimal::ONE_HUNDRED / previous)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

pub fn category_breakdown(
    occurrences: &[PaymentOccurrence],
) -> BTreeMap<PaymentCategory, Decimal> {
    let mut breakdown = BTreeMap::new();
    for occurrence in occurrences {
        *breakdown
            .entry(occurrence.category)
            .or_insert(Decimal::ZERO) += occurrence.amount;
    }
    breakdown
}

/// Latest due dates first, undated entries last.
pub fn recent_payments(
    mut occurrences: Vec<PaymentOccurrence>,
    limit: usize,
) -> Vec<PaymentOccurrence> {
    occurrences.sort_by(|left, right| match (left.due_date, right.due_date) {
        (Some(l), Some(r)) => r.cmp(&l),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    occurrences.truncate(limit);
    occurrences
}

fn fixed_cost(contract: &Contract) -> Decimal {
    contract.monthly_rent.unwrap_or(Decimal::ZERO)
        + contract.maintenance_fee.unwrap_or(Decimal::ZERO)
}
