use chrono::NaiveDate;

use crate::models::PaymentStatus;

/// Effective status of a materialized row as of `today`.
///
/// An UPCOMING row whose due date is strictly in the past reads as OVERDUE.
/// Every other combination is reported unchanged; PAID is never overridden.
/// The stored status is not touched.
pub fn effective_status(
    stored: PaymentStatus,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> PaymentStatus {
    match (stored, due_date) {
        (PaymentStatus::Upcoming, Some(due)) if due < today => PaymentStatus::Overdue,
        _ => stored,
    }
}

/// Status of a projected occurrence, which can never be PAID.
pub fn projected_status(due_date: NaiveDate, today: NaiveDate) -> PaymentStatus {
    if due_date < today {
        PaymentStatus::Overdue
    } else {
        PaymentStatus::Upcoming
    }
}
