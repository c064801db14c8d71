use std::collections::HashSet;

use chrono::{Datelike, Months, NaiveDate};

use crate::{
    error::{AppError, AppResult},
    models::{OccurrenceRef, Payment, PaymentOccurrence},
    services::payment_status::projected_status,
};

/// A calendar month with its inclusive first and last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub year: i32,
    pub month: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthWindow {
    pub fn new(year: i32, month: u32) -> AppResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(AppError::BadRequest(format!(
                "Invalid month {month}. Expected 1-12."
            )));
        }
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid year {year}.")))?;
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| AppError::BadRequest(format!("Invalid year {year}.")))?;
        Ok(Self {
            year,
            month,
            start,
            end,
        })
    }

    /// The preceding month, rolling January back to December of the prior year.
    pub fn previous(&self) -> AppResult<Self> {
        if self.month == 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    pub fn last_day(&self) -> u32 {
        self.end.day()
    }

    /// Day `day` of this month, or the month's last day when it is shorter.
    pub fn clamp_day(&self, day: u32) -> NaiveDate {
        let clamped = day.clamp(1, self.last_day());
        self.start.with_day(clamped).unwrap_or(self.end)
    }
}

/// Projects recurring templates into `window`, skipping every template whose
/// (category, name) slot is already covered by a materialized row of that
/// month. Templates without a resolvable day are left out.
pub fn project_virtual_occurrences(
    templates: &[Payment],
    materialized: &[Payment],
    window: &MonthWindow,
    today: NaiveDate,
) -> Vec<PaymentOccurrence> {
    let existing_keys = materialized
        .iter()
        .map(Payment::recurring_key)
        .collect::<HashSet<_>>();

    templates
        .iter()
        .filter_map(|template| {
            let day = template.resolved_day()?;
            if existing_keys.contains(&template.recurring_key()) {
                return None;
            }
            Some(virtual_occurrence(template, window.clamp_day(day), today))
        })
        .collect()
}

/// Due date of `template`'s slot in `window`, if the template has a day.
pub fn occurrence_date(template: &Payment, window: &MonthWindow) -> Option<NaiveDate> {
    template.resolved_day().map(|day| window.clamp_day(day))
}

fn virtual_occurrence(
    template: &Payment,
    due_date: NaiveDate,
    today: NaiveDate,
) -> PaymentOccurrence {
    PaymentOccurrence {
        occurrence: OccurrenceRef::Virtual {
            template_id: template.id,
        },
        name: template.name.clone(),
        category: template.category,
        amount: template.amount,
        payment_day: i32::try_from(due_date.day()).ok(),
        status: projected_status(due_date, today),
        auto_pay: template.auto_pay,
        is_recurring: true,
        due_date: Some(due_date),
        paid_date: None,
        source_type: template.source_type.clone(),
        source_id: template.source_id,
    }
}
