use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Source type recorded on payments generated from a lease contract.
pub const CONTRACT_SOURCE: &str = "CONTRACT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentCategory {
    Rent,
    Maintenance,
    Loan,
    Utility,
    Other,
}

impl PaymentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rent => "RENT",
            Self::Maintenance => "MAINTENANCE",
            Self::Loan => "LOAN",
            Self::Utility => "UTILITY",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for PaymentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentCategory {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RENT" => Ok(Self::Rent),
            "MAINTENANCE" => Ok(Self::Maintenance),
            "LOAN" => Ok(Self::Loan),
            "UTILITY" => Ok(Self::Utility),
            "OTHER" => Ok(Self::Other),
            other => Err(AppError::BadRequest(format!(
                "Unknown payment category '{other}'."
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Upcoming,
    Paid,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "UPCOMING",
            Self::Paid => "PAID",
            Self::Overdue => "OVERDUE",
        }
    }

    /// Lenient parse used by the create form: anything unrecognised is UPCOMING.
    pub fn parse_or_upcoming(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok())
            .unwrap_or(Self::Upcoming)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "UPCOMING" => Ok(Self::Upcoming),
            "PAID" => Ok(Self::Paid),
            "OVERDUE" => Ok(Self::Overdue),
            other => Err(AppError::BadRequest(format!(
                "Unknown payment status '{other}'."
            ))),
        }
    }
}

/// A persisted payment row. Recurring rows are templates, the rest are
/// single occurrences.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub name: String,
    pub category: PaymentCategory,
    pub amount: Decimal,
    pub payment_day: Option<i32>,
    pub is_recurring: bool,
    pub auto_pay: bool,
    pub due_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    pub paid_date: Option<NaiveDate>,
    pub source_type: Option<String>,
    pub source_id: Option<i64>,
    #[serde(skip)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Nominal day-of-month: the stored payment day, else the due date's day.
    pub fn resolved_day(&self) -> Option<u32> {
        self.payment_day
            .and_then(|day| u32::try_from(day).ok())
            .filter(|day| *day >= 1)
            .or_else(|| self.due_date.map(|date| date.day()))
    }

    /// Key used to match a concrete occurrence against a recurring template.
    pub fn recurring_key(&self) -> String {
        recurring_key(self.category, &self.name)
    }
}

#[cfg(test)]
impl Payment {
    pub fn has_source(&self, source_type: &str, source_id: i64) -> bool {
        self.source_type.as_deref() == Some(source_type) && self.source_id == Some(source_id)
    }
}

pub fn recurring_key(category: PaymentCategory, name: &str) -> String {
    format!("{}|{}", category.as_str(), name)
}

/// Fields for inserting a payment row; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub user_id: i64,
    pub name: String,
    pub category: PaymentCategory,
    pub amount: Decimal,
    pub payment_day: Option<i32>,
    pub is_recurring: bool,
    pub auto_pay: bool,
    pub due_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    pub paid_date: Option<NaiveDate>,
    pub source_type: Option<String>,
    pub source_id: Option<i64>,
}

/// Identity of one entry in a month view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OccurrenceRef {
    Materialized { id: i64 },
    Virtual {
        #[serde(rename = "templateId")]
        template_id: i64,
    },
}

#[cfg(test)]
impl OccurrenceRef {
    pub fn is_virtual(self) -> bool {
        matches!(self, Self::Virtual { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOccurrence {
    #[serde(flatten)]
    pub occurrence: OccurrenceRef,
    pub name: String,
    pub category: PaymentCategory,
    pub amount: Decimal,
    pub payment_day: Option<i32>,
    pub status: PaymentStatus,
    pub auto_pay: bool,
    pub is_recurring: bool,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub source_type: Option<String>,
    pub source_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub contract_type: String,
    pub address: String,
    pub jeonse_deposit: Option<Decimal>,
    pub monthly_rent: Option<Decimal>,
    pub maintenance_fee: Option<Decimal>,
    pub monthly_payment_day: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Editable contract fields shared by create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractTerms {
    pub contract_type: String,
    pub address: String,
    pub jeonse_deposit: Option<Decimal>,
    pub monthly_rent: Option<Decimal>,
    pub maintenance_fee: Option<Decimal>,
    pub monthly_payment_day: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppUser {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
}
