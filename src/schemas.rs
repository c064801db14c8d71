use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::{
    error::AppError,
    models::{ContractTerms, PaymentCategory},
};

pub fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::BadRequest(format!("Validation failed: {errors}")))
}

pub fn clamp_limit_in_range(limit: i64, minimum: i64, maximum: i64) -> i64 {
    limit.clamp(minimum, maximum)
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Money columns are `NUMERIC(15, 2)`.
const MONEY_SCALE: u32 = 2;
const MONEY_LIMIT: i64 = 10_000_000_000_000;

fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("negative").with_message("must be zero or more".into()));
    }
    if *value >= Decimal::from(MONEY_LIMIT) {
        return Err(ValidationError::new("too_large")
            .with_message("must be less than 10000000000000".into()));
    }
    if value.normalize().scale() > MONEY_SCALE {
        return Err(ValidationError::new("scale")
            .with_message("must have at most 2 decimal places".into()));
    }
    Ok(())
}

fn default_limit_100() -> i64 {
    100
}

fn default_contract_type() -> String {
    "MONTHLY_RENT".to_string()
}

/// Body of `POST /payments`, `POST /payments/recurring` and `PUT /payments/{id}`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    #[validate(length(max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(required)]
    pub category: Option<PaymentCategory>,
    #[validate(required, custom(function = "validate_money"))]
    pub amount: Option<Decimal>,
    #[validate(range(min = 1, max = 31))]
    pub payment_day: Option<i32>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub auto_pay: bool,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub source_type: Option<String>,
    pub source_id: Option<i64>,
}

impl PaymentInput {
    /// Category and amount after validation has run.
    pub fn required_fields(&self) -> Result<(PaymentCategory, Decimal), AppError> {
        match (self.category, self.amount) {
            (Some(category), Some(amount)) => Ok((category, amount)),
            _ => Err(AppError::BadRequest(
                "Validation failed: category and amount are required.".to_string(),
            )),
        }
    }

    /// Explicit payment day, else the due date's day of month.
    pub fn resolved_payment_day(&self) -> Option<i32> {
        self.payment_day.or_else(|| {
            self.due_date
                .and_then(|date| i32::try_from(chrono::Datelike::day(&date)).ok())
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsQuery {
    pub status: Option<String>,
    #[serde(default = "default_limit_100")]
    pub limit: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentStatusQuery {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentPath {
    pub payment_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonthPath {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcePath {
    pub source_type: String,
    pub source_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OccurrencePath {
    pub template_id: i64,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContractInput {
    #[serde(default = "default_contract_type")]
    #[validate(length(min = 1, max = 50))]
    pub contract_type: String,
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    pub address: String,
    #[validate(custom(function = "validate_money"))]
    pub jeonse_deposit: Option<Decimal>,
    #[validate(custom(function = "validate_money"))]
    pub monthly_rent: Option<Decimal>,
    #[validate(custom(function = "validate_money"))]
    pub maintenance_fee: Option<Decimal>,
    #[validate(range(min = 1, max = 31))]
    pub monthly_payment_day: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ContractInput {
    pub fn into_terms(self) -> ContractTerms {
        ContractTerms {
            contract_type: self.contract_type.trim().to_uppercase(),
            address: self.address.trim().to_string(),
            jeonse_deposit: self.jeonse_deposit,
            monthly_rent: self.monthly_rent,
            maintenance_fee: self.maintenance_fee,
            monthly_payment_day: self.monthly_payment_day,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractPath {
    pub contract_id: i64,
}
