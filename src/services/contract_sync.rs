use rust_decimal::Decimal;

use crate::{
    error::AppResult,
    models::{Contract, NewPayment, PaymentCategory, PaymentStatus, CONTRACT_SOURCE},
    repository::PaymentStore,
};

pub const DEFAULT_PAYMENT_DAY: i32 = 25;

/// One synchronized payment slot derived from a contract.
struct SyncSlot {
    category: PaymentCategory,
    name: &'static str,
    amount: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created { payment_id: i64 },
    Updated { payment_id: i64, removed_duplicates: usize },
    Removed { count: usize },
    Skipped,
}

impl SyncAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::Removed { .. } => "removed",
            Self::Skipped => "skipped",
        }
    }

    pub fn payment_id(self) -> Option<i64> {
        match self {
            Self::Created { payment_id } | Self::Updated { payment_id, .. } => Some(payment_id),
            Self::Removed { .. } | Self::Skipped => None,
        }
    }

    /// Rows deleted while bringing the slot in line.
    pub fn rows_removed(self) -> usize {
        match self {
            Self::Updated {
                removed_duplicates, ..
            } => removed_duplicates,
            Self::Removed { count } => count,
            Self::Created { .. } | Self::Skipped => 0,
        }
    }
}

/// Keeps at most one recurring RENT and one MAINTENANCE payment per contract
/// in line with the contract's amounts and payment day.
pub async fn sync_contract_payments<S: PaymentStore>(
    store: &S,
    contract: &Contract,
) -> AppResult<Vec<(PaymentCategory, SyncAction)>> {
    let payment_day = effective_payment_day(contract.monthly_payment_day);
    let slots = [
        SyncSlot {
            category: PaymentCategory::Rent,
            name: "Rent",
            amount: contract.monthly_rent,
        },
        SyncSlot {
            category: PaymentCategory::Maintenance,
            name: "Maintenance fee",
            amount: contract.maintenance_fee,
        },
    ];

    let mut actions = Vec::with_capacity(slots.len());
    for slot in slots {
        let action = sync_slot(store, contract, &slot, payment_day).await?;
        tracing::info!(
            user_id = contract.user_id,
            contract_id = contract.id,
            category = slot.category.as_str(),
            action = action.as_str(),
            payment_id = action.payment_id(),
            rows_removed = action.rows_removed(),
            "Synchronized contract payment"
        );
        actions.push((slot.category, action));
    }
    Ok(actions)
}

/// The contract's day when it is a real day of month, else the 25th.
pub fn effective_payment_day(monthly_payment_day: Option<i32>) -> i32 {
    monthly_payment_day
        .filter(|day| (1..=31).contains(day))
        .unwrap_or(DEFAULT_PAYMENT_DAY)
}

async fn sync_slot<S: PaymentStore>(
    store: &S,
    contract: &Contract,
    slot: &SyncSlot,
    payment_day: i32,
) -> AppResult<SyncAction> {
    let existing = store
        .list_payments_by_source(contract.user_id, CONTRACT_SOURCE, contract.id)
        .await?
        .into_iter()
        .filter(|payment| payment.category == slot.category)
        .collect::<Vec<_>>();

    let amount = match slot.amount {
        Some(amount) if amount > Decimal::ZERO => amount,
        _ => {
            for payment in &existing {
                store.delete_payment(payment.id).await?;
            }
            return Ok(if existing.is_empty() {
                SyncAction::Skipped
            } else {
                SyncAction::Removed {
                    count: existing.len(),
                }
            });
        }
    };

    let mut rows = existing.into_iter();
    let Some(mut primary) = rows.next() else {
        let created = store
            .insert_payment(NewPayment {
                user_id: contract.user_id,
                name: slot.name.to_string(),
                category: slot.category,
                amount,
                payment_day: Some(payment_day),
                is_recurring: true,
                auto_pay: false,
                due_date: None,
                status: PaymentStatus::Upcoming,
                paid_date: None,
                source_type: Some(CONTRACT_SOURCE.to_string()),
                source_id: Some(contract.id),
            })
            .await?;
        return Ok(SyncAction::Created {
            payment_id: created.id,
        });
    };

    primary.name = slot.name.to_string();
    primary.amount = amount;
    primary.is_recurring = true;
    primary.payment_day = Some(payment_day);
    primary.source_type = Some(CONTRACT_SOURCE.to_string());
    primary.source_id = Some(contract.id);
    let saved = store.save_payment(&primary).await?;

    let mut removed_duplicates = 0;
    for duplicate in rows {
        tracing::warn!(
            contract_id = contract.id,
            payment_id = duplicate.id,
            category = slot.category.as_str(),
            "Removing duplicate contract payment"
        );
        store.delete_payment(duplicate.id).await?;
        removed_duplicates += 1;
    }

    Ok(SyncAction::Updated {
        payment_id: saved.id,
        removed_duplicates,
    })
}
