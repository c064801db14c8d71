use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};

use crate::models::PaymentStatus;

pub const PAYMENT_COLUMNS: &str = "id, user_id, name, category, amount, payment_day, is_recurring, \
     auto_pay, due_date, status, paid_date, source_type, source_id, created_at";

/// Typed filter over the `payments` table. Every query is scoped to a user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentFilter {
    pub user_id: i64,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    pub status: Option<PaymentStatus>,
    pub source: Option<(String, i64)>,
}

impl PaymentFilter {
    pub fn for_user(user_id: i64) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    pub fn due_between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.due_from = Some(start);
        self.due_to = Some(end);
        self
    }

    pub fn recurring(mut self, is_recurring: bool) -> Self {
        self.is_recurring = Some(is_recurring);
        self
    }

    pub fn with_status(mut self, status: Option<PaymentStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn from_source(mut self, source_type: &str, source_id: i64) -> Self {
        self.source = Some((source_type.to_string(), source_id));
        self
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        query.push(" WHERE t.user_id = ").push_bind(self.user_id);
        if let Some(from) = self.due_from {
            query.push(" AND t.due_date >= ").push_bind(from);
        }
        if let Some(to) = self.due_to {
            query.push(" AND t.due_date <= ").push_bind(to);
        }
        if let Some(flag) = self.is_recurring {
            query.push(" AND t.is_recurring = ").push_bind(flag);
        }
        if let Some(status) = self.status {
            query.push(" AND t.status = ").push_bind(status.as_str());
        }
        if let Some((source_type, source_id)) = &self.source {
            query
                .push(" AND t.source_type = ")
                .push_bind(source_type.clone())
                .push(" AND t.source_id = ")
                .push_bind(*source_id);
        }
    }

    pub fn select(
        &self,
        order_by: PaymentOrder,
        limit: Option<i64>,
    ) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query.push(PAYMENT_COLUMNS).push(" FROM payments t");
        self.push_conditions(&mut query);
        query.push(order_by.as_sql());
        if let Some(limit) = limit {
            query.push(" LIMIT ").push_bind(limit.clamp(1, 1000));
        }
        query
    }

    pub fn delete(&self) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::<Postgres>::new("DELETE FROM payments t");
        self.push_conditions(&mut query);
        query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOrder {
    IdAsc,
    NewestFirst,
}

impl PaymentOrder {
    fn as_sql(self) -> &'static str {
        match self {
            Self::IdAsc => " ORDER BY t.id ASC",
            Self::NewestFirst => " ORDER BY t.created_at DESC, t.id DESC",
        }
    }
}
