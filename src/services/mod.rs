pub mod contract_sync;
pub mod contracts;
pub mod payment_calendar;
pub mod payment_overview;
pub mod payment_status;
pub mod payments;
pub mod recurrence;
