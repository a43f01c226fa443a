//! Payment allocation engine.
//!
//! Applies payment voucher funds to outstanding supplier invoices, either
//! from an explicit list of `(invoice, amount)` requests or oldest-first.
//!
//! - `types` - Allocation records and batch outcome
//! - `service` - Manual and automatic allocation

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::AllocationService;
pub use types::{AllocationOutcome, AllocationRequest, PaymentAllocation};
