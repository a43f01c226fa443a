//! Fiscal year and period management.

pub mod period;
pub mod resolver;

pub use period::{AccountingPeriod, FiscalYear, PeriodStatus};
pub use resolver::{FiscalCalendar, ResolvedPeriod};
