//! Core business logic for Folio.
//!
//! This crate contains pure posting and allocation logic with ZERO database
//! dependencies. Operations take loaded state and return complete outcomes;
//! persisting an outcome atomically is the caller's job.
//!
//! # Modules
//!
//! - `fiscal` - Fiscal years, accounting periods, and the period resolver
//! - `currency` - Exchange rate resolution and base conversion
//! - `document` - Source documents and the `Statusable` state machine
//! - `journal` - Journal posting engine and reversals
//! - `allocation` - Payment allocation engine
//! - `payable` - Supplier payable ledger
//! - `hold` - Payment voucher hold gate
//! - `collab` - Numbering and authorization collaborators

pub mod allocation;
pub mod collab;
pub mod currency;
pub mod document;
pub mod error;
pub mod fiscal;
pub mod hold;
pub mod journal;
pub mod payable;

pub use error::{ErrorKind, FinanceError};
