//! Validated primitives shared across the healthcare records client.
//!
//! Every value here is checked once at construction, so holders never need to
//! re-validate:
//! - [`NonEmptyText`] for free-text form fields
//! - [`Address`] for account and service addresses
//! - [`TxHash`] for submitted state changes
//! - [`SubjectId`] for the patient identifier typed by the user

mod address;
mod subject;
mod text;

pub use address::{Address, AddressError, TxHash};
pub use subject::{SubjectId, SubjectIdError};
pub use text::{NonEmptyText, TextError};
