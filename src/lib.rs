//! Core library for the threepl-audit command line application.
//!
//! The library audits third-party-logistics billing: spreadsheet exports are
//! classified and normalized by [`io::excel_read`], the canonical records
//! live in [`model`], the detection rules and aggregation in [`engine`], and
//! finished audits are persisted through [`store`]. The [`audit`] module
//! ties the pipeline together for the CLI.

pub mod audit;
pub mod engine;
pub mod error;
pub mod fmt;
pub mod io;
pub mod model;
pub mod store;

pub use error::{AuditError, Result};
