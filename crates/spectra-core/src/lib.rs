//! # spectra-core
//!
//! Core crate for the Spectra sharing client. Contains the unified error
//! system, configuration schemas, wire types exchanged with the sharing
//! API, and the item events observed by list views.
//!
//! This crate has **no** internal dependencies on other Spectra crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
