//! Terminal front end for the Spectra sharing client.
//!
//! Collects input, hands it to [`spectra_client`], and renders the result
//! as a table or JSON.

pub mod commands;
pub mod output;

pub use commands::Cli;
pub use output::OutputFormat;
