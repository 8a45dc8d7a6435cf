//! finboard: a financial dashboard over a REST accounting backend.
//!
//! The `analytics` module holds the pure aggregation (KPIs, monthly series, category breakdowns,
//! the filtered transaction list). The `commands` module wires it to the backend, or to an
//! offline snapshot, for the `finboard` binary.

pub mod analytics;
mod api;
pub mod args;
mod backup;
pub mod commands;
mod config;
mod error;
pub mod model;
mod utils;

#[cfg(test)]
mod test;

pub use api::{Mode, OFFLINE_ENV};
pub use config::Config;
pub use error::{Error, ErrorType, Result};
