//! Reconciliation and comparison of Plexos and Sienna production-cost-model
//! results.

pub mod align;
pub mod cli;
pub mod config;
pub mod cost;
pub mod diff;
pub mod error;
pub mod io;
pub mod loader;
pub mod logging;
pub mod palette;
pub mod pipeline;
pub mod reconcile;
pub mod registry;
#[cfg(feature = "charts")]
pub mod render;
pub mod report;
pub mod table;
pub mod taxonomy;
