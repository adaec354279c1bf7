//! Report and table export.

pub mod export;
