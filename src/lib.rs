//! Actuarial Tables - reader and rate projector for SOA binary rate tables
//!
//! This library provides:
//! - Index lookup of numbered tables in `.ndx`/`.dat` table families
//! - Decoding of the tagged record format, with metadata validation
//! - Rate vectors by issue age and duration for age-banded,
//!   duration-banded and select-and-ultimate tables
//! - Select reentry at an inforce duration or upon a rate reset

pub mod config;
pub mod error;
pub mod table;

// Re-export commonly used types
pub use config::TableConfig;
pub use error::{Result, TableError};
pub use table::{
    table_rates, table_rates_elaborated, ActuarialTable, ReentryMethod, TableMetadata, TableType,
};
