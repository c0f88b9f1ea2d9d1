//! SOA binary actuarial tables
//!
//! A table family is a pair of files sharing a base name: a fixed-width
//! index mapping table numbers to offsets, and a data file of tagged
//! records. [`ActuarialTable`] locates one table, decodes it once and then
//! answers rate lookups without further I/O.
//!
//! # Example
//!
//! ```rust,ignore
//! use actuarial_tables::{ActuarialTable, ReentryMethod};
//!
//! let table = ActuarialTable::open("data/qx_cso", 42)?;
//! let ultimate = table.values(45, 10)?;
//! let reentered = table.values_elaborated(45, 10, ReentryMethod::AtInforceDuration, 3, 0)?;
//! ```

mod geometry;
mod index;
mod parser;
mod projector;

#[cfg(test)]
pub(crate) mod test_support;

pub use geometry::{TableMetadata, TableType};
pub use index::{locate, IndexEntry, INDEX_RECORD_LEN};
pub use parser::{parse_table, ParsedTable};
pub use projector::{RateProjector, ReentryMethod};

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use crate::config::TableConfig;
use crate::error::{Result, TableError};

/// One decoded table, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct ActuarialTable {
    path: PathBuf,
    table_number: i32,
    name: String,
    metadata: TableMetadata,
    values: Vec<f64>,
}

impl ActuarialTable {
    /// Load `table_number` from the family at `path` with default configuration
    pub fn open(path: impl AsRef<Path>, table_number: i32) -> Result<Self> {
        Self::open_with(path, table_number, &TableConfig::default())
    }

    /// Load `table_number` from the family at `path`
    ///
    /// The index and data files are `path` with the configured extensions.
    /// The table number is checked before either file is opened.
    pub fn open_with(path: impl AsRef<Path>, table_number: i32, config: &TableConfig) -> Result<Self> {
        let path = path.as_ref();
        if table_number <= 0 {
            return Err(TableError::Configuration {
                path: path.to_path_buf(),
                table_number,
            });
        }

        let index_path = config.index_path(path);
        let index = File::open(&index_path)
            .map_err(|e| TableError::from_io(&index_path, table_number, "index file", e))?;
        let entry = locate(BufReader::new(index), &index_path, table_number)?;

        let data_path = config.data_path(path);
        let data = File::open(&data_path)
            .map_err(|e| TableError::from_io(&data_path, table_number, "data file", e))?;
        let parsed = parse_table(
            BufReader::new(data),
            entry.offset,
            &data_path,
            table_number,
            config.methuselah,
        )?;

        Ok(Self {
            path: path.to_path_buf(),
            table_number,
            name: entry.name,
            metadata: parsed.metadata,
            values: parsed.values,
        })
    }

    /// Load `table_number` from already-open index and data streams
    ///
    /// `path` only labels errors.
    pub fn from_readers<I: Read, D: Read + Seek>(
        path: impl AsRef<Path>,
        table_number: i32,
        index: I,
        data: D,
        config: &TableConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let entry = locate(index, path, table_number)?;
        let parsed = parse_table(data, entry.offset, path, table_number, config.methuselah)?;

        Ok(Self {
            path: path.to_path_buf(),
            table_number,
            name: entry.name,
            metadata: parsed.metadata,
            values: parsed.values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table_number(&self) -> i32 {
        self.table_number
    }

    /// Name carried by the index record
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    /// Stored values in file order
    pub fn raw_values(&self) -> &[f64] {
        &self.values
    }

    pub fn projector(&self) -> RateProjector<'_> {
        RateProjector::new(&self.path, self.table_number, &self.metadata, &self.values)
    }

    /// Rates for `length` durations from `issue_age`
    pub fn values(&self, issue_age: i32, length: i32) -> Result<Vec<f64>> {
        self.projector().values(issue_age, length)
    }

    /// Rates with select reentry applied
    pub fn values_elaborated(
        &self,
        issue_age: i32,
        length: i32,
        method: ReentryMethod,
        inforce_duration: i32,
        reset_duration: i32,
    ) -> Result<Vec<f64>> {
        self.projector()
            .values_elaborated(issue_age, length, method, inforce_duration, reset_duration)
    }
}

/// Open a table, look up one rate vector and discard the table
pub fn table_rates(
    path: impl AsRef<Path>,
    table_number: i32,
    issue_age: i32,
    length: i32,
) -> Result<Vec<f64>> {
    ActuarialTable::open(path, table_number)?.values(issue_age, length)
}

/// Open a table, look up one reentry-adjusted rate vector and discard the table
pub fn table_rates_elaborated(
    path: impl AsRef<Path>,
    table_number: i32,
    issue_age: i32,
    length: i32,
    method: ReentryMethod,
    inforce_duration: i32,
    reset_duration: i32,
) -> Result<Vec<f64>> {
    ActuarialTable::open(path, table_number)?.values_elaborated(
        issue_age,
        length,
        method,
        inforce_duration,
        reset_duration,
    )
}
