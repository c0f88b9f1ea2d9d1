//! Table topology and the subscript arithmetic derived from it
//!
//! Three layouts are stored:
//! - **Age-banded**: one value per issue age, `min_age..=max_age`
//! - **Duration-banded**: one value per duration; issue age plays no part
//! - **Select-and-ultimate**: one row per issue age up to `max_select_age`,
//!   each holding `select_period` select values followed by one ultimate
//!   value, then the ultimate values for the remaining attained ages

use serde::Serialize;

/// Topology of a stored table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableType {
    AgeBanded,
    DurationBanded,
    SelectAndUltimate,
}

impl TableType {
    /// Decode the single-byte type code, ignoring case
    pub fn from_code(code: u8) -> Option<Self> {
        match code.to_ascii_uppercase() {
            b'A' => Some(TableType::AgeBanded),
            b'D' => Some(TableType::DurationBanded),
            b'S' => Some(TableType::SelectAndUltimate),
            _ => None,
        }
    }

    /// Canonical single-byte type code
    pub fn code(&self) -> char {
        match self {
            TableType::AgeBanded => 'A',
            TableType::DurationBanded => 'D',
            TableType::SelectAndUltimate => 'S',
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, TableType::SelectAndUltimate)
    }
}

/// Validated table metadata
///
/// Built only by the record parser once every field has been read exactly
/// once, so `select_period` is zero for non-select tables and
/// `max_select_age` is never the on-disk "unlimited" marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableMetadata {
    pub table_type: TableType,
    pub min_age: i32,
    pub max_age: i32,
    pub select_period: i32,
    pub max_select_age: i32,
}

impl TableMetadata {
    /// Number of stored values implied by the metadata
    pub fn value_count(&self) -> usize {
        value_count(
            self.table_type,
            self.min_age,
            self.max_age,
            self.select_period,
            self.max_select_age,
        )
    }

    /// Longest vector a lookup at `issue_age` may request
    pub fn max_length(&self, issue_age: i32) -> i32 {
        1 + self.max_age - issue_age
    }

    /// Subscripts into the raw values for a plain lookup
    ///
    /// Callers validate `issue_age` and `length` first; the walk itself
    /// assumes they are in range.
    pub fn subscripts(&self, issue_age: i32, length: usize) -> Vec<usize> {
        match self.table_type {
            TableType::AgeBanded => {
                let start = (issue_age - self.min_age) as usize;
                (start..start + length).collect()
            }
            TableType::DurationBanded => (0..length).collect(),
            TableType::SelectAndUltimate => self.select_walk(issue_age, length),
        }
    }

    /// Walk a flattened select-and-ultimate layout
    ///
    /// Once the select columns of a row are exhausted the walk jumps down
    /// the ultimate column, one full row per year, until it passes the last
    /// select row and continues through the trailing ultimate values. An
    /// issue age above `max_select_age` starts in the last select row with
    /// its duration shifted by the excess: `[x]+j` reads `[msa]+(x-msa)+j`.
    fn select_walk(&self, issue_age: i32, length: usize) -> Vec<usize> {
        let select_period = self.select_period as i64;
        let max_select_age = self.max_select_age as i64;
        let issue_age = issue_age as i64;
        let stride = 1 + select_period;

        let mut k = 0i64.max(issue_age - max_select_age)
            + (max_select_age.min(issue_age) - self.min_age as i64) * stride;

        let mut subscripts = Vec::with_capacity(length);
        for j in 0..length as i64 {
            subscripts.push(k as usize);
            if j + issue_age < max_select_age + select_period && select_period <= j {
                k += select_period;
            }
            k += 1;
        }
        subscripts
    }
}

/// Stored value count for the given shape
///
/// Arguments are assumed consistent (`min_age <= max_age`, and for select
/// tables `min_age <= max_select_age` with room for the select period).
pub(crate) fn value_count(
    table_type: TableType,
    min_age: i32,
    max_age: i32,
    select_period: i32,
    max_select_age: i32,
) -> usize {
    let ages = (1 + max_age - min_age) as usize;
    if table_type.is_select() {
        let rows = (1 + max_select_age - min_age) as usize;
        let select_period = select_period as usize;
        rows * select_period + (ages - select_period)
    } else {
        ages
    }
}
