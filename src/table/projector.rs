//! Rate lookup over parsed table data
//!
//! The plain lookup walks the stored layout from an issue age for a number
//! of durations. The elaborated lookup adds reentry: rates are re-selected
//! at some later duration, so the walk starts from a shifted issue age and
//! the result is realigned to the original contract's durations.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::geometry::TableMetadata;
use crate::error::{Result, TableError};

/// How select rates are re-selected during a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReentryMethod {
    /// No reentry; only meaningful for the plain lookup
    Never,
    /// Re-select at the inforce duration as though newly issued then
    AtInforceDuration,
    /// Re-select at the most recent rate reset
    UponRateReset,
}

impl fmt::Display for ReentryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReentryMethod::Never => "never",
            ReentryMethod::AtInforceDuration => "inforce",
            ReentryMethod::UponRateReset => "reset",
        };
        f.write_str(name)
    }
}

impl FromStr for ReentryMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "never" => Ok(ReentryMethod::Never),
            "inforce" | "at_inforce_duration" => Ok(ReentryMethod::AtInforceDuration),
            "reset" | "upon_rate_reset" => Ok(ReentryMethod::UponRateReset),
            other => Err(format!(
                "unknown reentry method '{other}' (expected never, inforce or reset)"
            )),
        }
    }
}

/// Borrowed view that answers lookups against one table
#[derive(Debug, Clone, Copy)]
pub struct RateProjector<'a> {
    path: &'a Path,
    table_number: i32,
    metadata: &'a TableMetadata,
    raw: &'a [f64],
}

impl<'a> RateProjector<'a> {
    pub fn new(path: &'a Path, table_number: i32, metadata: &'a TableMetadata, raw: &'a [f64]) -> Self {
        Self {
            path,
            table_number,
            metadata,
            raw,
        }
    }

    fn precondition(&self, detail: String) -> TableError {
        TableError::precondition(self.path, self.table_number, detail)
    }

    /// Rates for `length` durations starting at `issue_age`
    pub fn values(&self, issue_age: i32, length: i32) -> Result<Vec<f64>> {
        self.check_lookup(issue_age, length)?;
        self.lookup(issue_age, length)
    }

    /// Rates with reentry applied; non-select tables ignore `method`
    pub fn values_elaborated(
        &self,
        issue_age: i32,
        length: i32,
        method: ReentryMethod,
        inforce_duration: i32,
        reset_duration: i32,
    ) -> Result<Vec<f64>> {
        self.check_lookup(issue_age, length)?;
        let remaining = self.metadata.max_length(issue_age);
        if inforce_duration < 0 {
            return Err(self.precondition(format!(
                "inforce duration {inforce_duration} is negative"
            )));
        }
        if remaining <= inforce_duration {
            return Err(self.precondition(format!(
                "inforce duration {inforce_duration} reaches past max age {} from issue age {issue_age}",
                self.metadata.max_age
            )));
        }
        if inforce_duration < reset_duration {
            return Err(self.precondition(format!(
                "reset duration {reset_duration} follows inforce duration {inforce_duration}"
            )));
        }

        if !self.metadata.table_type.is_select() {
            return self.lookup(issue_age, length);
        }

        match method {
            ReentryMethod::Never => Err(TableError::UnsupportedMode {
                path: self.path.to_path_buf(),
                table_number: self.table_number,
                method,
            }),
            ReentryMethod::AtInforceDuration => self.reenter(issue_age, length, inforce_duration),
            ReentryMethod::UponRateReset => {
                // Never set back below the youngest age in the table
                let age_setback_limit = issue_age - self.metadata.min_age;
                let delta = reset_duration.max(-age_setback_limit);
                self.reenter(issue_age, length, delta)
            }
        }
    }

    /// Look up from `issue_age + delta` and realign to the original durations:
    /// a forward shift is padded with leading zeros, a setback drops the
    /// durations that precede the contract.
    fn reenter(&self, issue_age: i32, length: i32, delta: i32) -> Result<Vec<f64>> {
        let shifted = self.values(issue_age + delta, length - delta)?;
        let offset = delta.unsigned_abs() as usize;
        if delta < 0 {
            Ok(shifted[offset..].to_vec())
        } else {
            let mut rates = vec![0.0; offset];
            rates.extend(shifted);
            Ok(rates)
        }
    }

    fn check_lookup(&self, issue_age: i32, length: i32) -> Result<()> {
        let meta = self.metadata;
        if issue_age < meta.min_age || meta.max_age < issue_age {
            return Err(self.precondition(format!(
                "issue age {issue_age} outside [{}, {}]",
                meta.min_age, meta.max_age
            )));
        }
        let max_length = meta.max_length(issue_age);
        if length < 0 || max_length < length {
            return Err(self.precondition(format!(
                "length {length} outside [0, {max_length}] for issue age {issue_age}"
            )));
        }
        Ok(())
    }

    /// Plain lookup on arguments already checked
    fn lookup(&self, issue_age: i32, length: i32) -> Result<Vec<f64>> {
        self.metadata
            .subscripts(issue_age, length as usize)
            .into_iter()
            .map(|k| {
                self.raw.get(k).copied().ok_or_else(|| {
                    TableError::internal(
                        self.path,
                        self.table_number,
                        format!("subscript {k} beyond {} stored values", self.raw.len()),
                    )
                })
            })
            .collect()
    }
}
