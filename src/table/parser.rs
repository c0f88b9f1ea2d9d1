//! Tagged-record decoder for SOA data files
//!
//! Starting at the offset named by the index, a table is a run of records
//! `(tag: i16, nominal_length: u16, payload)` closed by the end tag. All
//! integers and doubles are little-endian. Decoding goes through
//! `from_le_bytes`, so the result is the same on any host byte order.
//!
//! The values record is the exception to "payload is `nominal_length`
//! bytes": its length field is 16 bits and wraps for large tables, so the
//! value count is derived from the metadata records that precede it.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, trace};

use super::geometry::{value_count, TableMetadata, TableType};
use crate::error::{Result, TableError};

pub const TAG_TABLE_NUMBER: i16 = 2;
pub const TAG_TABLE_TYPE: i16 = 3;
pub const TAG_MIN_AGE: i16 = 12;
pub const TAG_MAX_AGE: i16 = 13;
pub const TAG_SELECT_PERIOD: i16 = 14;
pub const TAG_MAX_SELECT_AGE: i16 = 15;
pub const TAG_VALUES: i16 = 17;
pub const TAG_END: i16 = 9999;

/// Metadata and values decoded for one table
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    pub metadata: TableMetadata,
    pub values: Vec<f64>,
}

/// Parse the table that starts at `offset` in `data`
///
/// `methuselah` bounds every age field. `path` and `table_number` label
/// errors; the number is also checked against the record that echoes it.
pub fn parse_table<R: Read + Seek>(
    data: R,
    offset: u64,
    path: &Path,
    table_number: i32,
    methuselah: i32,
) -> Result<ParsedTable> {
    let mut parser = RecordParser {
        data,
        path,
        table_number,
        methuselah,
        fields: Fields::default(),
        values: None,
        echo_seen: false,
    };
    parser
        .data
        .seek(SeekFrom::Start(offset))
        .map_err(|e| TableError::from_io(path, table_number, "data offset", e))?;
    parser.run()
}

/// A metadata field that must be written exactly once
#[derive(Debug)]
struct Once<T> {
    value: Option<T>,
}

impl<T> Default for Once<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T: Copy> Once<T> {
    fn get(&self) -> Option<T> {
        self.value
    }
}

#[derive(Debug, Default)]
struct Fields {
    table_type: Once<TableType>,
    min_age: Once<i32>,
    max_age: Once<i32>,
    select_period: Once<i32>,
    max_select_age: Once<i32>,
}

struct RecordParser<'a, R> {
    data: R,
    path: &'a Path,
    table_number: i32,
    methuselah: i32,
    fields: Fields,
    values: Option<Vec<f64>>,
    echo_seen: bool,
}

impl<'a, R: Read + Seek> RecordParser<'a, R> {
    fn run(mut self) -> Result<ParsedTable> {
        loop {
            let tag = i16::from_le_bytes(self.read_array("record tag")?);
            let nominal_length = u16::from_le_bytes(self.read_array("record length")?);

            match tag {
                TAG_END => break,
                TAG_TABLE_NUMBER => self.read_echo(nominal_length)?,
                TAG_TABLE_TYPE => self.read_table_type(nominal_length)?,
                TAG_MIN_AGE => self.read_age(nominal_length, "min_age", |f| &mut f.min_age)?,
                TAG_MAX_AGE => self.read_age(nominal_length, "max_age", |f| &mut f.max_age)?,
                TAG_SELECT_PERIOD => {
                    self.read_age(nominal_length, "select_period", |f| &mut f.select_period)?
                }
                TAG_MAX_SELECT_AGE => {
                    self.read_age(nominal_length, "max_select_age", |f| &mut f.max_select_age)?
                }
                TAG_VALUES => self.read_values(nominal_length)?,
                other => self.skip(other, nominal_length)?,
            }
        }
        self.finish()
    }

    fn corrupt(&self, detail: impl Into<String>) -> TableError {
        TableError::corrupt(self.path, self.table_number, detail)
    }

    fn read_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.data
            .read_exact(&mut buf)
            .map_err(|e| TableError::from_io(self.path, self.table_number, what, e))?;
        Ok(buf)
    }

    fn expect_length(&self, field: &str, nominal_length: u16, expected: u16) -> Result<()> {
        if nominal_length != expected {
            return Err(self.corrupt(format!(
                "{field} record has length {nominal_length}, expected {expected}"
            )));
        }
        Ok(())
    }

    fn set_once<T: Copy>(
        &mut self,
        field: &str,
        value: T,
        slot: impl FnOnce(&mut Fields) -> &mut Once<T>,
    ) -> Result<()> {
        let once = slot(&mut self.fields);
        if once.value.is_some() {
            return Err(TableError::corrupt(
                self.path,
                self.table_number,
                format!("{field} is set more than once"),
            ));
        }
        once.value = Some(value);
        Ok(())
    }

    fn read_echo(&mut self, nominal_length: u16) -> Result<()> {
        self.expect_length("table_number", nominal_length, 4)?;
        let echoed = i32::from_le_bytes(self.read_array("table_number")?);
        if self.echo_seen {
            return Err(self.corrupt("table_number is set more than once"));
        }
        if echoed != self.table_number {
            return Err(self.corrupt(format!(
                "data records carry table number {echoed}"
            )));
        }
        self.echo_seen = true;
        Ok(())
    }

    fn read_table_type(&mut self, nominal_length: u16) -> Result<()> {
        self.expect_length("table_type", nominal_length, 1)?;
        let [code] = self.read_array::<1>("table_type")?;
        let table_type = TableType::from_code(code).ok_or_else(|| {
            self.corrupt(format!("table_type code {:?} is not A, D or S", code as char))
        })?;
        self.set_once("table_type", table_type, |f| &mut f.table_type)
    }

    fn read_age(
        &mut self,
        nominal_length: u16,
        field: &str,
        slot: impl FnOnce(&mut Fields) -> &mut Once<i32>,
    ) -> Result<()> {
        self.expect_length(field, nominal_length, 2)?;
        let value = i32::from(i16::from_le_bytes(self.read_array(field)?));
        if !(0..=self.methuselah).contains(&value) {
            return Err(self.corrupt(format!(
                "{field} {value} outside [0, {}]",
                self.methuselah
            )));
        }
        self.set_once(field, value, slot)
    }

    fn required(&self, field: &str, value: Option<i32>) -> Result<i32> {
        value.ok_or_else(|| self.corrupt(format!("values record precedes {field}")))
    }

    /// Number of values implied by the metadata read so far
    fn deduced_count(&self) -> Result<usize> {
        let table_type = self
            .fields
            .table_type
            .get()
            .ok_or_else(|| self.corrupt("values record precedes table_type"))?;
        let min_age = self.required("min_age", self.fields.min_age.get())?;
        let max_age = self.required("max_age", self.fields.max_age.get())?;
        if max_age < min_age {
            return Err(self.corrupt(format!("max_age {max_age} is below min_age {min_age}")));
        }

        if !table_type.is_select() {
            return Ok(value_count(table_type, min_age, max_age, 0, max_age));
        }

        let select_period = self.required("select_period", self.fields.select_period.get())?;
        let max_select_age = match self.required("max_select_age", self.fields.max_select_age.get())? {
            0 => max_age,
            age => age,
        };
        if max_select_age < min_age || max_age < max_select_age {
            return Err(self.corrupt(format!(
                "max_select_age {max_select_age} outside [{min_age}, {max_age}]"
            )));
        }
        if 1 + max_age - min_age < select_period {
            return Err(self.corrupt(format!(
                "select_period {select_period} exceeds the {} ages in the table",
                1 + max_age - min_age
            )));
        }
        Ok(value_count(table_type, min_age, max_age, select_period, max_select_age))
    }

    fn read_values(&mut self, nominal_length: u16) -> Result<()> {
        if self.values.is_some() {
            return Err(self.corrupt("values are set more than once"));
        }
        let count = self.deduced_count()?;
        let deduced_length = count * std::mem::size_of::<f64>();

        if deduced_length != usize::from(nominal_length) {
            if deduced_length <= usize::from(u16::MAX) {
                return Err(self.corrupt(format!(
                    "values record has length {nominal_length}, but {count} values need {deduced_length}"
                )));
            }
            debug!(
                "table {}: values length {} overrides nominal length {}",
                self.table_number, deduced_length, nominal_length
            );
        }

        let mut bytes = vec![0u8; deduced_length];
        self.data
            .read_exact(&mut bytes)
            .map_err(|e| TableError::from_io(self.path, self.table_number, "values", e))?;
        let values = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            })
            .collect();
        self.values = Some(values);
        Ok(())
    }

    fn skip(&mut self, tag: i16, nominal_length: u16) -> Result<()> {
        trace!(
            "table {}: skipping record tag {} ({} bytes)",
            self.table_number, tag, nominal_length
        );
        let wanted = u64::from(nominal_length);
        let skipped = io::copy(&mut (&mut self.data).take(wanted), &mut io::sink())
            .map_err(|e| TableError::from_io(self.path, self.table_number, "skipped record", e))?;
        if skipped != wanted {
            return Err(self.corrupt(format!(
                "record tag {tag} truncated after {skipped} of {wanted} bytes"
            )));
        }
        Ok(())
    }

    /// Reconcile metadata once the end tag has been read
    fn finish(self) -> Result<ParsedTable> {
        let missing = |field: &str| {
            TableError::internal(
                self.path,
                self.table_number,
                format!("{field} was never set"),
            )
        };
        let table_type = self.fields.table_type.get().ok_or_else(|| missing("table_type"))?;
        let min_age = self.fields.min_age.get().ok_or_else(|| missing("min_age"))?;
        let max_age = self.fields.max_age.get().ok_or_else(|| missing("max_age"))?;
        let mut select_period = self
            .fields
            .select_period
            .get()
            .ok_or_else(|| missing("select_period"))?;
        let mut max_select_age = self
            .fields
            .max_select_age
            .get()
            .ok_or_else(|| missing("max_select_age"))?;
        let values = self
            .values
            .ok_or_else(|| TableError::corrupt(self.path, self.table_number, "no values record"))?;

        // Real files give non-select tables a select period; tolerate it.
        if !table_type.is_select() && select_period != 0 {
            debug!(
                "table {}: ignoring select period {} of {:?} table",
                self.table_number, select_period, table_type
            );
            select_period = 0;
        }
        if max_select_age == 0 {
            max_select_age = max_age;
        }

        let metadata = TableMetadata {
            table_type,
            min_age,
            max_age,
            select_period,
            max_select_age,
        };
        debug!("table {}: parsed {:?}, {} values", self.table_number, metadata, values.len());
        Ok(ParsedTable { metadata, values })
    }
}
