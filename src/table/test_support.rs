//! Encoders for building SOA index and data streams in tests

use std::fs;
use std::path::{Path, PathBuf};

use super::geometry::{TableMetadata, TableType};
use super::index::INDEX_RECORD_LEN;
use super::parser::{
    TAG_END, TAG_MAX_AGE, TAG_MAX_SELECT_AGE, TAG_MIN_AGE, TAG_SELECT_PERIOD, TAG_TABLE_NUMBER,
    TAG_TABLE_TYPE, TAG_VALUES,
};

/// One 58-byte index record
pub fn index_record(table_number: i32, name: &str, offset: i32) -> Vec<u8> {
    let mut record = vec![0u8; INDEX_RECORD_LEN];
    record[0..4].copy_from_slice(&table_number.to_le_bytes());
    let name = name.as_bytes();
    let len = name.len().min(50);
    record[4..4 + len].copy_from_slice(&name[..len]);
    record[54..58].copy_from_slice(&offset.to_le_bytes());
    record
}

/// Record-by-record data stream builder
#[derive(Debug, Default)]
pub struct DataBuilder {
    bytes: Vec<u8>,
}

impl DataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, tag: i16, payload: Vec<u8>) -> Self {
        self.bytes.extend_from_slice(&tag.to_le_bytes());
        self.bytes.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        self.bytes.extend(payload);
        self
    }

    pub fn table_number(self, number: i32) -> Self {
        self.raw(TAG_TABLE_NUMBER, number.to_le_bytes().to_vec())
    }

    pub fn table_type(self, code: u8) -> Self {
        self.raw(TAG_TABLE_TYPE, vec![code])
    }

    pub fn age(self, tag: i16, value: i16) -> Self {
        self.raw(tag, value.to_le_bytes().to_vec())
    }

    /// Values record whose length field wraps the way the original producer's did
    pub fn values(self, values: &[f64]) -> Self {
        let nominal = (values.len() * 8) as u16;
        self.values_with_length(values, nominal)
    }

    pub fn values_with_length(mut self, values: &[f64], nominal_length: u16) -> Self {
        self.bytes.extend_from_slice(&TAG_VALUES.to_le_bytes());
        self.bytes.extend_from_slice(&nominal_length.to_le_bytes());
        for value in values {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        self
    }

    pub fn end(mut self) -> Self {
        self.bytes.extend_from_slice(&TAG_END.to_le_bytes());
        self.bytes.extend_from_slice(&0u16.to_le_bytes());
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// A complete table as a well-behaved producer would write it
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub number: i32,
    pub name: String,
    pub code: u8,
    pub min_age: i16,
    pub max_age: i16,
    pub select_period: i16,
    pub max_select_age: i16,
    pub values: Vec<f64>,
}

impl TableSpec {
    pub fn age_banded(number: i32, min_age: i16, max_age: i16, values: Vec<f64>) -> Self {
        Self {
            number,
            name: format!("Age table {number}"),
            code: b'A',
            min_age,
            max_age,
            select_period: 0,
            max_select_age: 0,
            values,
        }
    }

    pub fn duration_banded(number: i32, min_age: i16, max_age: i16, values: Vec<f64>) -> Self {
        Self {
            code: b'D',
            name: format!("Duration table {number}"),
            ..Self::age_banded(number, min_age, max_age, values)
        }
    }

    pub fn select(
        number: i32,
        min_age: i16,
        max_age: i16,
        select_period: i16,
        max_select_age: i16,
        values: Vec<f64>,
    ) -> Self {
        Self {
            number,
            name: format!("Select table {number}"),
            code: b'S',
            min_age,
            max_age,
            select_period,
            max_select_age,
            values,
        }
    }

    /// Metadata the parser is expected to produce
    pub fn metadata(&self) -> TableMetadata {
        let table_type = TableType::from_code(self.code).expect("valid test table type");
        let max_age = i32::from(self.max_age);
        TableMetadata {
            table_type,
            min_age: i32::from(self.min_age),
            max_age,
            select_period: if table_type.is_select() {
                i32::from(self.select_period)
            } else {
                0
            },
            max_select_age: match self.max_select_age {
                0 => max_age,
                age => i32::from(age),
            },
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        DataBuilder::new()
            .raw(1, self.name.as_bytes().to_vec())
            .table_number(self.number)
            .table_type(self.code)
            .age(TAG_MIN_AGE, self.min_age)
            .age(TAG_MAX_AGE, self.max_age)
            .age(TAG_SELECT_PERIOD, self.select_period)
            .age(TAG_MAX_SELECT_AGE, self.max_select_age)
            .values(&self.values)
            .end()
            .build()
    }
}

/// Encode tables back to back, returning the index and data streams
pub fn encode_family(tables: &[TableSpec]) -> (Vec<u8>, Vec<u8>) {
    let mut index = Vec::new();
    let mut data = Vec::new();
    for table in tables {
        index.extend(index_record(table.number, &table.name, data.len() as i32));
        data.extend(table.encode());
    }
    (index, data)
}

/// Write `<dir>/<stem>.ndx` and `<dir>/<stem>.dat`, returning the base path
pub fn write_family(dir: &Path, stem: &str, tables: &[TableSpec]) -> PathBuf {
    let base = dir.join(stem);
    let (index, data) = encode_family(tables);
    fs::write(base.with_extension("ndx"), index).expect("write index file");
    fs::write(base.with_extension("dat"), data).expect("write data file");
    base
}
