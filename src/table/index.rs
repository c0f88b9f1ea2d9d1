//! Index file scanning
//!
//! An index file is a flat run of 58-byte records:
//!
//! | bytes      | field                                  |
//! |------------|----------------------------------------|
//! | `[0, 4)`   | table number, `i32` little-endian      |
//! | `[4, 54)`  | table name, informational only         |
//! | `[54, 58)` | offset into the data file, `i32` LE    |
//!
//! Records are not sorted by table number, so the scan is linear and the
//! first exact match wins.

use std::io::{self, Read};
use std::path::Path;

use log::debug;

use crate::error::{Result, TableError};

/// Width of one index record
pub const INDEX_RECORD_LEN: usize = 58;

const NAME_START: usize = 4;
const NAME_END: usize = 54;

/// Where a table's records begin in the data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub table_number: i32,
    pub name: String,
    pub offset: u64,
}

/// Scan `index` for `table_number` and return its entry
///
/// `path` is used only to label errors.
pub fn locate<R: Read>(mut index: R, path: &Path, table_number: i32) -> Result<IndexEntry> {
    if table_number <= 0 {
        return Err(TableError::Configuration {
            path: path.to_path_buf(),
            table_number,
        });
    }

    let mut record = [0u8; INDEX_RECORD_LEN];
    let mut position: u64 = 0;

    loop {
        let filled = read_record(&mut index, &mut record)
            .map_err(|e| TableError::from_io(path, table_number, "index record", e))?;
        if filled == 0 {
            return Err(TableError::not_found(
                path,
                table_number,
                format!("no index record among {position} scanned"),
            ));
        }
        if filled < INDEX_RECORD_LEN {
            return Err(TableError::corrupt(
                path,
                table_number,
                format!(
                    "index record {position} holds {filled} of {INDEX_RECORD_LEN} bytes"
                ),
            ));
        }

        if read_i32(&record, 0) == table_number {
            let raw_offset = read_i32(&record, NAME_END);
            let offset = u64::try_from(raw_offset).map_err(|_| {
                TableError::corrupt(
                    path,
                    table_number,
                    format!("index record {position} has negative data offset {raw_offset}"),
                )
            })?;
            let name = decode_name(&record[NAME_START..NAME_END]);
            debug!(
                "located table {} ('{}') at data offset {} (index record {})",
                table_number, name, offset, position
            );
            return Ok(IndexEntry {
                table_number,
                name,
                offset,
            });
        }
        position += 1;
    }
}

/// Fill `buf` as far as the stream allows, returning how many bytes arrived
fn read_record<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn read_i32(buf: &[u8], offset: usize) -> i32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    i32::from_le_bytes(bytes)
}

/// Names are NUL- or space-padded single-byte text
fn decode_name(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    raw[..end].iter().map(|&b| b as char).collect::<String>().trim().to_string()
}
