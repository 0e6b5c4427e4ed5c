pub mod db;
pub mod migrations;

pub use db::{Database, DEFAULT_BUSY_TIMEOUT};

use rusqlite::types::Type;
use rusqlite::Row;
use std::str::FromStr;

use crate::error::Error;

/// Read a reference column, mapping malformed or nil UUIDs to a conversion
/// error instead of panicking.
pub fn ref_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = Error>,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a JSON-encoded column.
pub fn json_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
