//! # Lookup
//!
//! Sheet layout the lookup relies on:
//!
//! - Row 1 (index 0): free text, ignored
//! - Row 2 (index 1): column labels
//! - Row 3 onward: one student per row, RUT in column A
//!
//! Matching is exact string equality on column A, no normalization of dots, dashes or case.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sheets::RowSource;
use tracing::{debug, info};

use crate::error::AppError::{self, EmptySheet, InvalidRut, NoMatch};

pub const RANGE: &str = "A:AZ";
pub const HEADER_ROW: usize = 1;
pub const FIRST_DATA_ROW: usize = 2;

/// Success body of the lookup endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LookupResult {
    pub data: Vec<Vec<String>>,
    pub headers: Vec<String>,
}

/// Pulls a non-empty `rut` string out of a raw JSON body.
pub fn parse_rut(body: &[u8]) -> Result<String, AppError> {
    let payload: Value = serde_json::from_slice(body).map_err(|_| InvalidRut)?;

    match payload.get("rut") {
        Some(Value::String(rut)) if !rut.is_empty() => Ok(rut.clone()),
        _ => Err(InvalidRut),
    }
}

pub fn match_rows(mut rows: Vec<Vec<String>>, rut: &str) -> Result<LookupResult, AppError> {
    if rows.is_empty() {
        return Err(EmptySheet);
    }

    let data: Vec<Vec<String>> = rows
        .iter()
        .skip(FIRST_DATA_ROW)
        .filter(|row| row.first().is_some_and(|cell| cell == rut))
        .cloned()
        .collect();

    if data.is_empty() {
        return Err(NoMatch(rut.to_string()));
    }

    let headers = if rows.len() > HEADER_ROW {
        rows.swap_remove(HEADER_ROW)
    } else {
        Vec::new()
    };

    Ok(LookupResult { data, headers })
}

pub async fn lookup(source: &dyn RowSource, rut: &str) -> Result<LookupResult, AppError> {
    let rows = source.fetch_rows(RANGE).await?;

    debug!("Fetched {} rows", rows.len());

    let result = match_rows(rows, rut)?;

    info!("Found {} rows for RUT {rut}", result.data.len());

    Ok(result)
}
