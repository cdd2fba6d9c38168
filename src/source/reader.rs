use csv::ReaderBuilder;
use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufReader},
    path::Path,
};
use tracing::{debug, info};

use super::{Dataset, Record, Value};
use crate::error::{LoadError, Result};

/// Cell contents treated as missing, on top of the empty string.
const NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Str,
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || NA_VALUES.contains(&cell)
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Pick one type for a whole column from its non-missing cells.
fn infer_kind(cells: &[&Option<String>]) -> ColumnKind {
    let present: Vec<&str> = cells.iter().filter_map(|c| c.as_deref()).collect();
    let has_missing = present.len() < cells.len();

    if !has_missing && present.iter().all(|s| s.trim().parse::<i64>().is_ok()) {
        ColumnKind::Int
    } else if present.iter().all(|s| s.trim().parse::<f64>().is_ok()) {
        ColumnKind::Float
    } else if present.iter().all(|s| parse_bool(s).is_some()) {
        ColumnKind::Bool
    } else {
        ColumnKind::Str
    }
}

fn typed_value(cell: &Option<String>, kind: ColumnKind) -> Value {
    let Some(s) = cell else {
        return Value::Null;
    };
    match kind {
        ColumnKind::Int => s.trim().parse().map(Value::Int).unwrap_or(Value::Null),
        ColumnKind::Float => s.trim().parse().map(Value::Float).unwrap_or(Value::Null),
        ColumnKind::Bool => parse_bool(s).map(Value::Bool).unwrap_or(Value::Null),
        ColumnKind::Str => Value::Str(s.clone()),
    }
}

/// Strip a UTF-8 BOM from the first header and suffix repeated names
/// with `.1`, `.2`, ... so every column key is unique.
fn clean_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();
    for (i, h) in raw.enumerate() {
        let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
        let mut name = h.to_string();
        while let Some(n) = seen.get_mut(&name) {
            *n += 1;
            name = format!("{}.{}", h, n);
        }
        seen.insert(name.clone(), 0);
        out.push(name);
    }
    out
}

/// Read the CSV at `path` into a [`Dataset`].
///
/// The first row is the header. Short rows are padded with nulls; a row
/// longer than the header is an error. Each column is typed once over the
/// whole file (integer, float, boolean, else string).
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Source {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })?;

    let source_err = |message: String| LoadError::Source {
        path: path.to_path_buf(),
        message,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let columns = clean_headers(
        rdr.headers()
            .map_err(|e| source_err(format!("bad header: {e}")))?
            .iter(),
    );
    if columns.is_empty() {
        return Err(source_err("no columns to parse".to_string()));
    }
    debug!(columns = ?columns, "parsed header");

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| source_err(format!("record {}: {e}", idx + 1)))?;
        if record.len() > columns.len() {
            return Err(source_err(format!(
                "record {} has {} fields, expected {}",
                idx + 1,
                record.len(),
                columns.len()
            )));
        }
        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|cell| (!is_missing(cell)).then(|| cell.to_string()))
            .collect();
        row.resize(columns.len(), None);
        rows.push(row);
    }

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|c| {
            let cells: Vec<&Option<String>> = rows.iter().map(|r| &r[c]).collect();
            infer_kind(&cells)
        })
        .collect();

    let records = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .zip(row.iter().zip(&kinds))
                .map(|(name, (cell, kind))| (name.clone(), typed_value(cell, *kind)))
                .collect::<Record>()
        })
        .collect::<Vec<_>>();

    info!(rows = records.len(), columns = columns.len(), "read source file");
    Ok(Dataset { columns, records })
}
