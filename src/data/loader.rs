use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::{DataError, Result};
use super::model::{Record, Table, Value};

/// Default source file of the dashboard.
pub const DEFAULT_PATH: &str = "Bankloan.csv";

/// Cell contents read as missing, on top of the empty string.
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Text encoding of a delimited file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    Utf8,
    /// UTF-8 with an optional leading byte-order mark.
    #[default]
    Utf8Sig,
}

impl FromStr for Encoding {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "utf-8-sig" | "utf8-sig" => Ok(Encoding::Utf8Sig),
            _ => Err(DataError::UnsupportedEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => f.write_str("utf-8"),
            Encoding::Utf8Sig => f.write_str("utf-8-sig"),
        }
    }
}

/// Where and how to read the delimited source file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub path: PathBuf,
    pub delimiter: u8,
    pub encoding: Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            delimiter: b';',
            encoding: Encoding::Utf8Sig,
        }
    }
}

impl LoadOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read a delimited text file eagerly into a [`Table`].
///
/// Column names come from the header row. A missing file is reported as
/// [`DataError::NotFound`] and no partial table is produced.
pub fn load(options: &LoadOptions) -> Result<Table> {
    let text = read_text(&options.path, options.encoding)?;
    let table = parse_delimited(&text, options.delimiter)?;
    info!(
        "loaded {} rows x {} columns from {}",
        table.len(),
        table.column_names.len(),
        options.path.display()
    );
    Ok(table)
}

/// Load the dashboard source. JSON and Parquet files are recognized by
/// extension; anything else is delimited text read with `options`.
pub fn load_source(options: &LoadOptions) -> Result<Table> {
    let path = options.path.as_path();
    match extension(path).as_str() {
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        _ => load(options),
    }
}

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – `;`-separated text, UTF-8 with optional BOM
/// * `.tsv`          – tab-separated text
/// * `.json`         – `[{ "age": 41, "income": 176.0, ... }, ...]`
/// * `.parquet`      – flat Parquet file, one column per field
pub fn load_file(path: &Path) -> Result<Table> {
    match extension(path).as_str() {
        "csv" | "txt" => load(&LoadOptions::new(path)),
        "tsv" => load(&LoadOptions {
            delimiter: b'\t',
            ..LoadOptions::new(path)
        }),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(DataError::UnsupportedFormat(other.to_string())),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn open_error(path: &Path, source: std::io::Error) -> DataError {
    if source.kind() == std::io::ErrorKind::NotFound {
        DataError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        DataError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn read_text(path: &Path, encoding: Encoding) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| open_error(path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| {
        DataError::Malformed(format!(
            "{} is not valid UTF-8 (byte {})",
            path.display(),
            e.utf8_error().valid_up_to()
        ))
    })?;
    Ok(match encoding {
        Encoding::Utf8Sig => match text.strip_prefix('\u{feff}') {
            Some(rest) => rest.to_string(),
            None => text,
        },
        Encoding::Utf8 => text,
    })
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Parse delimited text with a header row into a [`Table`].
pub fn parse_delimited(text: &str, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let column_names: Vec<String> = reader
        .headers()
        .map_err(|source| DataError::Csv { row: 0, source })?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|source| DataError::Csv {
            row: row_no,
            source,
        })?;

        let fields = column_names
            .iter()
            .zip(record.iter())
            .map(|(col, raw)| (col.clone(), guess_value(raw)))
            .collect();

        records.push(Record { fields });
    }

    debug!("parsed {} delimited records", records.len());
    Ok(Table::new(column_names, records))
}

/// Type a raw text cell: NA markers → null, then integer, float, bool, text.
pub fn guess_value(s: &str) -> Value {
    if s.is_empty() || NA_MARKERS.contains(&s) {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    match s {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "age": 41, "ed": 3, "income": 176.0, "default": "1" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Table> {
    let text = read_text(path, Encoding::Utf8Sig)?;
    let table = parse_json(&text)?;
    info!("loaded {} JSON records from {}", table.len(), path.display());
    Ok(table)
}

pub fn parse_json(text: &str) -> Result<Table> {
    let root: JsonValue = serde_json::from_str(text)?;

    let rows = root
        .as_array()
        .ok_or_else(|| DataError::Malformed("expected top-level JSON array".into()))?;

    // Columns in the order keys are first seen; objects keep their key order.
    let mut column_names: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .ok_or_else(|| DataError::Malformed(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !column_names.contains(key) {
                column_names.push(key.clone());
            }
        }
        records.push(Record {
            fields: obj
                .iter()
                .map(|(key, val)| (key.clone(), json_to_value(val)))
                .collect(),
        });
    }

    Ok(Table::new(column_names, records))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file: every top-level column becomes a table column.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).map_err(|e| open_error(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let columns = column_names
            .iter()
            .zip(batch.columns())
            .map(|(name, col)| normalize_column(name, col))
            .collect::<Result<Vec<_>>>()?;
        for row in 0..batch.num_rows() {
            let fields = column_names
                .iter()
                .zip(&columns)
                .map(|(name, col)| (name.clone(), extract_value(col, row)))
                .collect();
            records.push(Record { fields });
        }
    }

    info!("loaded {} parquet rows from {}", records.len(), path.display());
    Ok(Table::new(column_names, records))
}

/// Cast a column to one of the types [`extract_value`] reads.
///
/// Decimals become `Float64`; dictionaries are unpacked to their value type;
/// string views and temporal columns become `Utf8`. Nested and binary
/// columns are rejected.
fn normalize_column(name: &str, col: &ArrayRef) -> Result<ArrayRef> {
    let target = match col.data_type() {
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64
        | DataType::Boolean
        | DataType::Null => return Ok(col.clone()),
        DataType::Float16 | DataType::Decimal128(..) | DataType::Decimal256(..) => {
            DataType::Float64
        }
        DataType::Dictionary(_, values) => {
            let unpacked = cast(col.as_ref(), values)?;
            return normalize_column(name, &unpacked);
        }
        DataType::Utf8View
        | DataType::Date32
        | DataType::Date64
        | DataType::Timestamp(..)
        | DataType::Time32(_)
        | DataType::Time64(_) => DataType::Utf8,
        other => {
            return Err(DataError::Malformed(format!(
                "column '{name}' has unsupported type {other}"
            )))
        }
    };
    Ok(cast(col.as_ref(), &target)?)
}

/// Extract a single cell from a normalized Arrow column at a given row.
fn extract_value(col: &ArrayRef, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    match col.data_type() {
        DataType::Utf8 => Value::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => Value::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => Value::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => Value::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => Value::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Value::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => Value::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => Value::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or(Value::Float(v as f64), Value::Integer)
        }
        DataType::Float32 => Value::Float(col.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => Value::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Value::Bool(col.as_boolean().value(row)),
        _ => Value::Null,
    }
}
