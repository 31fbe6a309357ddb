use crate::error::{open_artifact, FileCategory, GripError, Result};
use polars::prelude::*;
use std::io::{Cursor, Read};
use std::path::Path;

/// A string table keyed by the first field of every row
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedTable {
    pub columns: Vec<String>,
    pub index: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A delimited file loaded as all-string columns, with the source line of every row
pub(crate) struct StringFrame {
    pub df: DataFrame,
    /// 1-based line of the header
    pub header_line: usize,
    /// 1-based line of each data row
    pub row_lines: Vec<usize>,
}

impl StringFrame {
    pub fn line_of(&self, row: usize) -> usize {
        self.row_lines.get(row).copied().unwrap_or(self.header_line)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|name| name.trim().trim_matches('"').to_string())
            .collect()
    }

    /// Values of one column, `None` where the field was empty or missing
    pub fn column_values(&self, idx: usize) -> Result<Vec<Option<String>>> {
        let column = &self.df.get_columns()[idx];
        let values = column
            .str()
            .map_err(|e| GripError::DataError(e.to_string()))?
            .into_iter()
            .map(|v| v.map(|s| s.trim().to_string()))
            .collect();
        Ok(values)
    }
}

/// Drops the blanks the simulator writes between a separator and an opening quote,
/// which the CSV reader would otherwise take as the start of an unquoted field
fn tighten_quotes(line: &str, sep: char) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line.trim_start();
    while let Some(i) = rest.find(sep) {
        let next = i + sep.len_utf8();
        out.push_str(&rest[..next]);
        rest = &rest[next..];
        let trimmed = rest.trim_start_matches(' ');
        if trimmed.starts_with('"') {
            rest = trimmed;
        }
    }
    out.push_str(rest);
    out
}

/// Reads a delimited file with polars, every column as a string.
///
/// The first `skip_lines` lines are dropped, the next line is the header and blank
/// lines in the body are ignored.
pub(crate) fn read_string_frame(
    path: &Path,
    category: FileCategory,
    sep: u8,
    skip_lines: usize,
) -> Result<StringFrame> {
    let mut text = String::new();
    open_artifact(path, category)?.read_to_string(&mut text)?;

    let sep_char = char::from(sep);
    let mut lines = text.lines().enumerate().skip(skip_lines);
    let (header_idx, header) = lines
        .next()
        .ok_or_else(|| GripError::malformed(path, skip_lines + 1, "missing header line"))?;

    let mut buffer = tighten_quotes(header, sep_char);
    buffer.push('\n');
    let mut row_lines = Vec::new();
    for (idx, line) in lines.filter(|(_, l)| !l.trim().is_empty()) {
        buffer.push_str(&tighten_quotes(line, sep_char));
        buffer.push('\n');
        row_lines.push(idx + 1);
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(sep)
                .with_quote_char(Some(b'"')),
        )
        .into_reader_with_file_handle(Cursor::new(buffer.into_bytes()))
        .finish()
        .map_err(|e| GripError::malformed(path, header_idx + 1, e.to_string()))?;

    Ok(StringFrame {
        df,
        header_line: header_idx + 1,
        row_lines,
    })
}

/// Reads a CSV file whose first column is a row key.
///
/// The first header field (the key column name) is dropped, so `columns` lines up
/// with each row's values after the key. Empty fields read as empty strings.
///
/// # Errors
/// * `GripError::FileNotFound` - If the file does not exist
/// * `GripError::MalformedFile` - On an empty file, an unterminated quote, a row
///   with more fields than the header or a row that stops before the last column
pub fn read_indexed_csv(
    path: impl AsRef<Path>,
    sep: u8,
    category: FileCategory,
) -> Result<IndexedTable> {
    let path = path.as_ref();
    let frame = read_string_frame(path, category, sep, 0)?;
    let mut names = frame.column_names();
    if names.is_empty() {
        return Err(GripError::malformed(path, frame.header_line, "missing header line"));
    }
    let columns = names.split_off(1);

    let values = (0..=columns.len())
        .map(|idx| frame.column_values(idx))
        .collect::<Result<Vec<_>>>()?;

    let height = frame.df.height();
    let mut index = Vec::with_capacity(height);
    let mut rows = Vec::with_capacity(height);
    for row in 0..height {
        if values.len() > 1 && values[values.len() - 1][row].is_none() {
            return Err(GripError::malformed(
                path,
                frame.line_of(row),
                format!("expected {} fields", columns.len() + 1),
            ));
        }
        let mut fields = values
            .iter()
            .map(|column| column[row].clone().unwrap_or_default());
        index.push(fields.next().unwrap_or_default());
        rows.push(fields.collect());
    }

    Ok(IndexedTable {
        columns,
        index,
        rows,
    })
}

impl IndexedTable {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn row_of(&self, key: &str) -> Option<usize> {
        self.index.iter().position(|k| k == key)
    }

    fn column_of(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| GripError::Lookup(format!("no column {}", column)))
    }

    /// Raw string value at (row number, column name)
    pub fn value(&self, row: usize, column: &str) -> Result<&str> {
        let col = self.column_of(column)?;
        self.rows
            .get(row)
            .map(|r| r[col].as_str())
            .ok_or_else(|| GripError::Lookup(format!("no row {}", row)))
    }

    /// Raw string value at (row key, column name)
    pub fn get_str(&self, key: &str, column: &str) -> Result<&str> {
        let row = self
            .row_of(key)
            .ok_or_else(|| GripError::Lookup(format!("no row {}", key)))?;
        self.value(row, column)
    }

    pub fn get_f64(&self, row: usize, column: &str) -> Result<f64> {
        let raw = self.value(row, column)?;
        raw.trim()
            .parse()
            .map_err(|_| GripError::invalid_parameter(column, raw, "expected a number"))
    }

    pub fn get_u64(&self, row: usize, column: &str) -> Result<u64> {
        let raw = self.value(row, column)?;
        raw.trim()
            .parse()
            .map_err(|_| GripError::invalid_parameter(column, raw, "expected a non-negative integer"))
    }

    /// Booleans are written by the simulator as `true`/`false` in any case
    pub fn get_bool(&self, row: usize, column: &str) -> Result<bool> {
        let raw = self.value(row, column)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(GripError::invalid_parameter(column, raw, "expected true or false")),
        }
    }
}
