use std::path::Path;

use chrono::NaiveDateTime;
use csv::StringRecord;

use super::model::{NormalizedSeries, RawColumn, RawTable, Value};
use super::time::parse_timestamp;
use crate::config::{LoaderOptions, VariableStrategy};
use crate::error::{LoaderError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and normalize a file. Dispatch by extension.
///
/// Only `.csv` is supported; the extension check is case-insensitive.
pub fn load_file(path: &Path, options: &LoaderOptions) -> Result<NormalizedSeries> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let bytes = std::fs::read(path)?;
            load_bytes(&bytes, options)
        }
        other => Err(LoaderError::UnsupportedFormat(other.to_string())),
    }
}

/// Run the whole upload pipeline on an in-memory payload.
pub fn load_bytes(bytes: &[u8], options: &LoaderOptions) -> Result<NormalizedSeries> {
    let raw = parse_with(bytes, options)?;
    log::info!(
        "Parsed {} rows x {} columns {:?}",
        raw.height(),
        raw.width(),
        raw.column_names()
    );
    normalize_with(raw, options)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a comma-separated payload with a header row.
pub fn parse(bytes: &[u8]) -> Result<RawTable> {
    parse_with(bytes, &LoaderOptions::default())
}

/// Parse a delimited payload with a header row.
///
/// Blank lines are skipped and short rows are padded with empty cells.
/// A row with more cells than the header is an error.
pub fn parse_with(bytes: &[u8], options: &LoaderOptions) -> Result<RawTable> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let delimiter = options.delimiter_byte();
    if let Some(line) = unterminated_quote_line(bytes, delimiter) {
        return Err(LoaderError::Parse(format!(
            "unterminated quoted field starting on line {line}"
        )));
    }
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(LoaderError::MissingHeader);
    }
    let names = header_names(&headers);
    let width = names.len();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); width];
    for result in reader.records() {
        let record = result?;
        if record.len() > width {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(LoaderError::Parse(format!(
                "line {line} has {} fields, header has {width}",
                record.len()
            )));
        }
        for (col, column_cells) in cells.iter_mut().enumerate() {
            column_cells.push(record.get(col).unwrap_or("").to_string());
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| RawColumn::new(name, values))
        .collect();
    RawTable::from_columns(columns)
}

/// Line on which a quoted field opens without ever closing, if any.
///
/// The csv reader accepts such input and folds the rest of the payload into
/// one cell. A quote only opens a field when it is the field's first byte;
/// inside a quoted field `""` is an escaped quote.
fn unterminated_quote_line(bytes: &[u8], delimiter: u8) -> Option<u64> {
    let mut in_quotes = false;
    let mut field_start = true;
    let mut line = 1;
    let mut opened_on = 1;
    let mut iter = bytes.iter().peekable();
    while let Some(&b) = iter.next() {
        if b == b'\n' {
            line += 1;
        }
        if in_quotes {
            if b == b'"' {
                if iter.peek() == Some(&&b'"') {
                    iter.next();
                } else {
                    in_quotes = false;
                }
            }
        } else if field_start && b == b'"' {
            in_quotes = true;
            field_start = false;
            opened_on = line;
        } else {
            field_start = b == delimiter || b == b'\n' || b == b'\r';
        }
    }
    in_quotes.then_some(opened_on)
}

/// Make header names usable as keys: blank names become `Unnamed: <i>`,
/// repeated names get `.1`, `.2`, ... suffixes.
fn header_names(headers: &StringRecord) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(headers.len());
    for (i, header) in headers.iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            header.to_string()
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        names.push(name);
    }
    names
}

// ---------------------------------------------------------------------------
// Column selection
// ---------------------------------------------------------------------------

/// Columns that could serve as the measured variable, in header order.
///
/// The time column is never a candidate. With `numeric_only`, only columns
/// whose cells are all numbers (or missing) are returned. Fails with
/// [`LoaderError::NoNumericColumn`] when nothing qualifies.
pub fn select_variable(raw: &RawTable, numeric_only: bool) -> Result<Vec<String>> {
    select_variable_with(raw, numeric_only, &LoaderOptions::default())
}

pub fn select_variable_with(
    raw: &RawTable,
    numeric_only: bool,
    options: &LoaderOptions,
) -> Result<Vec<String>> {
    let candidates: Vec<String> = raw
        .columns()
        .iter()
        .filter(|c| c.name != options.time_column)
        .filter(|c| !numeric_only || c.is_numeric())
        .map(|c| c.name.clone())
        .collect();

    if candidates.is_empty() {
        return Err(LoaderError::NoNumericColumn);
    }
    Ok(candidates)
}

/// Index of the column to use as the measured variable, if any.
fn variable_position(
    raw: &RawTable,
    time_pos: Option<usize>,
    options: &LoaderOptions,
) -> Result<Option<usize>> {
    let position_of = |name: &str| raw.columns().iter().position(|c| c.name == name);

    match &options.strategy {
        VariableStrategy::FirstColumn => Ok(match time_pos {
            Some(t) => (0..raw.width()).find(|&i| i != t),
            None => (raw.width() > 0).then_some(0),
        }),
        VariableStrategy::FirstNumeric => {
            let candidates = select_variable_with(raw, true, options)?;
            Ok(position_of(&candidates[0]))
        }
        VariableStrategy::Column(name) => {
            if *name == options.time_column {
                return Err(LoaderError::ColumnNotFound(name.clone()));
            }
            position_of(name)
                .map(Some)
                .ok_or_else(|| LoaderError::ColumnNotFound(name.clone()))
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize with the default options: `Time` index, first data column
/// renamed to `variable`.
pub fn normalize(raw: RawTable) -> Result<NormalizedSeries> {
    normalize_with(raw, &LoaderOptions::default())
}

/// Turn a parsed table into a single-variable series.
///
/// Row order is preserved; the time index is never sorted.
pub fn normalize_with(raw: RawTable, options: &LoaderOptions) -> Result<NormalizedSeries> {
    let time_pos = raw
        .columns()
        .iter()
        .position(|c| c.name == options.time_column);
    let var_pos = variable_position(&raw, time_pos, options)?;

    let time_index = match time_pos {
        Some(t) => Some(parse_time_column(&raw.columns()[t])?),
        None => None,
    };

    let mut source_column = None;
    let mut values = Vec::new();
    let mut extra_columns = Vec::new();
    for (i, column) in raw.into_columns().into_iter().enumerate() {
        if Some(i) == time_pos {
            continue;
        }
        if Some(i) == var_pos {
            values = column.values.iter().map(|cell| Value::guess(cell)).collect();
            source_column = Some(column.name);
        } else {
            extra_columns.push(column);
        }
    }

    match &source_column {
        Some(name) => log::debug!(
            "Column '{name}' selected as '{}'",
            options.canonical_name
        ),
        None => log::warn!("Only a time column present, no measured variable"),
    }
    if !extra_columns.is_empty() {
        log::warn!(
            "Keeping {} extra column(s) {:?} out of statistics and filtering",
            extra_columns.len(),
            extra_columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
        );
    }

    Ok(NormalizedSeries {
        variable_name: source_column.as_ref().map(|_| options.canonical_name.clone()),
        source_column,
        values,
        time_index,
        extra_columns,
    })
}

fn parse_time_column(column: &RawColumn) -> Result<Vec<NaiveDateTime>> {
    column
        .values
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            parse_timestamp(cell).ok_or_else(|| LoaderError::TimeParse {
                row: i + 1,
                value: cell.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> Result<NormalizedSeries> {
        load_bytes(csv.as_bytes(), &LoaderOptions::default())
    }

    #[test]
    fn parse_keeps_header_order() {
        let raw = parse(b"b,a,c\n1,2,3\n4,5,6\n").unwrap();
        assert_eq!(raw.column_names(), vec!["b", "a", "c"]);
        assert_eq!(raw.height(), 2);
        assert_eq!(raw.column("a").unwrap().values, vec!["2", "5"]);
    }

    #[test]
    fn empty_payload_has_no_header() {
        assert!(matches!(parse(b""), Err(LoaderError::MissingHeader)));
        assert!(matches!(parse(b"\n\n"), Err(LoaderError::MissingHeader)));
    }

    #[test]
    fn header_only_gives_zero_rows() {
        let raw = parse(b"Time,Temp\n").unwrap();
        assert_eq!(raw.width(), 2);
        assert_eq!(raw.height(), 0);
    }

    #[test]
    fn bom_and_blank_lines_are_ignored() {
        let raw = parse(b"\xEF\xBB\xBFTemp\n1\n\n2\n").unwrap();
        assert_eq!(raw.column_names(), vec!["Temp"]);
        assert_eq!(raw.column("Temp").unwrap().values, vec!["1", "2"]);
    }

    #[test]
    fn short_rows_are_padded_long_rows_rejected() {
        let raw = parse(b"a,b,c\n1,2\n").unwrap();
        assert_eq!(raw.column("c").unwrap().values, vec![""]);

        assert!(matches!(parse(b"a,b\n1,2,3\n"), Err(LoaderError::Parse(_))));
    }

    #[test]
    fn unterminated_quote_is_a_parse_error() {
        match parse(b"Time,Temp\n2024-01-01,\"1\n2024-01-02,2\n") {
            Err(LoaderError::Parse(msg)) => assert!(msg.contains("line 2"), "{msg}"),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn closed_and_embedded_quotes_are_accepted() {
        let raw = parse(b"Name,Note\n\"Ana, M\",\"said \"\"hi\"\"\"\nBo,5\" screen\n").unwrap();
        assert_eq!(raw.height(), 2);
        assert_eq!(raw.column("Name").unwrap().values, vec!["Ana, M", "Bo"]);
        assert_eq!(
            raw.column("Note").unwrap().values,
            vec!["said \"hi\"", "5\" screen"]
        );
    }

    #[test]
    fn long_row_error_reports_file_line() {
        match parse(b"a,b\n\n1,2\n\n1,2,3\n") {
            Err(LoaderError::Parse(msg)) => assert!(msg.starts_with("line 5 "), "{msg}"),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        assert!(matches!(parse(b"a\n\xff\xfe\n"), Err(LoaderError::Parse(_))));
    }

    #[test]
    fn blank_and_duplicate_headers_are_renamed() {
        let raw = parse(b",x,x,x\n1,2,3,4\n").unwrap();
        assert_eq!(raw.column_names(), vec!["Unnamed: 0", "x", "x.1", "x.2"]);
    }

    #[test]
    fn semicolon_delimiter() {
        let opts = LoaderOptions {
            delimiter: ';',
            ..Default::default()
        };
        let series = load_bytes(b"Time;Temp\n2024-01-01;1,5\n", &opts).unwrap();
        assert_eq!(series.values, vec![Value::Text("1,5".into())]);
    }

    #[test]
    fn time_then_first_other_column() {
        let series = load("Time,Temp,Humidity\n2024-01-01 00:00,20.5,60\n2024-01-01 01:00,21,61\n")
            .unwrap();
        assert_eq!(series.variable_name.as_deref(), Some("variable"));
        assert_eq!(series.source_column.as_deref(), Some("Temp"));
        assert_eq!(series.values, vec![Value::Number(20.5), Value::Number(21.0)]);
        assert_eq!(series.time_index.as_ref().unwrap().len(), 2);
        assert_eq!(series.extra_columns.len(), 1);
        assert_eq!(series.extra_columns[0].name, "Humidity");
    }

    #[test]
    fn time_column_need_not_come_first() {
        let series = load("Temp,Time\n1,2024-01-01\n").unwrap();
        assert_eq!(series.source_column.as_deref(), Some("Temp"));
        assert!(series.time_index.is_some());
    }

    #[test]
    fn without_time_first_column_is_taken_whatever_its_type() {
        let series = load("SensorA,SensorB\nabc,1\ndef,2\n").unwrap();
        assert_eq!(series.source_column.as_deref(), Some("SensorA"));
        assert_eq!(series.values[0], Value::Text("abc".into()));
        assert!(series.time_index.is_none());
        assert!(matches!(
            series.numeric_values(),
            Err(LoaderError::TypeCoercion { row: 1, .. })
        ));
    }

    #[test]
    fn time_match_is_case_sensitive() {
        let series = load("time,Temp\n2024-01-01,1\n").unwrap();
        assert_eq!(series.source_column.as_deref(), Some("time"));
        assert!(series.time_index.is_none());
    }

    #[test]
    fn only_time_column_has_no_variable() {
        let series = load("Time\n2024-01-01\n2024-01-02\n").unwrap();
        assert!(!series.has_variable());
        assert_eq!(series.len(), 2);
        assert!(matches!(
            series.numeric_values(),
            Err(LoaderError::NoNumericColumn)
        ));
    }

    #[test]
    fn bad_timestamp_is_reported_with_row() {
        match load("Time,Temp\n2024-01-01,1\nnot a date,2\n") {
            Err(LoaderError::TimeParse { row, value }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "not a date");
            }
            other => panic!("expected TimeParse, got {other:?}"),
        }
    }

    #[test]
    fn time_order_is_preserved() {
        let series = load("Time,Temp\n2024-01-03,3\n2024-01-01,1\n2024-01-02,2\n").unwrap();
        let index = series.time_index.unwrap();
        assert!(index[0] > index[1]);
        assert_eq!(
            series.values,
            vec![Value::Number(3.0), Value::Number(1.0), Value::Number(2.0)]
        );
    }

    #[test]
    fn select_variable_numeric_only() {
        let raw = parse(b"Time,Name,Temp,Hum\n2024-01-01,Ana,1,2\n").unwrap();
        assert_eq!(select_variable(&raw, true).unwrap(), vec!["Temp", "Hum"]);
        assert_eq!(
            select_variable(&raw, false).unwrap(),
            vec!["Name", "Temp", "Hum"]
        );
    }

    #[test]
    fn select_variable_without_numbers_fails() {
        let raw = parse("Name,City\nAna,Medellín\n".as_bytes()).unwrap();
        assert!(matches!(
            select_variable(&raw, true),
            Err(LoaderError::NoNumericColumn)
        ));
    }

    #[test]
    fn first_numeric_strategy_skips_text() {
        let opts = LoaderOptions {
            strategy: VariableStrategy::FirstNumeric,
            ..Default::default()
        };
        let series = load_bytes(b"Time,Name,Temp\n2024-01-01,Ana,7\n", &opts).unwrap();
        assert_eq!(series.source_column.as_deref(), Some("Temp"));
        assert_eq!(series.extra_columns[0].name, "Name");
    }

    #[test]
    fn explicit_column_strategy() {
        let opts = LoaderOptions {
            strategy: VariableStrategy::Column("Hum".into()),
            ..Default::default()
        };
        let series = load_bytes(b"Temp,Hum\n1,2\n", &opts).unwrap();
        assert_eq!(series.source_column.as_deref(), Some("Hum"));
        assert_eq!(series.values, vec![Value::Number(2.0)]);

        let opts = LoaderOptions {
            strategy: VariableStrategy::Column("Missing".into()),
            ..Default::default()
        };
        assert!(matches!(
            load_bytes(b"Temp,Hum\n1,2\n", &opts),
            Err(LoaderError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("data.parquet"), &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, LoaderError::UnsupportedFormat(ext) if ext == "parquet"));
    }
}
