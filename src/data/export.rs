use std::io::Write;
use std::path::Path;

use super::model::NormalizedSeries;
use super::time::format_timestamp;
use crate::error::Result;

/// Write a series as CSV: `Time,<variable>` when it has a time index,
/// `<variable>` alone otherwise. Extra columns are not written.
pub fn write_csv<W: Write>(series: &NormalizedSeries, time_column: &str, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header: Vec<&str> = Vec::with_capacity(2);
    if series.time_index.is_some() {
        header.push(time_column);
    }
    if let Some(name) = &series.variable_name {
        header.push(name);
    }
    writer.write_record(&header)?;

    for row in 0..series.len() {
        let mut record: Vec<String> = Vec::with_capacity(2);
        if let Some(index) = &series.time_index {
            record.push(format_timestamp(&index[row]));
        }
        if series.has_variable() {
            record.push(series.values[row].to_string());
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// The export as UTF-8 bytes.
pub fn to_csv_bytes(series: &NormalizedSeries, time_column: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(series, time_column, &mut buf)?;
    Ok(buf)
}

/// Write the export to a file, replacing it if it exists.
pub fn write_csv_file(series: &NormalizedSeries, time_column: &str, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(series, time_column, std::io::BufWriter::new(file))?;
    log::info!("Wrote {} rows to {}", series.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;
    use crate::data::time::parse_timestamp;

    #[test]
    fn with_time_index() {
        let series = NormalizedSeries {
            variable_name: Some("variable".into()),
            source_column: Some("Temp".into()),
            values: vec![Value::Number(20.5), Value::Missing],
            time_index: Some(vec![
                parse_timestamp("2024-01-01 00:00:00").unwrap(),
                parse_timestamp("2024-01-01 01:00:00").unwrap(),
            ]),
            extra_columns: Vec::new(),
        };
        let text = String::from_utf8(to_csv_bytes(&series, "Time").unwrap()).unwrap();
        assert_eq!(
            text,
            "Time,variable\n2024-01-01 00:00:00,20.5\n2024-01-01 01:00:00,\n"
        );
    }

    #[test]
    fn time_only_series_exports_index() {
        let series = NormalizedSeries {
            variable_name: None,
            source_column: None,
            values: Vec::new(),
            time_index: Some(vec![
                parse_timestamp("2024-01-01").unwrap(),
                parse_timestamp("2024-01-02 06:30").unwrap(),
            ]),
            extra_columns: Vec::new(),
        };
        let text = String::from_utf8(to_csv_bytes(&series, "Time").unwrap()).unwrap();
        assert_eq!(text, "Time\n2024-01-01 00:00:00\n2024-01-02 06:30:00\n");
    }

    #[test]
    fn without_time_index() {
        let series = NormalizedSeries {
            variable_name: Some("variable".into()),
            source_column: Some("SensorA".into()),
            values: vec![Value::Number(1.0), Value::Text("a,b".into())],
            time_index: None,
            extra_columns: Vec::new(),
        };
        let text = String::from_utf8(to_csv_bytes(&series, "Time").unwrap()).unwrap();
        assert_eq!(text, "variable\n1\n\"a,b\"\n");
    }
}
