//! Parser for line-delimited JSON datasets.
//!
//! Each dataset is one JSON object per line, UTF-8 encoded. `JsonLines` turns
//! a reader into a lazy sequence of typed records so a multi-gigabyte review
//! file is never held in memory at once.

use crate::error::{DataLoadError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::Path;

/// Lazy iterator of records parsed from a line-delimited JSON reader.
///
/// Yields one `Result<T>` per non-blank line. Blank lines are skipped; any
/// other line that does not deserialize into `T` yields a
/// `DataLoadError::ParseError` carrying the label and 1-based line number.
pub struct JsonLines<R, T> {
    reader: R,
    label: String,
    line_no: usize,
    buf: String,
    _record: PhantomData<fn() -> T>,
}

impl<R: BufRead, T: DeserializeOwned> JsonLines<R, T> {
    /// Wrap a buffered reader. `label` names the dataset in error messages.
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
            line_no: 0,
            buf: String::new(),
            _record: PhantomData,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<R: BufRead, T: DeserializeOwned> Iterator for JsonLines<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(DataLoadError::IoError(e))),
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue; // Skip empty lines
            }

            return Some(serde_json::from_str(line).map_err(|e| DataLoadError::ParseError {
                file: self.label.clone(),
                line: self.line_no,
                reason: e.to_string(),
            }));
        }
    }
}

/// Open a dataset file read-only as a lazy record sequence
pub fn open_records<T: DeserializeOwned>(path: &Path) -> Result<JsonLines<BufReader<File>, T>> {
    let file = File::open(path).map_err(|_| DataLoadError::FileNotFound {
        path: path.display().to_string(),
    })?;
    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(JsonLines::new(BufReader::new(file), label))
}

/// Parse a dataset timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM:SS` and a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(field: &str, value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }
    Err(DataLoadError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReviewRecord;
    use std::io::Cursor;

    const REVIEWS: &str = r#"{"user_id":"u1","business_id":"b1","stars":4.0,"date":"2019-01-01 10:00:00"}

{"user_id":"u2","business_id":"b1","stars":2.0,"date":"2019-02-01 10:00:00","text":"meh"}
"#;

    #[test]
    fn test_json_lines_skips_blank_lines() {
        let records: Vec<ReviewRecord> = JsonLines::new(Cursor::new(REVIEWS), "review")
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].user_id, "u2");
        assert_eq!(records[1].stars, 2.0);
    }

    #[test]
    fn test_json_lines_reports_line_of_malformed_record() {
        let input = "{\"user_id\":\"u1\",\"business_id\":\"b1\",\"stars\":4.0,\"date\":\"2019-01-01\"}\n\
                     {\"user_id\":\"u2\",\"stars\":4.0,\"date\":\"2019-01-01\"}\n";
        let mut records = JsonLines::<_, ReviewRecord>::new(Cursor::new(input), "review");

        assert!(records.next().unwrap().is_ok());
        match records.next().unwrap() {
            Err(DataLoadError::ParseError { file, line, reason }) => {
                assert_eq!(file, "review");
                assert_eq!(line, 2);
                assert!(reason.contains("business_id"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(records.next().is_none());
    }

    #[test]
    fn test_open_missing_file() {
        let result = open_records::<ReviewRecord>(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(DataLoadError::FileNotFound { .. })));
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("date", "2018-07-07 22:09:11").unwrap();
        assert_eq!(ts.to_string(), "2018-07-07 22:09:11");

        let midnight = parse_timestamp("date", "2018-12-31").unwrap();
        assert_eq!(midnight.to_string(), "2018-12-31 00:00:00");

        assert!(matches!(
            parse_timestamp("date", "yesterday"),
            Err(DataLoadError::InvalidValue { .. })
        ));
    }
}
