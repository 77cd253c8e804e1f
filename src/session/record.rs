//! Sampled records and their textual log format.
//!
//! ```text
//! duration,measurement,set_temp
//! 00:00:01:00,21.4,20
//! 00:00:02:00,21.9,
//! ```
//!
//! `duration` is elapsed measurement time as `DD:HH:MM:SS` (days from 0).
//! An empty `set_temp` means no profile was active.

use chrono::Duration;

use crate::error::{ChamberError, Result};

pub const LOG_HEADER: [&str; 3] = ["duration", "measurement", "set_temp"];

/// First header cell written by older versions of the log.
const LEGACY_TIME_HEADER: &str = "time";

/// One sampled observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataRecord {
    pub elapsed: Duration,
    pub real_temp: f64,
    pub target_temp: Option<f64>,
}

impl DataRecord {
    /// Build a record; `elapsed` is truncated to whole seconds, the
    /// precision the log keeps.
    pub fn new(elapsed: Duration, real_temp: f64, target_temp: Option<f64>) -> Self {
        Self {
            elapsed: truncate_to_seconds(elapsed),
            real_temp,
            target_temp,
        }
    }
}

pub fn truncate_to_seconds(duration: Duration) -> Duration {
    Duration::seconds(duration.num_seconds())
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}:{:02}",
        total / 86_400,
        (total / 3_600) % 24,
        (total / 60) % 60,
        total % 60
    )
}

/// Parse `DD:HH:MM:SS`, or the legacy `HH:MM:SS`.
pub fn parse_elapsed(cell: &str) -> Result<Duration> {
    let malformed = || ChamberError::MalformedLog(format!("invalid duration {:?}", cell));

    let parts = cell
        .trim()
        .split(':')
        .map(|part| part.parse::<i64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| malformed())?;

    let (days, hours, minutes, seconds) = match parts.as_slice() {
        [d, h, m, s] => (*d, *h, *m, *s),
        [h, m, s] => (0, *h, *m, *s),
        _ => return Err(malformed()),
    };
    if days < 0 || !(0..24).contains(&hours) || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return Err(malformed());
    }

    Ok(Duration::days(days)
        + Duration::hours(hours)
        + Duration::minutes(minutes)
        + Duration::seconds(seconds))
}

/// Encode records as log rows, without a header.
pub fn encode_rows(records: &[DataRecord]) -> Result<String> {
    encode(records, false)
}

/// Encode records as a complete log, header included.
pub fn encode_log(records: &[DataRecord]) -> Result<String> {
    encode(records, true)
}

fn encode(records: &[DataRecord], with_header: bool) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    if with_header {
        writer.write_record(LOG_HEADER)?;
    }
    for record in records {
        writer.write_record([
            format_elapsed(record.elapsed),
            record.real_temp.to_string(),
            record.target_temp.map(|t| t.to_string()).unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ChamberError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Decode header-less log rows.
pub fn decode_rows(text: &str) -> Result<Vec<DataRecord>> {
    decode(text, false)
}

/// Decode a complete log. Both the current and the legacy header are accepted.
pub fn decode_log(text: &str) -> Result<Vec<DataRecord>> {
    decode(text, true)
}

fn decode(text: &str, with_header: bool) -> Result<Vec<DataRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(with_header)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    if with_header {
        let headers = reader.headers()?;
        let first = headers.get(0).unwrap_or_default();
        if first != LOG_HEADER[0] && first != LEGACY_TIME_HEADER {
            return Err(ChamberError::MalformedLog(format!(
                "unexpected header {:?}",
                headers.iter().collect::<Vec<_>>()
            )));
        }
    }

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let row_error =
            |what: &str| ChamberError::MalformedLog(format!("row {}: {}", index + 1, what));

        if row.len() < 3 {
            return Err(row_error("expected 3 columns"));
        }
        let elapsed = parse_elapsed(&row[0])?;
        let real_temp: f64 = row[1]
            .parse()
            .map_err(|_| row_error("invalid measurement"))?;
        let target_temp = match &row[2] {
            "" | "None" => None,
            cell => Some(cell.parse::<f64>().map_err(|_| row_error("invalid set_temp"))?),
        };
        records.push(DataRecord::new(elapsed, real_temp, target_temp));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_truncates_to_seconds() {
        let record = DataRecord::new(Duration::milliseconds(61_999), 20.0, None);
        assert_eq!(record.elapsed, Duration::seconds(61));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::zero()), "00:00:00:00");
        assert_eq!(
            format_elapsed(Duration::days(3) + Duration::hours(4) + Duration::seconds(65)),
            "03:04:01:05"
        );
    }

    #[test]
    fn test_parse_elapsed_accepts_legacy_form() {
        assert_eq!(parse_elapsed("01:02:03").unwrap(), Duration::seconds(3723));
        assert_eq!(
            parse_elapsed("02:01:02:03").unwrap(),
            Duration::days(2) + Duration::seconds(3723)
        );
        assert!(parse_elapsed("1:2").is_err());
        assert!(parse_elapsed("00:25:00:00").is_err());
    }

    #[test]
    fn test_log_round_trip() {
        let records = vec![
            DataRecord::new(Duration::seconds(60), 21.4, Some(20.0)),
            DataRecord::new(Duration::seconds(120), 21.9, None),
            DataRecord::new(Duration::days(2) + Duration::seconds(1), -3.25, Some(1.0 / 3.0)),
        ];

        let text = encode_log(&records).unwrap();
        assert!(text.starts_with("duration,measurement,set_temp\n00:00:01:00,21.4,20\n"));
        assert_eq!(decode_log(&text).unwrap(), records);
    }

    #[test]
    fn test_decode_legacy_log() {
        let text = "time,measurement,set_temp\n00:01:00,20.5,None\n00:02:00,21,22.5\n";
        let records = decode_log(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].target_temp, None);
        assert_eq!(records[1].elapsed, Duration::minutes(2));
        assert_eq!(records[1].target_temp, Some(22.5));
    }

    #[test]
    fn test_decode_rejects_unknown_header() {
        let text = "when,measurement,set_temp\n00:00:01:00,20,\n";
        assert!(matches!(decode_log(text), Err(ChamberError::MalformedLog(_))));
    }

    #[test]
    fn test_decode_rows_without_header() {
        let rows = encode_rows(&[DataRecord::new(Duration::seconds(5), 19.0, Some(18.0))]).unwrap();
        assert_eq!(rows, "00:00:00:05,19,18\n");
        assert_eq!(decode_rows(&rows).unwrap().len(), 1);
        assert!(decode_rows("").unwrap().is_empty());
    }
}
