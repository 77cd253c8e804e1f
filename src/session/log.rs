use chrono::Duration;
use tracing::{debug, info};

use super::record::{decode_rows, encode_rows, format_elapsed, DataRecord, LOG_HEADER};
use crate::error::{ChamberError, Result};
use crate::profile::ProfileEvaluator;

/// The record history of one measurement.
///
/// Records live in two halves: a committed prefix, already handed to the
/// archive and held as encoded log rows, and a live suffix of records
/// sampled since the last checkpoint. Elapsed times increase strictly
/// across both halves.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    committed: String,
    committed_len: usize,
    last_committed: Option<Duration>,
    live: Vec<DataRecord>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from records, committing those at or before
    /// `committed_through`. With `None` every record is live.
    pub fn from_records(records: Vec<DataRecord>, committed_through: Option<Duration>) -> Result<Self> {
        let mut log = Self::new();
        let (committed, live): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|record| committed_through.is_some_and(|end| record.elapsed <= end));

        for record in committed {
            log.append(record)?;
        }
        log.commit_live()?;
        for record in live {
            log.append(record)?;
        }
        Ok(log)
    }

    /// Append a record. Its elapsed time must be after every record held.
    pub fn append(&mut self, record: DataRecord) -> Result<()> {
        if let Some(previous) = self.last_elapsed() {
            if record.elapsed <= previous {
                return Err(ChamberError::OutOfOrderRecord {
                    previous: format_elapsed(previous),
                    next: format_elapsed(record.elapsed),
                });
            }
        }
        self.live.push(record);
        Ok(())
    }

    pub fn last_elapsed(&self) -> Option<Duration> {
        self.live
            .last()
            .map(|record| record.elapsed)
            .or(self.last_committed)
    }

    /// Records sampled since the last checkpoint.
    pub fn live(&self) -> &[DataRecord] {
        &self.live
    }

    /// Encoded rows of every committed record.
    pub fn committed_text(&self) -> &str {
        &self.committed
    }

    pub fn committed_len(&self) -> usize {
        self.committed_len
    }

    pub fn len(&self) -> usize {
        self.committed_len + self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move the live records into the committed prefix. Committed rows are
    /// only ever appended to. Returns the number of records moved.
    pub fn commit_live(&mut self) -> Result<usize> {
        if self.live.is_empty() {
            return Ok(0);
        }
        let rows = encode_rows(&self.live)?;
        self.committed.push_str(&rows);
        self.committed_len += self.live.len();
        self.last_committed = self.live.last().map(|record| record.elapsed);

        let moved = self.live.len();
        self.live.clear();
        debug!("Committed {} records ({} in total)", moved, self.committed_len);
        Ok(moved)
    }

    /// Every record, committed prefix first.
    pub fn records(&self) -> Result<Vec<DataRecord>> {
        let mut records = decode_rows(&self.committed)?;
        records.extend_from_slice(&self.live);
        Ok(records)
    }

    /// Recompute `target_temp` for the whole history with one fresh cursor.
    ///
    /// The committed rows are decoded, updated and re-encoded; the record
    /// count never changes. Running it twice with the same profile gives the
    /// same values.
    pub fn recalculate(&mut self, mut cursor: ProfileEvaluator) -> Result<()> {
        let mut committed = decode_rows(&self.committed)?;
        if committed.len() != self.committed_len {
            return Err(ChamberError::MalformedLog(format!(
                "committed log holds {} rows, expected {}",
                committed.len(),
                self.committed_len
            )));
        }

        for record in committed.iter_mut().chain(self.live.iter_mut()) {
            record.target_temp = cursor.evaluate(record.elapsed);
        }

        self.committed = encode_rows(&committed)?;
        info!(
            "Recalculated targets for {} records ({})",
            self.len(),
            if cursor.has_profile() { "profile loaded" } else { "no profile" }
        );
        Ok(())
    }

    /// The complete log as text, header included.
    pub fn to_csv(&self) -> Result<String> {
        let mut text = LOG_HEADER.join(",");
        text.push('\n');
        text.push_str(&self.committed);
        text.push_str(&encode_rows(&self.live)?);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Profile, ProfileSetpoint};
    use crate::session::record::decode_log;

    fn ramp() -> Profile {
        Profile::new(
            "ramp.csv",
            vec![
                ProfileSetpoint::new(Duration::zero(), 0.0),
                ProfileSetpoint::new(Duration::minutes(10), 100.0),
            ],
        )
        .unwrap()
    }

    fn record(minutes: i64, real: f64) -> DataRecord {
        DataRecord::new(Duration::minutes(minutes), real, None)
    }

    fn targets(log: &SessionLog) -> Vec<Option<f64>> {
        log.records().unwrap().iter().map(|r| r.target_temp).collect()
    }

    #[test]
    fn test_append_rejects_out_of_order() {
        let mut log = SessionLog::new();
        log.append(record(2, 20.0)).unwrap();
        assert!(matches!(
            log.append(record(2, 21.0)),
            Err(ChamberError::OutOfOrderRecord { .. })
        ));
        assert!(matches!(
            log.append(record(1, 21.0)),
            Err(ChamberError::OutOfOrderRecord { .. })
        ));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_order_enforced_across_commit() {
        let mut log = SessionLog::new();
        log.append(record(5, 20.0)).unwrap();
        log.commit_live().unwrap();
        assert!(log.append(record(4, 20.0)).is_err());
        assert!(log.append(record(6, 20.0)).is_ok());
    }

    #[test]
    fn test_commit_moves_live_once() {
        let mut log = SessionLog::new();
        log.append(record(1, 20.0)).unwrap();
        log.append(record(2, 21.0)).unwrap();

        assert_eq!(log.commit_live().unwrap(), 2);
        assert_eq!(log.commit_live().unwrap(), 0);
        assert_eq!(log.committed_len(), 2);
        assert!(log.live().is_empty());

        log.append(record(3, 22.0)).unwrap();
        let committed_before = log.committed_text().to_string();
        log.commit_live().unwrap();
        assert!(log.committed_text().starts_with(&committed_before));
        assert_eq!(log.records().unwrap().len(), 3);
    }

    #[test]
    fn test_recalculate_covers_committed_and_live() {
        let mut log = SessionLog::new();
        log.append(record(2, 20.0)).unwrap();
        log.append(record(4, 20.0)).unwrap();
        log.commit_live().unwrap();
        log.append(record(5, 20.0)).unwrap();
        log.append(record(12, 20.0)).unwrap();

        log.recalculate(ProfileEvaluator::new(Some(&ramp()))).unwrap();
        assert_eq!(targets(&log), vec![Some(20.0), Some(40.0), Some(50.0), Some(100.0)]);
        assert_eq!(log.committed_len(), 2);
        assert_eq!(log.live().len(), 2);
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let mut log = SessionLog::new();
        for minute in 1..=30 {
            log.append(DataRecord::new(Duration::seconds(minute * 37), 20.0, None)).unwrap();
            if minute % 7 == 0 {
                log.commit_live().unwrap();
            }
        }

        log.recalculate(ProfileEvaluator::new(Some(&ramp()))).unwrap();
        let first = targets(&log);
        let first_text = log.committed_text().to_string();

        log.recalculate(ProfileEvaluator::new(Some(&ramp()))).unwrap();
        assert_eq!(targets(&log), first);
        assert_eq!(log.committed_text(), first_text);
    }

    #[test]
    fn test_recalculate_without_profile_clears_targets() {
        let mut log = SessionLog::new();
        log.append(DataRecord::new(Duration::minutes(1), 20.0, Some(10.0))).unwrap();
        log.commit_live().unwrap();
        log.append(DataRecord::new(Duration::minutes(2), 20.0, Some(20.0))).unwrap();

        log.recalculate(ProfileEvaluator::empty()).unwrap();
        assert_eq!(targets(&log), vec![None, None]);
    }

    #[test]
    fn test_to_csv_parses_back() {
        let mut log = SessionLog::new();
        log.append(DataRecord::new(Duration::seconds(30), 20.25, Some(20.0))).unwrap();
        log.commit_live().unwrap();
        log.append(DataRecord::new(Duration::seconds(90), 20.5, None)).unwrap();

        let parsed = decode_log(&log.to_csv().unwrap()).unwrap();
        assert_eq!(parsed, log.records().unwrap());
    }

    #[test]
    fn test_from_records_splits_at_period_end() {
        let records: Vec<_> = (1..=6).map(|m| record(m * 10, 20.0)).collect();
        let log = SessionLog::from_records(records.clone(), Some(Duration::minutes(30))).unwrap();

        assert_eq!(log.committed_len(), 3);
        assert_eq!(log.live().len(), 3);
        assert_eq!(log.last_elapsed(), Some(Duration::minutes(60)));

        let all_live = SessionLog::from_records(records, None).unwrap();
        assert_eq!(all_live.committed_len(), 0);
        assert_eq!(all_live.live().len(), 6);
    }
}
