use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use super::types::{format_offset, Profile};
use crate::error::{ChamberError, Result};

/// Serialize a profile to canonical CSV (`time,temp`, `DD:HH:MM` times).
pub fn profile_to_csv(profile: &Profile) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(["time", "temp"])?;
    for setpoint in profile.setpoints() {
        writer.write_record([format_offset(setpoint.offset), setpoint.target_temp.to_string()])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ChamberError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write a profile to disk atomically.
///
/// The CSV is written to a temporary file in the target's directory and
/// renamed over the target, so an interrupted write never leaves a partial
/// profile behind.
pub fn write_profile_atomic(profile: &Profile, target_path: &Path) -> Result<()> {
    let io_error = |source: std::io::Error| ChamberError::ProfileIo {
        path: target_path.to_path_buf(),
        source,
    };

    let csv = profile_to_csv(profile)?;

    let parent = target_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(io_error)?;

    let mut temp = NamedTempFile::new_in(parent).map_err(io_error)?;
    temp.write_all(csv.as_bytes()).map_err(io_error)?;
    temp.flush().map_err(io_error)?;
    temp.persist(target_path).map_err(|e| io_error(e.into()))?;

    info!("Wrote profile to {:?}", target_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::reader::read_profile;
    use crate::profile::types::ProfileSetpoint;
    use chrono::Duration;
    use tempfile::TempDir;

    fn sample_profile() -> Profile {
        Profile::new(
            "cycle.csv",
            vec![
                ProfileSetpoint::new(Duration::zero(), 20.0),
                ProfileSetpoint::new(Duration::hours(30), -12.5),
                ProfileSetpoint::new(Duration::days(2), 20.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_csv_is_canonical() {
        let csv = profile_to_csv(&sample_profile()).unwrap();
        assert_eq!(csv, "time,temp\n01:00:00,20\n02:06:00,-12.5\n03:00:00,20\n");
    }

    #[test]
    fn test_atomic_write_round_trip() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("profiles").join("cycle.csv");

        write_profile_atomic(&sample_profile(), &target).unwrap();

        let reread = read_profile(&target).unwrap();
        assert_eq!(reread, sample_profile());
    }
}
