use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{figure_name, figure_period, FIGURES_PREFIX, MEASUREMENT_ENTRY, SESSION_ENTRY};
use crate::error::{ChamberError, Result};
use crate::profile::reader::parse_profile;
use crate::profile::writer::profile_to_csv;
use crate::profile::Profile;
use crate::session::record::decode_log;
use crate::session::{DataRecord, SessionLog, SessionSnapshot};

/// Everything one save writes, borrowed from the session.
pub struct ArchiveContents<'a> {
    pub log: &'a SessionLog,
    pub profile: Option<&'a Profile>,
    pub current_period: u32,
    /// Chart of the current period. Empty means "no new chart": the stored
    /// figure for the current period, if any, is kept.
    pub current_chart: &'a [u8],
    pub session: &'a SessionSnapshot,
}

/// An archive read back from disk.
#[derive(Debug)]
pub struct LoadedArchive {
    pub records: Vec<DataRecord>,
    pub profile: Option<Profile>,
    pub figures: BTreeMap<u32, Vec<u8>>,
    pub session: Option<SessionSnapshot>,
}

/// Tracks where the session's archive lives and writes new versions of it.
///
/// Until the user picks a location the archive is temporary: every save
/// writes a fresh file in the temporary directory and removes the previous
/// one. After [`ArchiveStore::save_as`] saves replace the file at the
/// chosen path. Every write goes to a temporary file that is renamed into
/// place, so an interrupted save leaves the previous archive intact.
#[derive(Debug)]
pub struct ArchiveStore {
    path: Option<PathBuf>,
    temporary: bool,
    temp_dir: PathBuf,
    staged: BTreeMap<u32, Vec<u8>>,
    last_checkpoint: Option<u32>,
}

impl ArchiveStore {
    /// A store for a new session that has not been saved yet.
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: None,
            temporary: true,
            temp_dir: temp_dir.into(),
            staged: BTreeMap::new(),
            last_checkpoint: None,
        }
    }

    /// A store continuing an existing archive, e.g. after resuming from it.
    /// An archive inside `temp_dir` is still temporary.
    pub fn open(path: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>, last_checkpoint: Option<u32>) -> Self {
        let path = path.into();
        let temp_dir = temp_dir.into();
        Self {
            temporary: path.starts_with(&temp_dir),
            path: Some(path),
            temp_dir,
            staged: BTreeMap::new(),
            last_checkpoint,
        }
    }

    /// Location of the most recent save.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True until the user saves to a chosen location.
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn last_checkpoint(&self) -> Option<u32> {
        self.last_checkpoint
    }

    /// Keep a finished period's chart until the next save writes it.
    pub fn stage_figure(&mut self, period_index: u32, png: Vec<u8>) {
        debug!("Staged chart for period {} ({} bytes)", period_index, png.len());
        self.staged.insert(period_index, png);
    }

    pub fn staged_periods(&self) -> impl Iterator<Item = u32> + '_ {
        self.staged.keys().copied()
    }

    /// Commit the log's live records at the end of `period_index`.
    ///
    /// Committed rows are appended, never rewritten. A period that was
    /// already checkpointed is ignored, so repeated calls for one boundary
    /// cannot duplicate records.
    pub fn checkpoint(&mut self, log: &mut SessionLog, period_index: u32) -> Result<usize> {
        if self.last_checkpoint.is_some_and(|last| period_index <= last) {
            debug!("Period {} already checkpointed, skipping", period_index);
            return Ok(0);
        }
        let moved = log.commit_live()?;
        self.last_checkpoint = Some(period_index);
        info!(
            "Checkpointed {} records at the end of period {}",
            moved, period_index
        );
        Ok(moved)
    }

    /// Save to the current location, or to a new temporary archive if the
    /// user has not chosen one yet.
    pub fn save(&mut self, contents: &ArchiveContents<'_>) -> Result<PathBuf> {
        let path = match (&self.path, self.temporary) {
            (Some(path), false) => path.clone(),
            _ => return self.save_temporary(contents),
        };

        write_archive_atomic(&path, Some(&path), &self.staged, contents)?;
        self.staged.clear();
        info!("Saved archive {:?}", path);
        Ok(path)
    }

    /// Save to `target` and make it the archive's location from now on.
    /// A previous temporary archive is removed.
    pub fn save_as(&mut self, target: &Path, contents: &ArchiveContents<'_>) -> Result<PathBuf> {
        let prior = self.path.clone();
        write_archive_atomic(target, prior.as_deref(), &self.staged, contents)?;

        if self.temporary {
            if let Some(prior) = prior.filter(|prior| prior != target) {
                remove_stale(&prior);
            }
        }
        self.path = Some(target.to_path_buf());
        self.temporary = false;
        self.staged.clear();
        info!("Saved archive as {:?}", target);
        Ok(target.to_path_buf())
    }

    fn save_temporary(&mut self, contents: &ArchiveContents<'_>) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.temp_dir)
            .map_err(|e| ChamberError::archive_io(&self.temp_dir, e))?;

        let mut file = tempfile::Builder::new()
            .prefix("measurement-")
            .suffix(".zip")
            .tempfile_in(&self.temp_dir)
            .map_err(|e| ChamberError::archive_io(&self.temp_dir, e))?;
        let target = file.path().to_path_buf();
        let prior = self.path.clone();

        write_entries(file.as_file_mut(), &target, prior.as_deref(), &self.staged, contents)?;
        file.as_file()
            .sync_all()
            .map_err(|e| ChamberError::archive_io(&target, e))?;
        let (_, target) = file
            .keep()
            .map_err(|e| ChamberError::archive_io(&target, e))?;

        if let Some(prior) = prior {
            remove_stale(&prior);
        }
        self.path = Some(target.clone());
        self.staged.clear();
        info!("Saved temporary archive {:?}", target);
        Ok(target)
    }

    /// Read an archive back.
    ///
    /// A missing or undecodable `measurement.csv` is an error; an unreadable
    /// profile snapshot is logged and skipped.
    pub fn load(path: &Path) -> Result<LoadedArchive> {
        let file = File::open(path).map_err(|e| ChamberError::archive_io(path, e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| corrupt(path, e))?;

        let log_bytes = read_entry(&mut archive, path, MEASUREMENT_ENTRY)?
            .ok_or_else(|| corrupt(path, format!("missing {}", MEASUREMENT_ENTRY)))?;
        let records = decode_log(&String::from_utf8_lossy(&log_bytes))?;

        let session: Option<SessionSnapshot> = match read_entry(&mut archive, path, SESSION_ENTRY)? {
            Some(bytes) => Some(serde_json::from_slice(&bytes).map_err(|e| corrupt(path, e))?),
            None => None,
        };

        let profile_name = match session.as_ref().map(|s| s.profile_file.clone()) {
            Some(name) => name,
            None => archive
                .file_names()
                .find(|name| is_profile_candidate(name))
                .map(str::to_string),
        };
        let profile = match profile_name {
            Some(name) => load_profile_entry(&mut archive, path, &name)?,
            None => None,
        };

        let figure_entries: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|name| figure_period(name).map(|period| (period, name.to_string())))
            .collect();
        let mut figures = BTreeMap::new();
        for (period, name) in figure_entries {
            if let Some(bytes) = read_entry(&mut archive, path, &name)? {
                figures.insert(period, bytes);
            }
        }

        debug!(
            "Loaded archive {:?}: {} records, {} figures",
            path,
            records.len(),
            figures.len()
        );
        Ok(LoadedArchive {
            records,
            profile,
            figures,
            session,
        })
    }
}

/// Archive entry name for a profile snapshot, kept clear of the fixed entries.
fn profile_entry_name(file_name: &str) -> String {
    let reserved = file_name.is_empty()
        || file_name == MEASUREMENT_ENTRY
        || file_name == SESSION_ENTRY
        || file_name.starts_with(FIGURES_PREFIX);
    if reserved {
        format!("profile_{}", file_name)
    } else {
        file_name.to_string()
    }
}

fn is_profile_candidate(name: &str) -> bool {
    name.ends_with(".csv") && name != MEASUREMENT_ENTRY && !name.starts_with(FIGURES_PREFIX)
}

fn load_profile_entry(
    archive: &mut ZipArchive<File>,
    path: &Path,
    file_name: &str,
) -> Result<Option<Profile>> {
    let Some(bytes) = read_entry(archive, path, &profile_entry_name(file_name))? else {
        warn!("Archive {:?} names profile {:?} but does not contain it", path, file_name);
        return Ok(None);
    };
    match parse_profile(&String::from_utf8_lossy(&bytes), file_name, 0) {
        Ok(profile) => Ok(Some(profile)),
        Err(e) => {
            warn!("Ignoring profile snapshot {:?} in {:?}: {}", file_name, path, e);
            Ok(None)
        }
    }
}

fn read_entry(archive: &mut ZipArchive<File>, path: &Path, name: &str) -> Result<Option<Vec<u8>>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(corrupt(path, e)),
    };
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).map_err(|e| corrupt(path, e))?;
    Ok(Some(bytes))
}

fn corrupt(path: &Path, reason: impl Display) -> ChamberError {
    ChamberError::ArchiveCorrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Open the previous archive to copy entries from. Anything unreadable
/// means "nothing to carry over".
fn open_prior(path: &Path) -> Option<ZipArchive<File>> {
    if !path.exists() {
        return None;
    }
    let opened = File::open(path)
        .map_err(|e| corrupt(path, e))
        .and_then(|file| ZipArchive::new(file).map_err(|e| corrupt(path, e)));
    match opened {
        Ok(archive) => Some(archive),
        Err(e) => {
            warn!("{}; continuing without its earlier entries", e);
            None
        }
    }
}

/// Entry holding the profile snapshot of a previous save, which the next
/// save replaces.
fn prior_profile_entry(prior: &mut ZipArchive<File>, path: &Path) -> Option<String> {
    let bytes = read_entry(prior, path, SESSION_ENTRY).ok().flatten()?;
    let session: SessionSnapshot = serde_json::from_slice(&bytes).ok()?;
    session.profile_file.as_deref().map(profile_entry_name)
}

fn remove_stale(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed previous temporary archive {:?}", path),
        Err(e) => warn!("Could not remove previous temporary archive {:?}: {}", path, e),
    }
}

/// Write a complete archive next to `target` and rename it into place.
fn write_archive_atomic(
    target: &Path,
    prior: Option<&Path>,
    staged: &BTreeMap<u32, Vec<u8>>,
    contents: &ArchiveContents<'_>,
) -> Result<()> {
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| ChamberError::archive_io(target, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| ChamberError::archive_io(target, e))?;
    write_entries(temp.as_file_mut(), target, prior, staged, contents)?;
    temp.as_file()
        .sync_all()
        .map_err(|e| ChamberError::archive_io(target, e))?;
    temp.persist(target)
        .map_err(|e| ChamberError::archive_io(target, e))?;
    Ok(())
}

fn write_entries<W: Write + Seek>(
    writer: W,
    target: &Path,
    prior: Option<&Path>,
    staged: &BTreeMap<u32, Vec<u8>>,
    contents: &ArchiveContents<'_>,
) -> Result<()> {
    let zip_error = |e: ZipError| ChamberError::archive_io(target, e);
    let io_error = |e: std::io::Error| ChamberError::archive_io(target, e);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut fresh: BTreeMap<String, &[u8]> = staged
        .iter()
        .map(|(period, png)| (figure_name(*period), png.as_slice()))
        .collect();
    if !contents.current_chart.is_empty() {
        fresh.insert(figure_name(contents.current_period), contents.current_chart);
    }

    let profile_entry = contents.profile.map(|p| profile_entry_name(p.file_name()));
    let mut rewritten: Vec<&str> = vec![MEASUREMENT_ENTRY, SESSION_ENTRY];
    rewritten.extend(fresh.keys().map(String::as_str));
    rewritten.extend(profile_entry.as_deref());

    let mut zip = ZipWriter::new(writer);

    if let Some((prior_path, mut prior)) = prior.and_then(|p| open_prior(p).map(|a| (p, a))) {
        let old_profile = prior_profile_entry(&mut prior, prior_path);
        let kept: Vec<String> = prior
            .file_names()
            .filter(|name| !rewritten.contains(name) && Some(*name) != old_profile.as_deref())
            .map(str::to_string)
            .collect();
        for name in kept {
            match prior.by_name(&name) {
                Ok(entry) => zip.raw_copy_file(entry).map_err(zip_error)?,
                Err(e) => warn!("Dropping unreadable entry {} from {:?}: {}", name, prior_path, e),
            }
        }
    }

    for (name, png) in &fresh {
        zip.start_file(name.as_str(), options).map_err(zip_error)?;
        zip.write_all(png).map_err(io_error)?;
    }

    let log_csv = contents.log.to_csv()?;
    zip.start_file(MEASUREMENT_ENTRY, options).map_err(zip_error)?;
    zip.write_all(log_csv.as_bytes()).map_err(io_error)?;

    if let (Some(profile), Some(entry)) = (contents.profile, &profile_entry) {
        let profile_csv = profile_to_csv(profile)?;
        zip.start_file(entry.as_str(), options).map_err(zip_error)?;
        zip.write_all(profile_csv.as_bytes()).map_err(io_error)?;
    }

    let session_json = serde_json::to_vec_pretty(contents.session)
        .map_err(|e| ChamberError::archive_io(target, e))?;
    zip.start_file(SESSION_ENTRY, options).map_err(zip_error)?;
    zip.write_all(&session_json).map_err(io_error)?;

    zip.finish().map_err(zip_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileSetpoint;
    use crate::session::clock::{ManualTimeSource, SessionClock};
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn snapshot() -> SessionSnapshot {
        let time = ManualTimeSource::new(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());
        let clock = SessionClock::start(Arc::new(time), Duration::days(1), Duration::hours(1));
        SessionSnapshot {
            clock: clock.snapshot(),
            profile_file: None,
            profile_path: None,
        }
    }

    fn log_with(minutes: &[i64]) -> SessionLog {
        let mut log = SessionLog::new();
        for &m in minutes {
            log.append(DataRecord::new(Duration::minutes(m), 20.0 + m as f64, None))
                .unwrap();
        }
        log
    }

    fn contents<'a>(
        log: &'a SessionLog,
        period: u32,
        chart: &'a [u8],
        session: &'a SessionSnapshot,
    ) -> ArchiveContents<'a> {
        ArchiveContents {
            log,
            profile: None,
            current_period: period,
            current_chart: chart,
            session,
        }
    }

    #[test]
    fn test_checkpoint_once_per_period() {
        let dir = TempDir::new().unwrap();
        let mut store = ArchiveStore::new(dir.path());
        let mut log = log_with(&[1, 2, 3]);

        assert_eq!(store.checkpoint(&mut log, 1).unwrap(), 3);
        log.append(DataRecord::new(Duration::minutes(4), 20.0, None)).unwrap();
        assert_eq!(store.checkpoint(&mut log, 1).unwrap(), 0);
        assert_eq!(log.committed_len(), 3);
        assert_eq!(log.live().len(), 1);

        assert_eq!(store.checkpoint(&mut log, 2).unwrap(), 1);
        assert_eq!(store.last_checkpoint(), Some(2));
    }

    #[test]
    fn test_temporary_saves_replace_each_other() {
        let dir = TempDir::new().unwrap();
        let mut store = ArchiveStore::new(dir.path().join("tmp"));
        let session = snapshot();
        let log = log_with(&[1]);

        let first = store.save(&contents(&log, 1, b"day1-a", &session)).unwrap();
        assert!(store.is_temporary());
        let second = store.save(&contents(&log, 1, b"day1-b", &session)).unwrap();

        assert_ne!(first, second);
        assert!(!first.exists(), "previous temporary archive should be removed");
        let loaded = ArchiveStore::load(&second).unwrap();
        assert_eq!(loaded.figures.get(&1).map(Vec::as_slice), Some(&b"day1-b"[..]));
    }

    #[test]
    fn test_save_as_leaves_temporary_state() {
        let dir = TempDir::new().unwrap();
        let mut store = ArchiveStore::new(dir.path().join("tmp"));
        let session = snapshot();
        let log = log_with(&[1, 2]);

        let temp = store.save(&contents(&log, 1, b"day1", &session)).unwrap();
        let chosen = dir.path().join("run.zip");
        store.save_as(&chosen, &contents(&log, 1, b"", &session)).unwrap();

        assert!(!store.is_temporary());
        assert_eq!(store.path(), Some(chosen.as_path()));
        assert!(!temp.exists());
        let loaded = ArchiveStore::load(&chosen).unwrap();
        assert_eq!(loaded.figures.get(&1).map(Vec::as_slice), Some(&b"day1"[..]));
        assert_eq!(loaded.records.len(), 2);
    }

    #[test]
    fn test_staged_figures_written_then_cleared() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("run.zip");
        let mut store = ArchiveStore::new(dir.path().join("tmp"));
        let session = snapshot();
        let log = log_with(&[1]);

        store.stage_figure(1, b"final day 1".to_vec());
        store.save_as(&target, &contents(&log, 2, b"day 2 so far", &session)).unwrap();
        assert_eq!(store.staged_periods().count(), 0);

        let loaded = ArchiveStore::load(&target).unwrap();
        assert_eq!(loaded.figures[&1], b"final day 1".to_vec());
        assert_eq!(loaded.figures[&2], b"day 2 so far".to_vec());
    }

    #[test]
    fn test_corrupt_prior_archive_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("run.zip");
        std::fs::write(&target, b"definitely not a zip").unwrap();

        let mut store = ArchiveStore::open(&target, dir.path(), None);
        let session = snapshot();
        let log = log_with(&[1]);
        store.save(&contents(&log, 3, b"day3", &session)).unwrap();

        let loaded = ArchiveStore::load(&target).unwrap();
        assert_eq!(loaded.figures.keys().copied().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_unwritable_target_keeps_existing_archive() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.zip");
        let mut store = ArchiveStore::new(dir.path().join("tmp"));
        let session = snapshot();
        let log = log_with(&[1]);
        store.save_as(&good, &contents(&log, 1, b"day1", &session)).unwrap();
        let before = std::fs::read(&good).unwrap();

        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"a file, not a directory").unwrap();
        let bad = blocker.join("run.zip");

        let result = store.save_as(&bad, &contents(&log, 1, b"other", &session));
        assert!(matches!(result, Err(ChamberError::ArchiveIo { .. })));
        assert_eq!(std::fs::read(&good).unwrap(), before);
        assert_eq!(store.path(), Some(good.as_path()));
    }

    #[test]
    fn test_load_missing_log_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.zip");
        let file = File::create(&path).unwrap();
        ZipWriter::new(file).finish().unwrap();

        assert!(matches!(
            ArchiveStore::load(&path),
            Err(ChamberError::ArchiveCorrupt { .. })
        ));
    }

    #[test]
    fn test_unknown_entries_carry_over_and_old_profile_is_replaced() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("run.zip");
        let mut store = ArchiveStore::new(dir.path().join("tmp"));
        let log = log_with(&[1]);
        let first = Profile::new(
            "first.csv",
            vec![ProfileSetpoint::new(Duration::zero(), 10.0), ProfileSetpoint::new(Duration::hours(1), 20.0)],
        )
        .unwrap();
        let mut session = snapshot();
        session.profile_file = Some("first.csv".to_string());
        let with_first = ArchiveContents {
            profile: Some(&first),
            ..contents(&log, 1, b"day1", &session)
        };
        store.save_as(&target, &with_first).unwrap();

        let copy = dir.path().join("annotated.zip");
        {
            let mut original = ZipArchive::new(File::open(&target).unwrap()).unwrap();
            let mut zip = ZipWriter::new(File::create(&copy).unwrap());
            for i in 0..original.len() {
                zip.raw_copy_file(original.by_index(i).unwrap()).unwrap();
            }
            zip.start_file("notes/operator.txt", SimpleFileOptions::default()).unwrap();
            zip.write_all(b"door opened at 14:00").unwrap();
            zip.finish().unwrap();
        }
        std::fs::rename(&copy, &target).unwrap();

        let second = Profile::new("second.csv", first.setpoints().to_vec()).unwrap();
        let mut session = snapshot();
        session.profile_file = Some("second.csv".to_string());
        let with_second = ArchiveContents {
            profile: Some(&second),
            ..contents(&log, 1, b"", &session)
        };
        store.save(&with_second).unwrap();

        let mut archive = ZipArchive::new(File::open(&target).unwrap()).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec!["figures/day1.png", "measurement.csv", "notes/operator.txt", "second.csv", "session.json"]
        );
        assert_eq!(
            read_entry(&mut archive, &target, "notes/operator.txt").unwrap(),
            Some(b"door opened at 14:00".to_vec())
        );
    }

    /// Overwrite the declared uncompressed size of `name` in both its local
    /// and its central directory header.
    fn forge_size(bytes: &mut [u8], name: &str, size: u32) {
        let field = |b: &[u8], at: usize| u16::from_le_bytes([b[at], b[at + 1]]) as usize;
        let mut i = 0;
        while i + 46 <= bytes.len() {
            let sig = u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
            let (len_at, name_at, size_at) = match sig {
                0x0403_4b50 => (26, 30, 22),
                0x0201_4b50 => (28, 46, 24),
                _ => {
                    i += 1;
                    continue;
                }
            };
            let len = field(bytes, i + len_at);
            if bytes.get(i + name_at..i + name_at + len) == Some(name.as_bytes()) {
                bytes[i + size_at..i + size_at + 4].copy_from_slice(&size.to_le_bytes());
            }
            i += 4;
        }
    }

    #[test]
    fn test_forged_entry_size_does_not_preallocate() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("run.zip");
        let mut store = ArchiveStore::new(dir.path().join("tmp"));
        let session = snapshot();
        let log = log_with(&[1, 2, 3]);
        store.save_as(&target, &contents(&log, 1, b"day1", &session)).unwrap();

        let mut bytes = std::fs::read(&target).unwrap();
        forge_size(&mut bytes, MEASUREMENT_ENTRY, 0xFFFF_FFF0);
        std::fs::write(&target, &bytes).unwrap();

        match ArchiveStore::load(&target) {
            Ok(loaded) => assert_eq!(loaded.records.len(), 3),
            Err(e) => assert!(matches!(e, ChamberError::ArchiveCorrupt { .. }), "unexpected error: {}", e),
        }
    }

    #[test]
    fn test_reserved_profile_names_are_prefixed() {
        assert_eq!(profile_entry_name("ramp.csv"), "ramp.csv");
        assert_eq!(profile_entry_name("measurement.csv"), "profile_measurement.csv");
        assert_eq!(profile_entry_name("session.json"), "profile_session.json");
    }
}
