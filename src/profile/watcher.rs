use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::error::{ChamberError, Result};

/// Watches the active profile file and flags it when it is edited on disk.
///
/// The parent directory is watched rather than the file itself, because
/// editors (and [`crate::profile::writer::write_profile_atomic`]) replace the
/// file by renaming a new one over it.
pub struct ProfileWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
    changed: Arc<AtomicBool>,
}

impl ProfileWatcher {
    pub fn watch(path: &Path) -> Result<Self> {
        let notify_error = |e: notify::Error| ChamberError::ProfileIo {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        };

        let file_name: OsString = path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| ChamberError::ProfileIo {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path"),
            })?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let changed = Arc::new(AtomicBool::new(false));
        let flag = changed.clone();

        let mut watcher =
            notify::recommended_watcher(move |res: std::result::Result<Event, notify::Error>| {
                match res {
                    Ok(event) => {
                        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                            return;
                        }
                        let touches_profile = event
                            .paths
                            .iter()
                            .any(|p| p.file_name() == Some(file_name.as_os_str()));
                        if touches_profile {
                            debug!("Profile file event: {:?}", event.kind);
                            flag.store(true, Ordering::Release);
                        }
                    }
                    Err(e) => {
                        warn!("Profile watcher error: {}", e);
                    }
                }
            })
            .map_err(notify_error)?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(notify_error)?;

        info!("Watching profile {:?} for edits", path);
        Ok(Self {
            _watcher: watcher,
            path: path.to_path_buf(),
            changed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true once per batch of edits since the last call.
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn wait_for_change(watcher: &ProfileWatcher) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if watcher.take_changed() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        false
    }

    #[test]
    fn test_flags_edit_of_watched_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.csv");
        std::fs::write(&path, "time,temp\n01:00:00,20\n").unwrap();

        let watcher = ProfileWatcher::watch(&path).unwrap();
        assert!(!watcher.take_changed());

        std::fs::write(&path, "time,temp\n01:00:00,25\n").unwrap();
        assert!(wait_for_change(&watcher), "edit was not observed");
        assert_eq!(watcher.path(), path.as_path());
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent").join("profile.csv");
        assert!(matches!(
            ProfileWatcher::watch(&path),
            Err(ChamberError::ProfileIo { .. })
        ));
    }
}
