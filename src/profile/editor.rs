//! Data operations behind the profile editor: normalization, single-point
//! edits and periodic cycle generation.

use std::path::{Path, PathBuf};

use chrono::Duration;
use tracing::{info, warn};

use super::reader::read_profile;
use super::types::{Profile, ProfileSetpoint};
use super::writer::write_profile_atomic;
use crate::error::{ChamberError, Result};

/// Sort setpoints by offset and drop duplicate offsets.
///
/// The sort is stable, so of several setpoints sharing an offset the one
/// that appeared first in the input is kept.
pub fn normalize(mut setpoints: Vec<ProfileSetpoint>) -> Vec<ProfileSetpoint> {
    setpoints.sort_by_key(|setpoint| setpoint.offset);
    setpoints.dedup_by_key(|setpoint| setpoint.offset);
    setpoints
}

/// Normalize `setpoints` and save them as a profile at `path`.
pub fn save_profile(setpoints: Vec<ProfileSetpoint>, path: &Path) -> Result<Profile> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(super::types::DEFAULT_PROFILE_FILE);
    let profile = Profile::new(file_name, normalize(setpoints))?;
    write_profile_atomic(&profile, path)?;
    Ok(profile)
}

/// Insert `setpoint`, replacing an existing setpoint at the same offset.
pub fn set_setpoint(profile: &Profile, setpoint: ProfileSetpoint) -> Result<Profile> {
    let mut setpoints = vec![setpoint];
    setpoints.extend(
        profile
            .setpoints()
            .iter()
            .copied()
            .filter(|existing| existing.offset != setpoint.offset),
    );
    Profile::new(profile.file_name(), normalize(setpoints))
}

/// Remove the setpoint at `offset`. Removing the only setpoint fails.
pub fn remove_setpoint(profile: &Profile, offset: Duration) -> Result<Profile> {
    let setpoints: Vec<ProfileSetpoint> = profile
        .setpoints()
        .iter()
        .copied()
        .filter(|existing| existing.offset != offset)
        .collect();
    Profile::new(profile.file_name(), setpoints)
}

/// Repeat a closed-loop profile `num_cycles` times.
///
/// The base interval runs from the first to the last setpoint; cycle `i`
/// is shifted by `i` intervals. The first and last temperatures must match
/// so the cycles join without a step. Setpoints at or beyond `cap` after
/// the first setpoint are dropped.
pub fn generate_cycles(base: &Profile, num_cycles: u32, cap: Duration) -> Result<Profile> {
    if num_cycles < 2 {
        return Err(ChamberError::InvalidCycleCount(num_cycles));
    }

    let first = *base.first();
    let last = *base.last();
    if first.target_temp != last.target_temp {
        return Err(ChamberError::AsymmetricProfile {
            first: first.target_temp,
            last: last.target_temp,
        });
    }

    let period = base.span();
    let mut setpoints = vec![first];

    'cycles: for cycle in 0..num_cycles {
        let shift = period * cycle as i32;
        for setpoint in &base.setpoints()[1..] {
            let offset = setpoint.offset + shift;
            if offset - first.offset >= cap {
                break 'cycles;
            }
            setpoints.push(ProfileSetpoint::new(offset, setpoint.target_temp));
        }
    }

    Profile::new(base.file_name(), setpoints)
}

/// Path of the copy kept before a profile file is expanded into cycles.
pub fn cycles_backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("profile");
    path.with_file_name(format!("{}.before_cycles.csv", stem))
}

/// Expand the profile file at `path` into `num_cycles` cycles in place.
///
/// The precondition is checked before anything is written: on failure the
/// file is untouched. On success the original is copied to
/// [`cycles_backup_path`] first.
pub fn generate_cycles_in_file(path: &Path, num_cycles: u32, cap: Duration) -> Result<Profile> {
    let base = read_profile(path)?;
    let cycled = generate_cycles(&base, num_cycles, cap).inspect_err(|e| {
        warn!("Not generating cycles for {:?}: {}", path, e);
    })?;

    let backup = cycles_backup_path(path);
    write_profile_atomic(&base, &backup)?;
    write_profile_atomic(&cycled, path)?;

    info!(
        "Expanded {:?} into {} cycles ({} setpoints, backup at {:?})",
        path,
        num_cycles,
        cycled.len(),
        backup
    );
    Ok(cycled)
}
