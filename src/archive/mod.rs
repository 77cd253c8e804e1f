//! Session archives: one zip per measurement.
//!
//! # Layout
//!
//! - `measurement.csv` - the full record log
//! - `<profile file name>` - snapshot of the active profile, if any
//! - `figures/day<N>.png` - one rendered chart per period
//! - `session.json` - clock and profile state for resuming the session
//!
//! Entries a save does not replace are copied byte-for-byte from the
//! previous version of the archive.

mod store;

pub use store::{ArchiveContents, ArchiveStore, LoadedArchive};

pub const MEASUREMENT_ENTRY: &str = "measurement.csv";
pub const SESSION_ENTRY: &str = "session.json";
pub const FIGURES_PREFIX: &str = "figures/";

/// Archive entry name of the chart for `period_index`.
pub fn figure_name(period_index: u32) -> String {
    format!("{}day{}.png", FIGURES_PREFIX, period_index)
}

/// Period index of a figure entry name, if it is one.
pub fn figure_period(entry_name: &str) -> Option<u32> {
    entry_name
        .strip_prefix(FIGURES_PREFIX)?
        .strip_prefix("day")?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_figure_names() {
        assert_eq!(figure_name(3), "figures/day3.png");
        assert_eq!(figure_period("figures/day12.png"), Some(12));
        assert_eq!(figure_period("figures/notes.txt"), None);
        assert_eq!(figure_period("measurement.csv"), None);
    }
}
