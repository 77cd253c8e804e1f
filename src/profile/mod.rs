//! Temperature profiles: parsing, evaluation and editing.

pub mod editor;
pub mod evaluator;
pub mod reader;
pub mod types;
pub mod watcher;
pub mod writer;

pub use evaluator::ProfileEvaluator;
pub use types::{Profile, ProfileSetpoint};
pub use watcher::ProfileWatcher;
