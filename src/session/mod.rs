//! The running measurement: clock, record log and session state.

pub mod clock;
pub mod log;
pub mod record;
pub mod state;

pub use clock::{
    ClockSnapshot, ManualTimeSource, PeriodSignal, SessionClock, SystemTimeSource, TimeSource,
};
pub use log::SessionLog;
pub use record::DataRecord;
pub use state::{SessionSnapshot, SessionState};
