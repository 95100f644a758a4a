//! Fixed-period background tasks.
//!
//! Both timers of a monitor session (status polling and log polling) are
//! `PollTask`s. A task owns its tokio task handle, so cancelling it is a
//! matter of dropping or shutting down the handle.

pub mod task;

pub use task::{PollTask, TickOutcome};
