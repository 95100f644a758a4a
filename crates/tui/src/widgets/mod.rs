//! TUI widgets module.
//!
//! - `dashboard`: table of tracked companies
//! - `detail_view`: progress, stage checklist and log of the selection
//! - `command_composer`: slash command input

pub mod command_composer;
pub mod dashboard;
pub mod detail_view;

pub use command_composer::{CommandComposer, ComposerCommand};
pub use dashboard::render_dashboard;
pub use detail_view::DetailView;
