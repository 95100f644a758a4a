//! Key routing status shared by the widgets.

/// Whether a widget handled a key.
///
/// The app offers each key to the composer first; keys it leaves
/// `NotConsumed` fall through to the global bindings (selection, scrolling,
/// quit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Consumed,
    NotConsumed,
}

impl EventStatus {
    pub fn is_consumed(self) -> bool {
        self == EventStatus::Consumed
    }
}
