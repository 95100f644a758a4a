//! Stage resolution and progress derivation.
//!
//! Every value a view shows about pipeline progress is derived from the
//! status label alone through the functions in this module. Matching is
//! exact: no trimming, no case folding.

use mm_protocol::stage_models::{Stage, StageState, STATUS_STEPS, TERMINAL_STATUS};

/// Result of looking a status label up in the stage table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageLookup {
    /// The label belongs to the stage at `index`.
    Known { index: usize, stage: &'static Stage },
    /// The label is not in the table.
    Unknown,
}

impl StageLookup {
    pub fn from_label(label: &str) -> Self {
        STATUS_STEPS
            .iter()
            .enumerate()
            .find(|(_, stage)| stage.status_label == label)
            .map_or(StageLookup::Unknown, |(index, stage)| StageLookup::Known {
                index,
                stage,
            })
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            StageLookup::Known { index, .. } => Some(*index),
            StageLookup::Unknown => None,
        }
    }
}

/// Looks up the stage whose status label equals `label`.
pub fn resolve_stage(label: &str) -> Option<&'static Stage> {
    match StageLookup::from_label(label) {
        StageLookup::Known { stage, .. } => Some(stage),
        StageLookup::Unknown => None,
    }
}

/// Whether `label` is the terminal stage's label.
pub fn is_terminal(label: &str) -> bool {
    label == TERMINAL_STATUS
}

/// Classifies `stage` relative to the current status.
///
/// The terminal label marks every stage, itself included, as completed.
/// An unknown label leaves every stage pending.
pub fn classify_stage(stage: &Stage, current_label: &str) -> StageState {
    if is_terminal(current_label) {
        return StageState::Completed;
    }

    let Some(current) = StageLookup::from_label(current_label).index() else {
        return StageState::Pending;
    };
    let Some(position) = STATUS_STEPS.iter().position(|s| s.id == stage.id) else {
        return StageState::Pending;
    };

    match position.cmp(&current) {
        std::cmp::Ordering::Less => StageState::Completed,
        std::cmp::Ordering::Equal => StageState::Processing,
        std::cmp::Ordering::Greater => StageState::Pending,
    }
}

/// Progress percentage for the current status, 0 when unknown.
pub fn compute_progress(current_label: &str) -> u8 {
    if is_terminal(current_label) {
        return STATUS_STEPS[STATUS_STEPS.len() - 1].progress;
    }
    resolve_stage(current_label).map_or(0, |stage| stage.progress)
}

/// Every stage in order with its classification.
pub fn stage_states(current_label: &str) -> Vec<(&'static Stage, StageState)> {
    STATUS_STEPS
        .iter()
        .map(|stage| (stage, classify_stage(stage, current_label)))
        .collect()
}
