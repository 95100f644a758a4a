//! Event handling utilities for the TUI.
//!
//! This module provides functions for handling:
//! - Session events (record updates, log content, errors)
//! - Keyboard events (navigation, scrolling, command submission)

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use mm_core::logs::LogFilter;
use mm_protocol::{Event, Op, ProcessRecord};
use tokio::sync::mpsc::UnboundedSender;

use crate::widgets::{CommandComposer, ComposerCommand, DetailView};

/// Lines moved by PageUp/PageDown.
const PAGE_LINES: usize = 10;

/// What the view currently knows, built purely from session events.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub records: Vec<ProcessRecord>,
    pub selected: Option<String>,
    pub log: String,
    pub log_filter: LogFilter,
    /// Last notice or error shown in the status bar.
    pub notice: Option<String>,
    pub status_polling: bool,
}

impl ViewState {
    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        self.records.iter().position(|r| &r.company == selected)
    }

    pub fn selected_record(&self) -> Option<&ProcessRecord> {
        self.selected_index().map(|i| &self.records[i])
    }

    /// Largest useful scroll offset of the log for a viewport of `height` lines.
    pub fn max_log_offset(&self, height: usize) -> usize {
        self.log_filter
            .apply(&self.log)
            .lines()
            .count()
            .saturating_sub(height)
    }
}

/// Apply an event from the monitor session.
pub fn handle_core_event(state: &mut ViewState, detail: &mut DetailView, event: Event) {
    match event {
        Event::ProcessesUpdated { records } => {
            state.status_polling |= records.iter().any(|r| !r.is_completed);
            state.records = records;
        }
        Event::SelectionChanged { company } => {
            state.selected = company;
        }
        Event::LogCleared { company } => {
            state.log.clear();
            if company != state.selected {
                detail.reset();
            }
        }
        Event::LogReplaced { company, content } => {
            // Content for anything but the current selection is ignored.
            if state.selected.as_deref() == Some(company.as_str()) {
                state.log = content;
            }
        }
        Event::StatusPollFailed { company, error } => {
            state.notice = Some(format!("Status check failed for {}: {}", company, error));
        }
        Event::ProcessCompleted { company } => {
            state.notice = Some(format!("{} is ready", company));
        }
        Event::ProcessStarted { company } => {
            state.notice = Some(format!("Started processing {}", company));
        }
        Event::StatusPollingStopped => {
            state.status_polling = false;
        }
        Event::Error { message } => {
            state.notice = Some(message);
        }
    }
}

fn send(op_tx: &UnboundedSender<Op>, op: Op) {
    if let Err(e) = op_tx.send(op) {
        tracing::debug!(op = ?e.0, "session receiver dropped");
    }
}

/// Move the selection by `delta` rows and ask the session to follow.
fn move_selection(state: &ViewState, delta: isize, op_tx: &UnboundedSender<Op>) {
    if state.records.is_empty() {
        return;
    }
    let last = state.records.len() - 1;
    let next = match state.selected_index() {
        Some(current) => current.saturating_add_signed(delta).min(last),
        None => 0,
    };
    if state.selected_index() != Some(next) {
        send(
            op_tx,
            Op::SelectCompany {
                company: Some(state.records[next].company.clone()),
            },
        );
    }
}

/// Handle a keyboard event from the user.
///
/// Returns `true` if the application should exit.
pub fn handle_keyboard_event(
    key_event: KeyEvent,
    state: &mut ViewState,
    composer: &mut CommandComposer,
    detail: &mut DetailView,
    log_height: usize,
    op_tx: &UnboundedSender<Op>,
) -> bool {
    if key_event.kind != KeyEventKind::Press {
        return false;
    }
    if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if composer.is_empty() {
        match key_event.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('f') => {
                state.log_filter = state.log_filter.cycle();
                return false;
            }
            KeyCode::Char('r') => {
                send(op_tx, Op::RefreshAll);
                return false;
            }
            _ => {}
        }
    }

    if key_event.code == KeyCode::Enter {
        return submit_command(state, composer, op_tx);
    }
    if composer.handle_key_event(key_event).is_consumed() {
        return false;
    }

    let max_offset = state.max_log_offset(log_height);
    match key_event.code {
        KeyCode::Up => move_selection(state, -1, op_tx),
        KeyCode::Down => move_selection(state, 1, op_tx),
        KeyCode::PageUp => detail.scroll_up(PAGE_LINES, max_offset),
        KeyCode::PageDown => detail.scroll_down(PAGE_LINES, max_offset),
        KeyCode::Home => detail.scroll_to_top(),
        KeyCode::End => detail.scroll_to_bottom(),
        _ => {}
    }
    false
}

/// Submit the composer's input. Returns `true` for `/quit`.
fn submit_command(state: &mut ViewState, composer: &mut CommandComposer, op_tx: &UnboundedSender<Op>) -> bool {
    let parsed = composer.parse_command();
    composer.clear();

    match parsed {
        Ok(Some(ComposerCommand::Op(op))) => {
            send(op_tx, op);
            false
        }
        Ok(Some(ComposerCommand::Filter(filter))) => {
            state.log_filter = filter;
            false
        }
        Ok(Some(ComposerCommand::Quit)) => true,
        Ok(None) => false,
        Err(message) => {
            state.notice = Some(message);
            false
        }
    }
}
