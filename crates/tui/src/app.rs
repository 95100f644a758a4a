//! TUI application state and event loop.
//!
//! This module defines the main `App` struct that manages the TUI state
//! and the event loop using `tokio::select!`.

use anyhow::Result;
use crossterm::event::KeyEvent;
use mm_protocol::{Event, Op};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_stream::StreamExt;

use crate::event_handler::{self, ViewState};
use crate::tui::{Tui, TuiEvent};
use crate::widgets::{render_dashboard, CommandComposer, DetailView};

/// Redraw at least this often so "Updated" times and the clock stay current.
const IDLE_REDRAW: Duration = Duration::from_secs(1);

/// Main TUI application state.
pub struct App {
    pub state: ViewState,
    pub composer: CommandComposer,
    pub detail: DetailView,
    /// Rows of the terminal at the last draw.
    pub terminal_height: u16,
    /// Channel to send operations to the session.
    pub op_tx: UnboundedSender<Op>,
    /// Channel to receive events from the session.
    pub event_rx: UnboundedReceiver<Event>,
    pub should_exit: bool,
}

/// Split the screen into dashboard, detail, status line and composer.
fn screen_layout(area: Rect) -> [Rect; 4] {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35), // Dashboard
            Constraint::Min(6),         // Detail
            Constraint::Length(1),      // Status line
            Constraint::Length(3),      // Command input
        ])
        .areas(area)
}

impl App {
    pub fn new(op_tx: UnboundedSender<Op>, event_rx: UnboundedReceiver<Event>) -> Self {
        Self {
            state: ViewState::default(),
            composer: CommandComposer::new(),
            detail: DetailView::new(),
            terminal_height: 24,
            op_tx,
            event_rx,
            should_exit: false,
        }
    }

    /// Main event loop.
    ///
    /// Uses `tokio::select!` to handle keyboard input and session events concurrently.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        let mut tui_events = tui.event_stream();
        let frames = tui.frame_requester();
        frames.schedule_frame();

        while !self.should_exit {
            select! {
                Some(event) = self.event_rx.recv() => {
                    self.handle_core_event(event);
                    frames.schedule_frame();
                }
                Some(tui_event) = tui_events.next() => {
                    match tui_event {
                        TuiEvent::Key(key_event) => {
                            self.handle_key_event(key_event);
                            frames.schedule_frame();
                        }
                        TuiEvent::Paste(text) => {
                            self.composer.insert_str(&text);
                            frames.schedule_frame();
                        }
                        TuiEvent::Draw => {
                            tui.draw(|frame| self.render(frame))?;
                            self.terminal_height = tui.height();
                            frames.schedule_frame_in(IDLE_REDRAW);
                        }
                    }
                }
                else => break,
            }
        }

        Ok(())
    }

    fn handle_core_event(&mut self, event: Event) {
        event_handler::handle_core_event(&mut self.state, &mut self.detail, event);
    }

    /// Lines of log visible in the detail view for the current terminal height.
    fn log_viewport_height(&self) -> usize {
        let [_, detail, _, _] = screen_layout(Rect::new(0, 0, 80, self.terminal_height));
        detail.height.saturating_sub(2) as usize
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        let log_height = self.log_viewport_height();
        if event_handler::handle_keyboard_event(
            key_event,
            &mut self.state,
            &mut self.composer,
            &mut self.detail,
            log_height,
            &self.op_tx,
        ) {
            self.should_exit = true;
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let [dashboard, detail, status, command] = screen_layout(frame.area());

        render_dashboard(frame, dashboard, &self.state.records, self.state.selected_index());
        self.detail.render(
            frame,
            detail,
            self.state.selected_record(),
            &self.state.log,
            self.state.log_filter,
        );
        self.render_status_line(frame, status);
        self.composer.render(command, frame.buffer_mut());

        if self.composer.should_show_popup() {
            let height = (self.composer.suggestions().len() as u16 + 2).min(command.y);
            let popup = Rect::new(command.x, command.y.saturating_sub(height), command.width, height);
            self.composer.render_popup(popup, frame.buffer_mut());
        }
    }

    fn render_status_line(&self, frame: &mut Frame, area: Rect) {
        let polling = if self.state.status_polling {
            Span::styled(" polling ", Style::default().fg(Color::Black).bg(Color::Green))
        } else {
            Span::styled(" idle ", Style::default().fg(Color::Black).bg(Color::DarkGray))
        };
        let notice = Span::styled(
            format!(" {}", self.state.notice.as_deref().unwrap_or("")),
            Style::default().fg(Color::Yellow),
        );
        frame.render_widget(Paragraph::new(Line::from(vec![polling, notice])), area);
    }
}
