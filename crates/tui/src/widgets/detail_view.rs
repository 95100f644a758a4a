//! Detail view of the selected company.
//!
//! The left column shows a progress gauge and the stage checklist, the
//! right column the (filtered) log with a scrollbar. The log follows new
//! content until the user scrolls up.

use mm_core::logs::{LineLevel, LogFilter};
use mm_core::stages::{compute_progress, stage_states};
use mm_protocol::process_models::ProcessRecord;
use mm_protocol::stage_models::StageState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

/// Widget for the selected company's progress and log.
#[derive(Debug, Clone)]
pub struct DetailView {
    /// Lines scrolled from the top while not following.
    pub scroll_offset: usize,
    /// Stick to the bottom of the log.
    pub follow: bool,
}

fn line_style(level: LineLevel) -> Style {
    match level {
        LineLevel::Error => Style::default().fg(Color::Red),
        LineLevel::Warning => Style::default().fg(Color::Yellow),
        LineLevel::Success => Style::default().fg(Color::Green),
        LineLevel::Info => Style::default().fg(Color::Cyan),
        LineLevel::Plain => Style::default(),
    }
}

fn stage_line(name: &str, state: StageState) -> Line<'static> {
    let (marker, style) = match state {
        StageState::Completed => ("✔", Style::default().fg(Color::Green)),
        StageState::Processing => (
            "…",
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
        StageState::Pending => ("○", Style::default().fg(Color::DarkGray)),
    };
    Line::from(vec![
        Span::styled(format!(" {} ", marker), style),
        Span::styled(name.to_string(), style),
    ])
}

impl DetailView {
    pub fn new() -> Self {
        Self {
            scroll_offset: 0,
            follow: true,
        }
    }

    /// Render the detail view.
    ///
    /// # Arguments
    ///
    /// * `frame` - The ratatui frame to render to
    /// * `area` - The area to render within
    /// * `record` - The selected record, if any
    /// * `log` - Current log content of the selection
    /// * `filter` - Which log lines to show
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        record: Option<&ProcessRecord>,
        log: &str,
        filter: LogFilter,
    ) {
        let Some(record) = record else {
            let paragraph = Paragraph::new("No company selected.")
                .block(Block::default().borders(Borders::ALL).title("Details"));
            frame.render_widget(paragraph, area);
            return;
        };

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(20)])
            .split(area);

        self.render_progress(frame, columns[0], record);
        self.render_log(frame, columns[1], record, log, filter);
    }

    fn render_progress(&self, frame: &mut Frame, area: Rect, record: &ProcessRecord) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let status = record.display_status();
        let progress = compute_progress(status);
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(record.company.as_str()))
            .gauge_style(Style::default().fg(if record.is_terminal() {
                Color::Green
            } else {
                Color::Blue
            }))
            .percent(u16::from(progress))
            .label(format!("{}%", progress));
        frame.render_widget(gauge, rows[0]);

        let lines: Vec<Line> = stage_states(status)
            .into_iter()
            .map(|(stage, state)| stage_line(stage.name, state))
            .collect();
        let checklist = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Stages - {}", status)),
        );
        frame.render_widget(checklist, rows[1]);
    }

    fn render_log(&self, frame: &mut Frame, area: Rect, record: &ProcessRecord, log: &str, filter: LogFilter) {
        let title = format!(
            "Log - {} [filter: {}]{}",
            record.log_file.as_deref().unwrap_or("not available"),
            filter,
            if self.follow { "" } else { " (paused)" }
        );
        let block = Block::default().borders(Borders::ALL).title(title);

        let filtered = filter.apply(log);
        if filtered.trim().is_empty() {
            let placeholder = if log.trim().is_empty() {
                "No logs available yet..."
            } else {
                "No lines match the filter."
            };
            frame.render_widget(Paragraph::new(placeholder).block(block), area);
            return;
        }

        let lines: Vec<Line> = filtered
            .lines()
            .map(|line| Line::styled(line.to_string(), line_style(LineLevel::classify(line))))
            .collect();
        let total_lines = lines.len();
        let visible_lines = area.height.saturating_sub(2) as usize;
        let max_offset = total_lines.saturating_sub(visible_lines);
        let offset = self.effective_offset(max_offset);

        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((offset.min(u16::MAX as usize) as u16, 0));
        frame.render_widget(paragraph, area);

        if total_lines > visible_lines {
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total_lines)
                .viewport_content_length(visible_lines)
                .position(offset);

            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }

    /// Scroll offset to render with, given the largest useful offset.
    pub fn effective_offset(&self, max_offset: usize) -> usize {
        if self.follow {
            max_offset
        } else {
            self.scroll_offset.min(max_offset)
        }
    }

    /// Scroll up by `lines`; stops following new output.
    ///
    /// `max` is the current largest offset, so scrolling up while following
    /// starts from the bottom.
    pub fn scroll_up(&mut self, lines: usize, max: usize) {
        let current = self.effective_offset(max);
        self.follow = false;
        self.scroll_offset = current.saturating_sub(lines);
    }

    /// Scroll down by `lines`; reaching the bottom resumes following.
    pub fn scroll_down(&mut self, lines: usize, max: usize) {
        if self.follow {
            return;
        }
        self.scroll_offset = (self.scroll_offset + lines).min(max);
        if self.scroll_offset >= max {
            self.follow = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.follow = false;
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
    }

    /// Start over for a new selection.
    pub fn reset(&mut self) {
        self.scroll_offset = 0;
        self.follow = true;
    }
}

impl Default for DetailView {
    fn default() -> Self {
        Self::new()
    }
}
