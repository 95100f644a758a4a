//! Dashboard widget listing every tracked company.
//!
//! One row per `ProcessRecord`: company, status label, progress, whether
//! the run is done, and when the status last changed.

use mm_core::stages::compute_progress;
use mm_protocol::process_models::{PollHealth, ProcessRecord};
use mm_protocol::stage_models::UNKNOWN_STATUS;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table, TableState};
use ratatui::Frame;

/// Colour of a status label: green once terminal, red when unknown, blue otherwise.
pub fn status_color(record: &ProcessRecord) -> Color {
    if record.is_terminal() {
        Color::Green
    } else if record.display_status() == UNKNOWN_STATUS {
        Color::Red
    } else {
        Color::Blue
    }
}

fn status_text(record: &ProcessRecord) -> String {
    match &record.health {
        PollHealth::Failing { .. } => format!("{} (stale)", record.display_status()),
        _ => record.display_status().to_string(),
    }
}

/// Renders the dashboard table.
///
/// # Arguments
/// * `frame` - The frame to render into
/// * `area` - The area to render the table in
/// * `records` - Every tracked record, in display order
/// * `selected` - Index of the selected record, if any
pub fn render_dashboard(frame: &mut Frame, area: Rect, records: &[ProcessRecord], selected: Option<usize>) {
    let rows: Vec<Row> = records
        .iter()
        .map(|record| {
            let (state, state_style) = if record.is_completed {
                ("Done", Style::default().fg(Color::Green))
            } else {
                ("Running", Style::default().fg(Color::Yellow))
            };

            Row::new(vec![
                Cell::from(record.company.clone()),
                Cell::from(status_text(record)).style(Style::default().fg(status_color(record))),
                Cell::from(format!("{:>3}%", compute_progress(record.display_status()))),
                Cell::from(state).style(state_style),
                Cell::from(record.last_updated.format("%H:%M:%S").to_string()),
            ])
        })
        .collect();

    let header = Row::new(vec![
        Cell::from("Company"),
        Cell::from("Status"),
        Cell::from("Progress"),
        Cell::from("State"),
        Cell::from("Updated"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan));

    let widths = [
        Constraint::Percentage(30),
        Constraint::Percentage(40),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(9),
    ];

    let title = if records.is_empty() {
        "Active Processes - none, use /run <company>".to_string()
    } else {
        format!("Active Processes ({})", records.len())
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut table_state = TableState::default();
    table_state.select(selected.filter(|i| *i < records.len()));

    frame.render_stateful_widget(table, area, &mut table_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn record(company: &str, status: &str) -> ProcessRecord {
        let now = Utc::now();
        ProcessRecord {
            company: company.to_string(),
            current_status: status.to_string(),
            is_completed: status == "RAG Retriever Ready",
            start_time: now,
            log_file: None,
            last_updated: now,
            health: PollHealth::Fresh,
        }
    }

    fn render(records: &[ProcessRecord], selected: Option<usize>) -> ratatui::buffer::Buffer {
        let backend = TestBackend::new(120, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_dashboard(frame, area, records, selected);
            })
            .unwrap();
        terminal.backend().buffer().clone()
    }

    fn content(buffer: &ratatui::buffer::Buffer) -> String {
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_render_empty_dashboard() {
        let text = content(&render(&[], None));

        assert!(text.contains("Company"));
        assert!(text.contains("Status"));
        assert!(text.contains("/run <company>"));
    }

    #[test]
    fn test_render_records() {
        let records = vec![
            record("Acme", "Info Gathering Completed"),
            record("Globex", "RAG Retriever Ready"),
        ];
        let text = content(&render(&records, Some(0)));

        assert!(text.contains("Acme"));
        assert!(text.contains("Info Gathering Completed"));
        assert!(text.contains(" 35%"));
        assert!(text.contains("Running"));
        assert!(text.contains("Done"));
        assert!(text.contains("100%"));
    }

    #[test]
    fn test_status_colors() {
        assert_eq!(status_color(&record("A", "RAG Retriever Ready")), Color::Green);
        assert_eq!(status_color(&record("A", "unknown")), Color::Red);
        assert_eq!(status_color(&record("A", "Started")), Color::Blue);

        let mut missing = record("A", "Started");
        missing.health = PollHealth::NotFound;
        assert_eq!(status_color(&missing), Color::Red);
    }

    #[test]
    fn test_failing_poll_is_marked_stale() {
        let mut stale = record("Acme", "Started");
        stale.health = PollHealth::Failing {
            error: "timeout".to_string(),
        };
        let text = content(&render(&[stale], None));

        assert!(text.contains("Started (stale)"));
    }

    #[test]
    fn test_selected_row_is_highlighted() {
        let records = vec![record("Acme", "Started"), record("Globex", "Started")];
        let buffer = render(&records, Some(1));

        let highlighted = (0..buffer.area().height).any(|y| {
            (0..buffer.area().width).any(|x| buffer[(x, y)].bg == Color::DarkGray)
        });
        assert!(highlighted, "selected row should be highlighted");
    }
}
