//! Command composer widget with slash command autocomplete.
//!
//! This widget provides a text input field for entering commands, with
//! autocomplete suggestions when the user types a slash command.

use crossterm::event::{KeyCode, KeyEvent};
use mm_core::logs::LogFilter;
use mm_protocol::Op;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::event::EventStatus;

/// Available slash commands with their descriptions.
const COMMANDS: &[(&str, &str)] = &[
    ("/run <company> [limit]", "Start gathering mentions"),
    ("/select <company>", "Show a company's progress"),
    ("/refresh", "Reload processes and logs"),
    ("/logs", "Fetch the selected log now"),
    ("/filter <all|info|warning|error>", "Filter log lines"),
    ("/quit", "Exit"),
];

/// What a submitted command asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerCommand {
    /// Forward to the monitor session.
    Op(Op),
    /// Change the log filter locally.
    Filter(LogFilter),
    Quit,
}

/// Command composer state.
#[derive(Debug, Clone)]
pub struct CommandComposer {
    /// Current input text
    input: String,
    /// Cursor position as a byte offset on a char boundary
    cursor_pos: usize,
    /// Whether autocomplete popup should be shown
    show_popup: bool,
    /// Selected index in the autocomplete list
    selected_index: usize,
}

impl Default for CommandComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandComposer {
    pub fn new() -> Self {
        Self {
            input: String::new(),
            cursor_pos: 0,
            show_popup: false,
            selected_index: 0,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn should_show_popup(&self) -> bool {
        self.show_popup
    }

    /// Get filtered command suggestions based on current input.
    pub fn suggestions(&self) -> Vec<(&'static str, &'static str)> {
        if !self.input.starts_with('/') {
            return Vec::new();
        }

        let filter = self.input.trim();
        if filter == "/" {
            return COMMANDS.to_vec();
        }

        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(filter))
            .copied()
            .collect()
    }

    pub fn selected_suggestion(&self) -> Option<(&'static str, &'static str)> {
        self.suggestions().get(self.selected_index).copied()
    }

    /// Insert a character at the cursor position.
    pub fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
        self.update_popup_state();
    }

    /// Insert pasted text at the cursor, dropping line breaks.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| *c != '\n' && *c != '\r') {
            self.insert_char(c);
        }
    }

    /// Delete the character before the cursor (backspace).
    pub fn delete_char(&mut self) {
        if let Some((index, _)) = self.input[..self.cursor_pos].char_indices().next_back() {
            self.input.remove(index);
            self.cursor_pos = index;
            self.update_popup_state();
        }
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
        self.show_popup = false;
        self.selected_index = 0;
    }

    pub fn move_cursor_left(&mut self) {
        if let Some((index, _)) = self.input[..self.cursor_pos].char_indices().next_back() {
            self.cursor_pos = index;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(c) = self.input[self.cursor_pos..].chars().next() {
            self.cursor_pos += c.len_utf8();
        }
    }

    pub fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.suggestions().len() {
            self.selected_index += 1;
        }
    }

    /// Complete with the currently selected suggestion (Tab key).
    pub fn complete_with_selection(&mut self) {
        if let Some((cmd, _)) = self.selected_suggestion() {
            let cmd_name = cmd.split_whitespace().next().unwrap_or(cmd);
            self.input = format!("{} ", cmd_name);
            self.cursor_pos = self.input.len();
            self.show_popup = false;
            self.selected_index = 0;
        }
    }

    fn update_popup_state(&mut self) {
        self.show_popup = self.input.starts_with('/') && !self.input.contains(' ');

        let suggestions = self.suggestions();
        if self.selected_index >= suggestions.len() {
            self.selected_index = suggestions.len().saturating_sub(1);
        }
    }

    /// Handle editing keys. Enter is left to the caller.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> EventStatus {
        match key.code {
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Esc => self.clear(),
            KeyCode::Tab if self.show_popup => self.complete_with_selection(),
            KeyCode::Up if self.show_popup => self.move_selection_up(),
            KeyCode::Down if self.show_popup => self.move_selection_down(),
            _ => return EventStatus::NotConsumed,
        }
        EventStatus::Consumed
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Command (q to quit, f to filter, r to refresh)");

        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(format!("> {}", self.input))
            .style(Style::default().fg(Color::Yellow))
            .render(inner, buf);
    }

    /// Render the autocomplete popup.
    pub fn render_popup(&self, area: Rect, buf: &mut Buffer) {
        if !self.show_popup {
            return;
        }

        let suggestions = self.suggestions();
        if suggestions.is_empty() {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Suggestions")
            .style(Style::default().bg(Color::Black));

        let inner = block.inner(area);
        block.render(area, buf);

        for (i, (cmd, desc)) in suggestions.iter().enumerate() {
            let y = inner.y + i as u16;
            if y >= inner.y + inner.height {
                break;
            }

            let style = if i == self.selected_index {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let line = Line::from(vec![
                Span::styled(format!("{:<36}", cmd), style),
                Span::styled(desc.to_string(), style.fg(Color::Gray)),
            ]);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }

    /// Parse the current input.
    ///
    /// Returns Ok(None) for blank input and Err with a message for anything
    /// that is not a valid command. Company names may contain spaces; for
    /// `/run` a trailing number is taken as the mention limit.
    pub fn parse_command(&self) -> Result<Option<ComposerCommand>, String> {
        let input = self.input.trim();
        if input.is_empty() {
            return Ok(None);
        }
        if !input.starts_with('/') {
            return Err("Invalid command. Commands must start with '/'".to_string());
        }

        let (cmd, rest) = input.split_once(' ').unwrap_or((input, ""));
        let rest = rest.trim();

        match cmd {
            "/run" => {
                if rest.is_empty() {
                    return Err("Missing company name".to_string());
                }
                let (company, limit) = match rest.rsplit_once(' ') {
                    Some((company, last)) => match last.parse::<u32>() {
                        Ok(limit) => (company.trim(), Some(limit)),
                        Err(_) => (rest, None),
                    },
                    None => (rest, None),
                };
                Ok(Some(ComposerCommand::Op(Op::RunCompany {
                    company: company.to_string(),
                    limit,
                    all_steps: None,
                })))
            }
            "/select" => {
                if rest.is_empty() {
                    return Err("Missing company name".to_string());
                }
                Ok(Some(ComposerCommand::Op(Op::SelectCompany {
                    company: Some(rest.to_string()),
                })))
            }
            "/refresh" => Ok(Some(ComposerCommand::Op(Op::RefreshAll))),
            "/logs" => Ok(Some(ComposerCommand::Op(Op::RefreshLogs))),
            "/filter" => {
                let filter = if rest.is_empty() {
                    LogFilter::All
                } else {
                    rest.parse::<LogFilter>()?
                };
                Ok(Some(ComposerCommand::Filter(filter)))
            }
            "/quit" => Ok(Some(ComposerCommand::Quit)),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> CommandComposer {
        let mut composer = CommandComposer::new();
        for c in text.chars() {
            composer.insert_char(c);
        }
        composer
    }

    #[test]
    fn test_new_composer_is_empty() {
        let composer = CommandComposer::new();
        assert_eq!(composer.input(), "");
        assert!(!composer.should_show_popup());
    }

    #[test]
    fn test_typing_slash_shows_all_commands() {
        let composer = typed("/");

        assert!(composer.should_show_popup());
        assert_eq!(composer.suggestions().len(), COMMANDS.len());
    }

    #[test]
    fn test_typing_filters_suggestions() {
        let composer = typed("/re");

        let suggestions = composer.suggestions();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].0, "/refresh");
    }

    #[test]
    fn test_no_suggestions_for_non_slash_input() {
        let composer = typed("hello");
        assert!(!composer.should_show_popup());
        assert!(composer.suggestions().is_empty());
    }

    #[test]
    fn test_popup_hides_after_space() {
        let composer = typed("/run ");
        assert!(!composer.should_show_popup());
    }

    #[test]
    fn test_backspace_handles_multibyte_chars() {
        let mut composer = typed("/run Café");
        composer.delete_char();
        assert_eq!(composer.input(), "/run Caf");

        composer.move_cursor_left();
        composer.insert_char('ñ');
        assert_eq!(composer.input(), "/run Cañf");
    }

    #[test]
    fn test_tab_completion() {
        let mut composer = typed("/se");
        composer.complete_with_selection();

        assert_eq!(composer.input(), "/select ");
        assert!(!composer.should_show_popup());
    }

    #[test]
    fn test_selection_navigation() {
        let mut composer = typed("/");
        composer.move_selection_down();
        composer.move_selection_down();
        assert_eq!(composer.selected_suggestion().map(|s| s.0), Some("/refresh"));

        composer.move_selection_up();
        composer.move_selection_up();
        composer.move_selection_up();
        assert_eq!(
            composer.selected_suggestion().map(|s| s.0),
            Some("/run <company> [limit]")
        );
    }

    #[test]
    fn test_parse_run_with_limit() {
        assert_eq!(
            typed("/run Acme Corp 250").parse_command(),
            Ok(Some(ComposerCommand::Op(Op::RunCompany {
                company: "Acme Corp".to_string(),
                limit: Some(250),
                all_steps: None,
            })))
        );
    }

    #[test]
    fn test_parse_run_without_limit() {
        assert_eq!(
            typed("/run Acme Corp").parse_command(),
            Ok(Some(ComposerCommand::Op(Op::RunCompany {
                company: "Acme Corp".to_string(),
                limit: None,
                all_steps: None,
            })))
        );
    }

    #[test]
    fn test_parse_missing_company() {
        assert!(typed("/run").parse_command().is_err());
        assert!(typed("/select   ").parse_command().is_err());
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            typed("/filter error").parse_command(),
            Ok(Some(ComposerCommand::Filter(LogFilter::Error)))
        );
        assert_eq!(
            typed("/filter").parse_command(),
            Ok(Some(ComposerCommand::Filter(LogFilter::All)))
        );
        assert!(typed("/filter verbose").parse_command().is_err());
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(
            typed("/refresh").parse_command(),
            Ok(Some(ComposerCommand::Op(Op::RefreshAll)))
        );
        assert_eq!(
            typed("/logs").parse_command(),
            Ok(Some(ComposerCommand::Op(Op::RefreshLogs)))
        );
        assert_eq!(typed("/quit").parse_command(), Ok(Some(ComposerCommand::Quit)));
    }

    #[test]
    fn test_parse_empty_and_invalid() {
        assert_eq!(CommandComposer::new().parse_command(), Ok(None));
        assert!(typed("/bogus").parse_command().is_err());
        assert!(typed("run Acme").parse_command().is_err());
    }

    #[test]
    fn test_handle_key_event_consumes_editing_keys() {
        let mut composer = CommandComposer::new();
        assert_eq!(
            composer.handle_key_event(KeyEvent::from(KeyCode::Char('/'))),
            EventStatus::Consumed
        );
        assert_eq!(
            composer.handle_key_event(KeyEvent::from(KeyCode::Enter)),
            EventStatus::NotConsumed
        );

        composer.handle_key_event(KeyEvent::from(KeyCode::Esc));
        assert!(composer.is_empty());
        assert_eq!(
            composer.handle_key_event(KeyEvent::from(KeyCode::Up)),
            EventStatus::NotConsumed
        );
    }
}
