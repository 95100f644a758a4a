//! Terminal setup, input streaming and redraw scheduling.
//!
//! `Tui` owns the crossterm terminal. Redraw requests from anywhere in the
//! app go through a `FrameRequester`; a background task coalesces them so a
//! burst of session events produces a single draw.

use anyhow::Result;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste, Event, KeyEvent};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::pin::Pin;
use std::time::Duration;
use tokio::select;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tokio_stream::{Stream, StreamExt};

pub type TerminalBackend = CrosstermBackend<Stdout>;

/// Input and redraw events delivered to the app loop.
#[derive(Debug)]
pub enum TuiEvent {
    Key(KeyEvent),
    /// Text from a bracketed paste.
    Paste(String),
    /// Time to redraw.
    Draw,
}

pub struct Tui {
    terminal: Terminal<TerminalBackend>,
    frame_requester: FrameRequester,
    draw_tx: broadcast::Sender<()>,
}

impl Tui {
    /// Switch the terminal to raw mode on the alternate screen.
    pub fn init() -> Result<Self> {
        enable_raw_mode()?;
        execute!(stdout(), EnableBracketedPaste, EnterAlternateScreen)?;
        set_panic_hook();

        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

        let (schedule_tx, schedule_rx) = mpsc::unbounded_channel();
        let (draw_tx, _) = broadcast::channel(1);
        tokio::spawn(run_frame_scheduler(schedule_rx, draw_tx.clone()));

        Ok(Self {
            terminal,
            frame_requester: FrameRequester { schedule_tx },
            draw_tx,
        })
    }

    pub fn restore(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    pub fn frame_requester(&self) -> FrameRequester {
        self.frame_requester.clone()
    }

    /// Merge terminal input and scheduled draws into one stream.
    pub fn event_stream(&self) -> Pin<Box<dyn Stream<Item = TuiEvent> + Send + 'static>> {
        let mut input = crossterm::event::EventStream::new();
        let mut draw_rx = self.draw_tx.subscribe();

        let stream = async_stream::stream! {
            loop {
                select! {
                    Some(Ok(event)) = input.next() => {
                        match event {
                            Event::Key(key) => yield TuiEvent::Key(key),
                            Event::Paste(text) => yield TuiEvent::Paste(text),
                            Event::Resize(_, _) => yield TuiEvent::Draw,
                            _ => {}
                        }
                    }
                    result = draw_rx.recv() => {
                        match result {
                            // A lagged receiver still only needs one draw.
                            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => yield TuiEvent::Draw,
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
        };

        Box::pin(stream)
    }

    pub fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }

    /// Height of the terminal in rows.
    pub fn height(&self) -> u16 {
        self.terminal.size().map(|size| size.height).unwrap_or(24)
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Fire one draw at the earliest requested deadline, then wait for the next request.
async fn run_frame_scheduler(mut schedule_rx: mpsc::UnboundedReceiver<Instant>, draw_tx: broadcast::Sender<()>) {
    let mut deadline: Option<Instant> = None;

    loop {
        match deadline {
            Some(at) => {
                select! {
                    biased;
                    requested = schedule_rx.recv() => match requested {
                        Some(next) => deadline = Some(at.min(next)),
                        None => break,
                    },
                    _ = tokio::time::sleep_until(at) => {
                        deadline = None;
                        let _ = draw_tx.send(());
                    }
                }
            }
            None => match schedule_rx.recv().await {
                Some(next) => deadline = Some(next),
                None => break,
            },
        }
    }
}

/// Handle for requesting redraws.
#[derive(Clone, Debug)]
pub struct FrameRequester {
    schedule_tx: mpsc::UnboundedSender<Instant>,
}

impl FrameRequester {
    pub fn schedule_frame(&self) {
        let _ = self.schedule_tx.send(Instant::now());
    }

    pub fn schedule_frame_in(&self, delay: Duration) {
        let _ = self.schedule_tx.send(Instant::now() + delay);
    }
}

/// Restore the terminal before the default panic output.
fn set_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}
