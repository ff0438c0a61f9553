//! Line-oriented interactive browser
//!
//! Reads one command per line, applies it to the [`Session`], then redraws
//! the frame. While a command is fetching, the frame is redrawn on a short
//! tick from a snapshot of the previous state plus the session's live
//! loading flags. Fetch errors never end the loop; they show up in the
//! frame's error line until dismissed or replaced.

use crate::session::{Activity, Session};
use console::Term;
use litelog_core::error::Result;
use litelog_core::source::LogSource;
use litelog_core::types::{KeyToken, LogEntry, TimeWindow, VirtualKey};
use litelog_terminal::browser_view::{BrowserFrame, BrowserView};
use litelog_terminal::output::OutputFormatter;
use litelog_terminal::payload::PayloadView;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

/// Redraw interval while a fetch is running
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// One line of browser input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserCommand {
    FocusDown,
    FocusUp,
    SelectFocused,
    LoadOlder,
    ResetToLatest,
    Refresh,
    NextKey,
    PreviousKey,
    TogglePayloadView,
    DismissError,
    Quit,
}

impl BrowserCommand {
    /// Parse a trimmed input line; an empty line selects the focused entry
    pub fn parse(line: &str) -> Option<Self> {
        let command = match line.trim() {
            "j" | "down" => Self::FocusDown,
            "k" | "up" => Self::FocusUp,
            "" => Self::SelectFocused,
            "o" => Self::LoadOlder,
            "r" => Self::ResetToLatest,
            "R" => Self::Refresh,
            "n" => Self::NextKey,
            "p" => Self::PreviousKey,
            "f" => Self::TogglePayloadView,
            "e" => Self::DismissError,
            "q" | "quit" | "exit" => Self::Quit,
            _ => return None,
        };
        Some(command)
    }

    /// Whether the command goes to the gateway
    pub fn fetches(self) -> bool {
        matches!(
            self,
            Self::LoadOlder | Self::ResetToLatest | Self::Refresh | Self::NextKey | Self::PreviousKey
        )
    }
}

type CommandFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a>>;

/// The session call behind a fetching command
fn fetch_command<S: LogSource>(
    session: &mut Session<S>,
    command: BrowserCommand,
) -> CommandFuture<'_> {
    match command {
        BrowserCommand::LoadOlder => Box::pin(async move { session.load_older().await.map(drop) }),
        BrowserCommand::ResetToLatest => {
            Box::pin(async move { session.reset_to_latest().await.map(drop) })
        }
        BrowserCommand::Refresh => Box::pin(session.manual_refresh()),
        BrowserCommand::NextKey => {
            Box::pin(async move { session.select_adjacent_key(true).await.map(drop) })
        }
        BrowserCommand::PreviousKey => {
            Box::pin(async move { session.select_adjacent_key(false).await.map(drop) })
        }
        _ => Box::pin(std::future::ready(Ok(()))),
    }
}

/// What the screen showed when a fetch started
struct PendingFrame {
    keys: Vec<VirtualKey>,
    selected_key: Option<KeyToken>,
    entries: Arc<Vec<LogEntry>>,
    window: Option<TimeWindow>,
    focused: Option<String>,
    selected_entry: Option<String>,
    error: Option<String>,
    activity: Activity,
}

impl PendingFrame {
    fn capture<S: LogSource>(session: &Session<S>) -> Self {
        Self {
            keys: session.keys().to_vec(),
            selected_key: session.selected_key().cloned(),
            entries: session.shared_entries(),
            window: session.current_window(),
            focused: session.focused_id().map(str::to_string),
            selected_entry: session.selected_id().map(str::to_string),
            error: session.last_error().map(str::to_string),
            activity: session.activity(),
        }
    }

    /// Captured state under the current loading flags. After a key switch
    /// has started, the old key's entries are hidden.
    fn render(&self, view: &BrowserView) -> String {
        let selected_key = self.activity.selected_key();
        let same_key = selected_key == self.selected_key;
        let frame = BrowserFrame {
            keys: &self.keys,
            selected_key: selected_key.as_ref(),
            entries: if same_key { self.entries.as_slice() } else { &[] },
            window: self.window.filter(|_| same_key),
            focused: self.focused.as_deref().filter(|_| same_key),
            selected_entry: self.selected_entry.as_deref().filter(|_| same_key),
            is_loading_keys: self.activity.is_loading_keys(),
            is_loading_logs: self.activity.is_loading_logs(),
            is_paginating: self.activity.is_paginating(),
            error: self.error.as_deref(),
        };
        view.render(&frame)
    }
}

pub struct Browser<S> {
    session: Session<S>,
    view: BrowserView,
    formatter: Box<dyn OutputFormatter>,
    terminal: Option<Term>,
    payload_view: PayloadView,
    notice: Option<String>,
}

impl<S: LogSource> Browser<S> {
    pub fn new(session: Session<S>, view: BrowserView, formatter: Box<dyn OutputFormatter>) -> Self {
        Self {
            session,
            view,
            formatter,
            terminal: None,
            payload_view: PayloadView::default(),
            notice: None,
        }
    }

    /// Clear `terminal` before each frame
    pub fn with_terminal(mut self, terminal: Term) -> Self {
        self.terminal = Some(terminal);
        self
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn payload_view(&self) -> PayloadView {
        self.payload_view
    }

    /// Load the keys, then process commands from `input` until `q` or EOF
    pub async fn run<R, W>(&mut self, input: R, output: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        self.execute(BrowserCommand::Refresh, output).await?;
        self.draw(output)?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let Some(command) = BrowserCommand::parse(&line) else {
                self.notice = Some(format!("Unknown command: {}", line.trim()));
                self.draw(output)?;
                continue;
            };
            if command == BrowserCommand::Quit {
                break;
            }
            self.notice = None;
            self.execute(command, output).await?;
            self.draw(output)?;
        }
        Ok(())
    }

    /// Apply one command, drawing progress frames to `output` while it
    /// fetches. The final frame is left to the caller.
    pub async fn execute<W: Write>(
        &mut self,
        command: BrowserCommand,
        output: &mut W,
    ) -> Result<()> {
        if !command.fetches() {
            self.apply_local(command);
            return Ok(());
        }

        let pending = PendingFrame::capture(&self.session);
        let mut fetch = fetch_command(&mut self.session, command);

        let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
        loop {
            tokio::select! {
                biased;
                result = &mut fetch => {
                    settle(result);
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let frame = pending.render(&self.view);
                    write_frame(self.terminal.as_ref(), output, &frame)?;
                }
            }
        }
    }

    /// Apply one command to the session without drawing
    pub async fn apply(&mut self, command: BrowserCommand) {
        if command.fetches() {
            settle(fetch_command(&mut self.session, command).await);
        } else {
            self.apply_local(command);
        }
    }

    fn apply_local(&mut self, command: BrowserCommand) {
        match command {
            BrowserCommand::FocusDown => self.session.move_focus(true),
            BrowserCommand::FocusUp => self.session.move_focus(false),
            BrowserCommand::SelectFocused => self.session.select_focused_item(),
            BrowserCommand::TogglePayloadView => self.payload_view = self.payload_view.toggled(),
            BrowserCommand::DismissError => self.session.dismiss_error(),
            _ => {}
        }
    }

    /// Current frame plus the detail of the selected entry
    pub fn render(&self) -> String {
        let session = &self.session;
        let frame = BrowserFrame {
            keys: session.keys(),
            selected_key: session.selected_key(),
            entries: session.current_entries(),
            window: session.current_window(),
            focused: session.focused_id(),
            selected_entry: session.selected_id(),
            is_loading_keys: session.is_loading_keys(),
            is_loading_logs: session.is_loading_logs(),
            is_paginating: session.is_paginating(),
            error: session.last_error(),
        };

        let mut output = self.view.render(&frame);
        if let Some(notice) = &self.notice {
            output.push_str(notice);
            output.push('\n');
        }
        if let Some(entry) = session.selected_entry() {
            output.push('\n');
            output.push_str(&self.formatter.format_log_detail(entry, self.payload_view));
        }
        output
    }

    fn draw<W: Write>(&self, output: &mut W) -> Result<()> {
        write_frame(self.terminal.as_ref(), output, &self.render())
    }
}

fn write_frame<W: Write>(terminal: Option<&Term>, output: &mut W, frame: &str) -> Result<()> {
    if let Some(terminal) = terminal {
        terminal.clear_screen()?;
    }
    write!(output, "{frame}")?;
    output.flush()?;
    Ok(())
}

/// Errors are already in the session's error slot
fn settle(result: Result<()>) {
    if let Err(e) = result {
        debug!("Browser command failed: {}", e);
    }
}
