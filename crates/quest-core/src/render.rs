//! Live console view.

use std::io::Write;
use std::time::Duration;

use crossterm::{cursor::MoveToPreviousLine, queue, terminal::{self, Clear, ClearType}};
use owo_colors::OwoColorize;

use crate::progress::{ProgressBoard, StatusKind};

pub trait Render: Send {
    /// Redraw the whole board in place.
    fn board(&mut self, board: &ProgressBoard);
    /// Redraw the restart countdown in place.
    fn countdown(&mut self, remaining: Duration);
    /// Print a line below the live area and keep it.
    fn notice(&mut self, text: &str);
    /// Freeze whatever is on screen; the next draw starts below it.
    fn finish(&mut self);
}

pub const DEFAULT_COLUMNS: u16 = 80;

/// Redraws in place by moving the cursor up over the previous frame and clearing below.
pub struct Dashboard<W: Write> {
    out: W,
    color: bool,
    columns: u16,
    follow_terminal: bool,
    live_lines: usize,
}

impl Dashboard<std::io::Stdout> {
    /// Wraps at the terminal's current width, re-read on every draw.
    pub fn stdout() -> Self {
        let mut dash = Self::new(std::io::stdout(), true);
        dash.follow_terminal = true;
        dash
    }
}

impl<W: Write> Dashboard<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color, columns: DEFAULT_COLUMNS, follow_terminal: false, live_lines: 0 }
    }

    pub fn with_columns(mut self, columns: u16) -> Self {
        self.columns = columns.max(1);
        self
    }

    /// Terminal rows of the frame currently being kept live, wrapped lines included.
    pub fn live_lines(&self) -> usize {
        self.live_lines
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, frame: &str) {
        if let Err(e) = self.try_draw(frame) {
            tracing::warn!(target: "render", "redraw failed: {}", e);
        }
    }

    fn try_draw(&mut self, frame: &str) -> std::io::Result<()> {
        if self.live_lines > 0 {
            queue!(self.out, MoveToPreviousLine(self.live_lines.min(u16::MAX as usize) as u16), Clear(ClearType::FromCursorDown))?;
        }
        let columns = self.current_columns();
        let mut rows = 0;
        for line in frame.lines() {
            writeln!(self.out, "{line}")?;
            rows += wrapped_rows(line, columns);
        }
        self.live_lines = rows;
        self.out.flush()
    }

    fn current_columns(&self) -> u16 {
        if self.follow_terminal {
            if let Ok((cols, _)) = terminal::size() {
                if cols > 0 { return cols; }
            }
        }
        self.columns
    }

    fn paint(&self, text: &str, kind: StatusKind) -> String {
        if !self.color {
            return text.to_string();
        }
        match kind {
            StatusKind::Failed | StatusKind::FinishedWithErrors => text.red().to_string(),
            StatusKind::Completed => text.green().to_string(),
            StatusKind::Processing | StatusKind::Processed => text.to_string(),
        }
    }
}

impl<W: Write + Send> Render for Dashboard<W> {
    fn board(&mut self, board: &ProgressBoard) {
        let mut frame = String::new();
        for (wallet, entry) in board.rows() {
            let title = format!("Wallet: {wallet}");
            if self.color {
                frame.push_str(&title.blue().bold().to_string());
            } else {
                frame.push_str(&title);
            }
            frame.push('\n');
            frame.push_str(&format!("  Progress: {}/{}\n", entry.completed, entry.total));
            frame.push_str(&format!("  Status: {}\n", self.paint(&entry.status, entry.kind)));
            frame.push('\n');
        }
        self.draw(&frame);
    }

    fn countdown(&mut self, remaining: Duration) {
        let text = format!("Time until restart: {}", format_remaining(remaining));
        let frame = if self.color { text.yellow().to_string() } else { text };
        self.draw(&frame);
    }

    fn notice(&mut self, text: &str) {
        self.finish();
        let line = if self.color { text.yellow().to_string() } else { text.to_string() };
        if let Err(e) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
            tracing::warn!(target: "render", "notice failed: {}", e);
        }
    }

    fn finish(&mut self) {
        self.live_lines = 0;
    }
}

/// Rows `line` occupies once the terminal wraps it at `columns`. Escape sequences take no room.
pub fn wrapped_rows(line: &str, columns: u16) -> usize {
    let width = visible_width(line);
    let columns = usize::from(columns.max(1));
    width.div_ceil(columns).max(1)
}

fn visible_width(line: &str) -> usize {
    let mut width = 0;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            // CSI: ESC [ params final-byte
            if chars.next() == Some('[') {
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) { break; }
                }
            }
            continue;
        }
        width += 1;
    }
    width
}

/// `{h}h {m}m {s}s`, whole seconds.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}
