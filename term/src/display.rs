use std::io::{self, Stdout, Write};

use chip::{devices::DisplayCommands, display::DisplayBuffer};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::definitions::display;

/// Owns the terminal for as long as it lives, everything is restored on drop.
pub struct TerminalSession {
    enhanced: bool,
}

impl TerminalSession {
    /// Will enter raw mode and the alternate screen.
    ///
    /// Key release reporting is requested when `enhanced` is set.
    pub fn enter(enhanced: bool) -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        crossterm::execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        if enhanced {
            crossterm::execute!(
                out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        log::debug!("terminal session entered (key releases: {})", enhanced);
        Ok(Self { enhanced })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let mut out = io::stdout();
        if self.enhanced {
            let _ = crossterm::execute!(out, PopKeyboardEnhancementFlags);
        }
        let _ = crossterm::execute!(out, Show, LeaveAlternateScreen);
        if let Err(err) = terminal::disable_raw_mode() {
            log::error!("unable to leave the raw mode: {}", err);
        }
    }
}

/// Will turn the display buffer into text rows, two pixel rows per text row and
/// `scale` columns per pixel.
pub fn render(buffer: &DisplayBuffer, scale: u16) -> Vec<String> {
    let scale = scale.max(1) as usize;
    let rows: Vec<&[bool]> = buffer.rows().collect();

    rows.chunks(display::ROWS_PER_CELL)
        .map(|pair| {
            let upper = pair[0];
            let lower = pair.get(1).copied();
            let mut line = String::with_capacity(upper.len() * scale * 3);
            for (column, &top) in upper.iter().enumerate() {
                let bottom = lower.map_or(false, |row| row[column]);
                let cell = match (top, bottom) {
                    (true, true) => display::FULL,
                    (true, false) => display::UPPER,
                    (false, true) => display::LOWER,
                    (false, false) => display::EMPTY,
                };
                line.extend(std::iter::repeat(cell).take(scale));
            }
            line
        })
        .collect()
}

/// Presents the display buffer on stdout.
pub struct TerminalDisplay {
    scale: u16,
    out: Stdout,
    /// The last presented rows, only changed rows are written.
    last: Vec<String>,
}

impl TerminalDisplay {
    pub fn new(scale: u16) -> Self {
        Self {
            scale,
            out: io::stdout(),
            last: Vec::new(),
        }
    }

    fn draw(&mut self, lines: Vec<String>) -> io::Result<()> {
        for (row, line) in lines.iter().enumerate() {
            if self.last.get(row) == Some(line) {
                continue;
            }
            crossterm::queue!(self.out, MoveTo(0, row as u16), Print(line))?;
        }
        self.out.flush()?;
        self.last = lines;
        Ok(())
    }
}

impl DisplayCommands for TerminalDisplay {
    fn present(&mut self, buffer: &DisplayBuffer) {
        let lines = render(buffer, self.scale);
        if let Err(err) = self.draw(lines) {
            log::warn!("unable to draw the frame: {}", err);
            // force a full redraw next time
            self.last.clear();
        }
    }
}
