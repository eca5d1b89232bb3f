use crate::mach::{TextConsole, Window, TEXT_WINDOW_SIZE};
use std::io::Write;
use tracing::warn;

const COLUMNS: usize = 20;
const ROWS: usize = TEXT_WINDOW_SIZE / COLUMNS;

/// ## Text console
///
/// A 20x8 grid of byte cells backed by the text window, so programs can
/// also poke characters straight into memory. Double-byte characters take
/// two cells and never split across a line. Writing past the last row
/// scrolls the grid up.

pub struct Console {
    window: Window,
    row: usize,
    col: usize,
    mode: u8,
    out: Option<Box<dyn Write + Send>>,
}

impl Default for Console {
    fn default() -> Console {
        Console {
            window: Window::new(TEXT_WINDOW_SIZE),
            row: 0,
            col: 0,
            mode: 0,
            out: None,
        }
    }
}

impl Console {
    pub fn new() -> Console {
        Console::default()
    }

    pub fn with_output(mut self, out: Box<dyn Write + Send>) -> Console {
        self.out = Some(out);
        self
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn mode(&self) -> u8 {
        self.mode
    }

    /// One line of the grid. Double-byte cells show as a shaded block.
    pub fn line(&self, row: usize) -> String {
        let cells: Vec<u8> = (0..COLUMNS).map(|c| self.window.get(row * COLUMNS + c)).collect();
        let mut line = String::new();
        let mut i = 0;
        while i < cells.len() {
            match cells[i] {
                0 => line.push(' '),
                b if b < 0x80 && (b.is_ascii_graphic() || b == b' ') => line.push(b as char),
                b if b >= 0x80 => {
                    line.push('▒');
                    i += 1;
                }
                _ => line.push('?'),
            }
            i += 1;
        }
        line
    }

    fn scroll(&mut self) {
        let bytes = self.window.snapshot();
        for (i, b) in bytes.iter().skip(COLUMNS).enumerate() {
            self.window.set(i, *b);
        }
        for i in (ROWS - 1) * COLUMNS..ROWS * COLUMNS {
            self.window.set(i, 0);
        }
        self.row = ROWS - 1;
    }

    fn newline(&mut self) {
        self.col = 0;
        self.row += 1;
        if self.row >= ROWS {
            self.scroll();
        }
    }

    fn put(&mut self, b: u8) {
        self.window.set(self.row * COLUMNS + self.col, b);
        self.col += 1;
    }
}

impl TextConsole for Console {
    fn text_window(&self) -> Option<Window> {
        Some(self.window.clone())
    }

    fn add_char(&mut self, c: u16) {
        if c == u16::from(b'\n') {
            return self.newline();
        }
        let width = if c > 0xff { 2 } else { 1 };
        if self.col + width > COLUMNS {
            self.newline();
        }
        if c > 0xff {
            self.put(c as u8);
            self.put((c >> 8) as u8);
        } else {
            self.put(c as u8);
        }
        if self.col >= COLUMNS {
            self.newline();
        }
    }

    fn update_lcd(&mut self, _mode: i32) {
        let lines: Vec<String> = (0..ROWS).map(|row| self.line(row)).collect();
        if let Some(out) = self.out.as_mut() {
            let mut frame = String::from("\x1b[H");
            for line in lines {
                frame.push_str(&line);
                frame.push_str("\x1b[K\r\n");
            }
            if let Err(error) = out.write_all(frame.as_bytes()).and_then(|_| out.flush()) {
                warn!("console: {}", error);
            }
        }
    }

    fn set_text_mode(&mut self, mode: u8) {
        self.mode = mode;
        if mode & 0x80 == 0 {
            self.window.fill(0);
            self.row = 0;
            self.col = 0;
        }
    }

    fn set_location(&mut self, row: u8, col: u8) {
        self.row = (row as usize).min(ROWS - 1);
        self.col = (col as usize).min(COLUMNS - 1);
    }
}
