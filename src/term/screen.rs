use crate::mach::{mode, region_len, Render, Window};
use std::collections::BTreeSet;
use std::io::Write;
use tracing::warn;

pub const MAX_LABELS: usize = 256;

/// ## 1bpp screen
///
/// A visible screen and a back buffer, each a host window the machine can
/// also address directly. Pixels are packed eight to a byte, most
/// significant bit first, rows padded to whole bytes. `refresh` copies the
/// buffer to the screen and paints the screen onto the terminal with
/// half-block characters, two pixel rows per line.
///
/// There is no font. Strings drawn with `draw_string` are kept as labels
/// and overlaid on the terminal picture. A new string replaces any label
/// at the same spot and only the latest `MAX_LABELS` are kept.

pub struct Screen {
    width: usize,
    height: usize,
    graph: Window,
    buffer: Window,
    mode: i32,
    labels: Vec<(i16, i16, String)>,
    out: Option<Box<dyn Write + Send>>,
}

impl Screen {
    pub fn new(width: usize, height: usize) -> Screen {
        let len = region_len(width as i16, height as i16);
        Screen {
            width,
            height,
            graph: Window::new(len),
            buffer: Window::new(len),
            mode: mode::COPY,
            labels: vec![],
            out: None,
        }
    }

    pub fn with_output(mut self, out: Box<dyn Write + Send>) -> Screen {
        self.out = Some(out);
        self
    }

    fn stride(&self) -> usize {
        (self.width + 7) / 8
    }

    fn locate(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        Some((y * self.stride() + x / 8, 0x80 >> (x % 8)))
    }

    fn target(&self) -> &Window {
        if self.mode & mode::GRAPH != 0 {
            &self.graph
        } else {
            &self.buffer
        }
    }

    fn read(window: &Window, index: usize, bit: u8) -> bool {
        window.get(index) & bit != 0
    }

    fn write(window: &Window, index: usize, bit: u8, on: bool) {
        let b = window.get(index);
        window.set(index, if on { b | bit } else { b & !bit });
    }

    /// Screen pixel, for hosts and tests.
    pub fn pixel(&self, x: i32, y: i32) -> bool {
        match self.locate(x, y) {
            Some((index, bit)) => Screen::read(&self.graph, index, bit),
            None => false,
        }
    }

    /// Paints one pixel of a shape with the current operation.
    fn paint(&self, x: i32, y: i32) {
        if let Some((index, bit)) = self.locate(x, y) {
            let window = self.target();
            let d = Screen::read(window, index, bit);
            let on = match self.mode & mode::OPERATION {
                mode::CLEAR => false,
                mode::NOT | mode::XOR => !d,
                mode::AND => d,
                _ => true,
            };
            Screen::write(window, index, bit, on);
        }
    }

    /// Combines one source pixel of an image with the current operation.
    fn blend(&self, x: i32, y: i32, s: bool) {
        if let Some((index, bit)) = self.locate(x, y) {
            let window = self.target();
            let d = Screen::read(window, index, bit);
            let on = match self.mode & mode::OPERATION {
                mode::CLEAR => false,
                mode::NOT => !s,
                mode::OR => d | s,
                mode::AND => d & s,
                mode::XOR => d ^ s,
                _ => s,
            };
            Screen::write(window, index, bit, on);
        }
    }

    fn span(&self, x0: i32, x1: i32, y: i32) {
        let left = x0.min(x1).max(0);
        let right = x0.max(x1).min(self.width as i32 - 1);
        for x in left..=right {
            self.paint(x, y);
        }
    }

    pub fn labels(&self) -> &[(i16, i16, String)] {
        &self.labels
    }

    /// The screen as text, half-block characters with labels on top.
    pub fn picture(&self) -> Vec<String> {
        let mut lines: Vec<Vec<char>> = (0..(self.height + 1) / 2)
            .map(|row| {
                (0..self.width as i32)
                    .map(|x| {
                        let y = 2 * row as i32;
                        match (self.pixel(x, y), self.pixel(x, y + 1)) {
                            (true, true) => '█',
                            (true, false) => '▀',
                            (false, true) => '▄',
                            (false, false) => ' ',
                        }
                    })
                    .collect()
            })
            .collect();
        for (x, y, text) in &self.labels {
            if let Some(line) = lines.get_mut((*y as i32 / 2).max(0) as usize) {
                for (i, c) in text.chars().enumerate() {
                    if let Some(cell) = line.get_mut((*x as i32).max(0) as usize + i) {
                        *cell = c;
                    }
                }
            }
        }
        lines.into_iter().map(|line| line.into_iter().collect()).collect()
    }

    fn present(&mut self) {
        let picture = self.picture();
        if let Some(out) = self.out.as_mut() {
            let mut frame = String::from("\x1b[H");
            for line in picture {
                frame.push_str(&line);
                frame.push_str("\r\n");
            }
            if let Err(error) = out.write_all(frame.as_bytes()).and_then(|_| out.flush()) {
                warn!("screen: {}", error);
            }
        }
    }
}

impl Render for Screen {
    fn graph_window(&self) -> Option<Window> {
        Some(self.graph.clone())
    }

    fn buffer_window(&self) -> Option<Window> {
        Some(self.buffer.clone())
    }

    fn set_draw_mode(&mut self, mode: i32) {
        self.mode = mode;
    }

    fn draw_point(&mut self, x: i16, y: i16) {
        self.paint(x as i32, y as i32);
    }

    fn draw_line(&mut self, x0: i16, y0: i16, x1: i16, y1: i16) {
        let (mut x, mut y) = (x0 as i32, y0 as i32);
        let (x1, y1) = (x1 as i32, y1 as i32);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.paint(x, y);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn draw_rect(&mut self, x0: i16, y0: i16, x1: i16, y1: i16) {
        let (left, right) = (x0.min(x1) as i32, x0.max(x1) as i32);
        let (top, bottom) = (y0.min(y1) as i32, y0.max(y1) as i32);
        if self.mode & mode::FILL != 0 {
            for y in top.max(0)..=bottom.min(self.height as i32 - 1) {
                self.span(left, right, y);
            }
            return;
        }
        self.span(left, right, top);
        if bottom > top {
            self.span(left, right, bottom);
        }
        for y in (top + 1).max(0)..bottom.min(self.height as i32) {
            self.paint(left, y);
            if right > left {
                self.paint(right, y);
            }
        }
    }

    fn draw_oval(&mut self, x: i16, y: i16, a: i16, b: i16) {
        let (cx, cy) = (x as i32, y as i32);
        let (a, b) = (a.max(0) as i32, b.max(0) as i32);
        let half = |r: i32, along: i32, t: i32| -> i32 {
            if along == 0 {
                return r;
            }
            let f = 1.0 - (t as f64 / along as f64).powi(2);
            (r as f64 * f.max(0.0).sqrt()).round() as i32
        };
        if self.mode & mode::FILL != 0 {
            for dy in -b..=b {
                let w = half(a, b, dy);
                self.span(cx - w, cx + w, cy + dy);
            }
            return;
        }
        let mut points = BTreeSet::new();
        for dx in -a..=a {
            let h = half(b, a, dx);
            points.insert((cx + dx, cy - h));
            points.insert((cx + dx, cy + h));
        }
        for dy in -b..=b {
            let w = half(a, b, dy);
            points.insert((cx - w, cy + dy));
            points.insert((cx + w, cy + dy));
        }
        for (px, py) in points {
            self.paint(px, py);
        }
    }

    fn draw_region(&mut self, x: i16, y: i16, width: i16, height: i16, image: &[u8]) {
        let stride = (width.max(0) as usize + 7) / 8;
        for row in 0..height.max(0) as usize {
            if row * stride >= image.len() {
                break;
            }
            for col in 0..width.max(0) as usize {
                let s = match image.get(row * stride + col / 8) {
                    Some(b) => b & (0x80 >> (col % 8)) != 0,
                    None => false,
                };
                self.blend(x as i32 + col as i32, y as i32 + row as i32, s);
            }
        }
    }

    fn draw_string(&mut self, x: i16, y: i16, text: &[u8]) {
        let text: String = text
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
            .collect();
        self.labels.retain(|label| (label.0, label.1) != (x, y));
        if self.labels.len() >= MAX_LABELS {
            self.labels.remove(0);
        }
        self.labels.push((x, y, text));
    }

    fn get_point(&self, x: i16, y: i16) -> i32 {
        self.pixel(x as i32, y as i32) as i32
    }

    fn get_region(&self, x: i16, y: i16, width: i16, height: i16) -> Vec<u8> {
        let stride = (width.max(0) as usize + 7) / 8;
        let mut image = vec![0; region_len(width, height)];
        let window = self.target();
        // Only the on-screen part of a clipped image needs visiting.
        let (x, y) = (x as i32, y as i32);
        let cols = (-x).max(0)..(self.width as i32 - x).min(width as i32).max(0);
        for row in (-y).max(0)..(self.height as i32 - y).min(height as i32) {
            let base = row as usize * stride;
            if base + stride > image.len() {
                break;
            }
            for col in cols.clone() {
                if let Some((index, bit)) = self.locate(x + col, y + row) {
                    if Screen::read(window, index, bit) {
                        image[base + col as usize / 8] |= 0x80 >> (col % 8);
                    }
                }
            }
        }
        image
    }

    fn clear_buffer(&mut self) {
        self.buffer.fill(0);
        self.labels.clear();
    }

    fn refresh(&mut self) {
        self.graph.copy_from(&self.buffer);
        self.present();
    }

    /// Buffer effects: 0 scrolls left a pixel, 1 scrolls right, 2 mirrors
    /// left to right, 3 mirrors top to bottom, 4 inverts.
    fn xdraw(&mut self, mode: i32) {
        let (w, h) = (self.width as i32, self.height as i32);
        let before = Screen::new(self.width, self.height);
        before.buffer.copy_from(&self.buffer);
        let source = |x: i32, y: i32| -> bool {
            match before.locate(x, y) {
                Some((index, bit)) => Screen::read(&before.buffer, index, bit),
                None => false,
            }
        };
        for y in 0..h {
            for x in 0..w {
                let on = match mode {
                    0 => source(x + 1, y),
                    1 => source(x - 1, y),
                    2 => source(w - 1 - x, y),
                    3 => source(x, h - 1 - y),
                    4 => !source(x, y),
                    _ => return,
                };
                if let Some((index, bit)) = self.locate(x, y) {
                    Screen::write(&self.buffer, index, bit, on);
                }
            }
        }
    }
}
