use super::memory::MEMORY_SIZE;
use super::{Error, Window};
use crate::error;

type Result<T> = std::result::Result<T, Error>;

/// Draw-mode bits passed to [`Render::set_draw_mode`].
pub mod mode {
    pub const CLEAR: i32 = 0;
    pub const COPY: i32 = 1;
    pub const NOT: i32 = 2;
    pub const OR: i32 = 3;
    pub const AND: i32 = 4;
    pub const XOR: i32 = 5;
    pub const OPERATION: i32 = 0x0f;
    /// Fill the shape instead of outlining it.
    pub const FILL: i32 = 0x10;
    /// Draw on the visible screen rather than the back buffer.
    pub const GRAPH: i32 = 0x40;
}

/// ## Peripheral collaborators
///
/// The machine reaches the outside world only through these four
/// capabilities. Coordinates are signed 16-bit. Byte strings and blocks are
/// copied out of Unified Memory by the machine before the call, so a
/// collaborator never needs to see machine memory.
///
/// Failures are reported as the sentinels the programs expect (`-1`, `0`,
/// `false`). The one exception is cancellation: a blocking call that is
/// interrupted returns `Err` with code `Interrupted`, which ends the step.

pub trait Render: Send {
    /// The visible screen, if it can be mapped into memory.
    fn graph_window(&self) -> Option<Window> {
        None
    }
    /// The back buffer, if it can be mapped into memory.
    fn buffer_window(&self) -> Option<Window> {
        None
    }
    fn set_draw_mode(&mut self, mode: i32);
    fn draw_point(&mut self, x: i16, y: i16);
    fn draw_line(&mut self, x0: i16, y0: i16, x1: i16, y1: i16);
    fn draw_rect(&mut self, x0: i16, y0: i16, x1: i16, y1: i16);
    /// Ellipse centred on `(x, y)` with radii `a` and `b`.
    fn draw_oval(&mut self, x: i16, y: i16, a: i16, b: i16);
    /// Blits a 1bpp image, rows padded to whole bytes.
    fn draw_region(&mut self, x: i16, y: i16, width: i16, height: i16, image: &[u8]);
    fn draw_string(&mut self, x: i16, y: i16, text: &[u8]);
    fn get_point(&self, x: i16, y: i16) -> i32;
    /// Reads back a 1bpp image in the layout `draw_region` takes.
    fn get_region(&self, x: i16, y: i16, width: i16, height: i16) -> Vec<u8>;
    fn clear_buffer(&mut self);
    fn refresh(&mut self);
    fn xdraw(&mut self, mode: i32);
}

pub trait TextConsole: Send {
    fn text_window(&self) -> Option<Window> {
        None
    }
    /// Appends one character. Codes above 0xff are double-byte characters.
    fn add_char(&mut self, c: u16);
    fn update_lcd(&mut self, mode: i32);
    fn set_text_mode(&mut self, mode: u8);
    fn set_location(&mut self, row: u8, col: u8);
}

/// Key codes the machine itself needs to recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMap {
    pub enter: i32,
    pub escape: i32,
    pub up: i32,
    pub down: i32,
    pub left: i32,
    pub right: i32,
}

impl Default for KeyMap {
    fn default() -> KeyMap {
        KeyMap {
            enter: 13,
            escape: 27,
            up: 20,
            down: 21,
            left: 23,
            right: 22,
        }
    }
}

pub trait Keyboard: Send {
    fn key_map(&self) -> KeyMap {
        KeyMap::default()
    }
    /// Blocks for the next key press.
    fn getchar(&mut self) -> Result<i32>;
    /// The pending key press, or 0.
    fn inkey(&mut self) -> i32;
    /// Blocks for the next raw key code, ignoring any input method.
    fn raw_key(&mut self) -> Result<i32>;
    /// Non-zero while `key` is held down.
    fn check_key(&mut self, key: i32) -> i32;
    fn release_key(&mut self, key: i32);
}

pub trait FileSystem: Send {
    /// Returns a handle, or 0 when the file cannot be opened.
    fn open(&mut self, name: &[u8], mode: &[u8]) -> i32;
    fn close(&mut self, fp: i32);
    /// Returns the count of bytes read; 0 on error or end of file.
    fn read(&mut self, fp: i32, buf: &mut [u8]) -> i32;
    fn write(&mut self, fp: i32, buf: &[u8]) -> i32;
    /// Returns the new position, or -1.
    fn seek(&mut self, fp: i32, offset: i32, base: i32) -> i32;
    fn tell(&mut self, fp: i32) -> i32;
    fn eof(&mut self, fp: i32) -> bool;
    fn rewind(&mut self, fp: i32);
    /// Returns the byte read, or -1.
    fn getc(&mut self, fp: i32) -> i32;
    /// Returns the byte written, or -1.
    fn putc(&mut self, c: i32, fp: i32) -> i32;
    fn change_dir(&mut self, name: &[u8]) -> bool;
    fn make_dir(&mut self, name: &[u8]) -> bool;
    fn delete_file(&mut self, name: &[u8]) -> bool;
    /// Entries in the working directory.
    fn file_count(&mut self) -> usize;
    /// Names of up to `num` entries starting at `start`, host encoded.
    fn list_files(&mut self, start: usize, num: usize) -> Vec<String>;
    /// Closes every open handle.
    fn dispose(&mut self);
}

/// The collaborators owned by one session.
pub struct Devices {
    pub render: Box<dyn Render>,
    pub text: Box<dyn TextConsole>,
    pub keys: Box<dyn Keyboard>,
    pub files: Box<dyn FileSystem>,
}

impl Default for Devices {
    fn default() -> Devices {
        Devices {
            render: Box::new(Detached),
            text: Box::new(Detached),
            keys: Box::new(Detached),
            files: Box::new(Detached),
        }
    }
}

/// Stands in for a peripheral that is not attached. Output goes nowhere,
/// reads come back empty and blocking input fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl Render for Detached {
    fn set_draw_mode(&mut self, _mode: i32) {}
    fn draw_point(&mut self, _x: i16, _y: i16) {}
    fn draw_line(&mut self, _x0: i16, _y0: i16, _x1: i16, _y1: i16) {}
    fn draw_rect(&mut self, _x0: i16, _y0: i16, _x1: i16, _y1: i16) {}
    fn draw_oval(&mut self, _x: i16, _y: i16, _a: i16, _b: i16) {}
    fn draw_region(&mut self, _x: i16, _y: i16, _w: i16, _h: i16, _image: &[u8]) {}
    fn draw_string(&mut self, _x: i16, _y: i16, _text: &[u8]) {}
    fn get_point(&self, _x: i16, _y: i16) -> i32 {
        0
    }
    fn get_region(&self, _x: i16, _y: i16, width: i16, height: i16) -> Vec<u8> {
        vec![0; region_len(width, height)]
    }
    fn clear_buffer(&mut self) {}
    fn refresh(&mut self) {}
    fn xdraw(&mut self, _mode: i32) {}
}

impl TextConsole for Detached {
    fn add_char(&mut self, _c: u16) {}
    fn update_lcd(&mut self, _mode: i32) {}
    fn set_text_mode(&mut self, _mode: u8) {}
    fn set_location(&mut self, _row: u8, _col: u8) {}
}

impl Keyboard for Detached {
    fn getchar(&mut self) -> Result<i32> {
        Err(error!(HostIo; "NO KEYBOARD ATTACHED"))
    }
    fn inkey(&mut self) -> i32 {
        0
    }
    fn raw_key(&mut self) -> Result<i32> {
        Err(error!(HostIo; "NO KEYBOARD ATTACHED"))
    }
    fn check_key(&mut self, _key: i32) -> i32 {
        0
    }
    fn release_key(&mut self, _key: i32) {}
}

impl FileSystem for Detached {
    fn open(&mut self, _name: &[u8], _mode: &[u8]) -> i32 {
        0
    }
    fn close(&mut self, _fp: i32) {}
    fn read(&mut self, _fp: i32, _buf: &mut [u8]) -> i32 {
        0
    }
    fn write(&mut self, _fp: i32, _buf: &[u8]) -> i32 {
        0
    }
    fn seek(&mut self, _fp: i32, _offset: i32, _base: i32) -> i32 {
        -1
    }
    fn tell(&mut self, _fp: i32) -> i32 {
        -1
    }
    fn eof(&mut self, _fp: i32) -> bool {
        true
    }
    fn rewind(&mut self, _fp: i32) {}
    fn getc(&mut self, _fp: i32) -> i32 {
        -1
    }
    fn putc(&mut self, _c: i32, _fp: i32) -> i32 {
        -1
    }
    fn change_dir(&mut self, _name: &[u8]) -> bool {
        false
    }
    fn make_dir(&mut self, _name: &[u8]) -> bool {
        false
    }
    fn delete_file(&mut self, _name: &[u8]) -> bool {
        false
    }
    fn file_count(&mut self) -> usize {
        0
    }
    fn list_files(&mut self, _start: usize, _num: usize) -> Vec<String> {
        vec![]
    }
    fn dispose(&mut self) {}
}

/// Bytes in a 1bpp image of the given size, rows padded to whole bytes.
/// Never more than the address space, since images live in memory.
pub fn region_len(width: i16, height: i16) -> usize {
    let width = width.max(0) as usize;
    let height = height.max(0) as usize;
    ((width + 7) / 8 * height).min(MEMORY_SIZE)
}
