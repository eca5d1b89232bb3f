use super::Address;

/// ## Machine configuration
///
/// Capacities and the memory map. The defaults describe the 160x80
/// monochrome handheld the LAV format was built for.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Operand stack capacity in words.
    pub stack_size: usize,
    pub string_base: Address,
    pub string_size: usize,
    pub graph_base: Address,
    pub buffer_base: Address,
    pub text_base: Address,
    pub screen_width: usize,
    pub screen_height: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            stack_size: 1024,
            string_base: 0x1400,
            string_size: 0x0c00,
            graph_base: 0x0000,
            buffer_base: 0x0640,
            text_base: 0x0c80,
            screen_width: 160,
            screen_height: 80,
        }
    }
}

impl Config {
    /// Bytes in one 1bpp screen.
    pub fn screen_bytes(&self) -> usize {
        self.screen_width * self.screen_height / 8
    }
}

/// Bytes in the text window: one per cell of the small font grid.
pub const TEXT_WINDOW_SIZE: usize = 160;
/// Height of one picker row in pixels.
pub const ROW_HEIGHT: usize = 13;
