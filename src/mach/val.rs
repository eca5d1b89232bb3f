use super::Address;

/// Every comparison pushes one of these two words.
pub const TRUE: i32 = -1;
pub const FALSE: i32 = 0;

pub fn from_bool(b: bool) -> i32 {
    if b {
        TRUE
    } else {
        FALSE
    }
}

pub fn address(val: i32) -> Address {
    (val & 0xffff) as Address
}

const WIDTH_SHIFT: u32 = 16;
const WIDTH_MASK: i32 = 0x7f;
const POOL_BIT: i32 = 0x10;
const FRAME_BIT: i32 = 0x0080_0000;

/// ## Tagged memory reference
///
/// A stack word naming a memory cell for read-modify-write opcodes.
/// Bits 0-15 hold the address, bits 16-22 the access width. The width
/// value 0x10 marks a String Pool target read one byte at a time.
/// Bit 23 asks for the region start to be added before dereferencing.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub addr: Address,
    pub width: usize,
    pub pool: bool,
    pub frame: bool,
}

impl Reference {
    pub fn new(addr: Address, width: usize) -> Reference {
        debug_assert!(width == 1 || width == 2 || width == 4);
        Reference {
            addr,
            width,
            pool: false,
            frame: false,
        }
    }

    pub fn pool(addr: Address) -> Reference {
        Reference {
            addr,
            width: 1,
            pool: true,
            frame: false,
        }
    }

    pub fn decode(val: i32) -> Reference {
        let class = (val >> WIDTH_SHIFT) & WIDTH_MASK;
        let pool = class & POOL_BIT != 0;
        let width = match class & !POOL_BIT {
            0 if pool => 1,
            w => w as usize,
        };
        Reference {
            addr: address(val),
            width,
            pool,
            frame: val & FRAME_BIT != 0,
        }
    }

    pub fn encode(&self) -> i32 {
        let class = if self.pool { POOL_BIT } else { self.width as i32 };
        let mut val = (self.addr as i32 & 0xffff) | (class << WIDTH_SHIFT);
        if self.frame {
            val |= FRAME_BIT;
        }
        val
    }

    /// Resolves the frame-relative bit against the current region start.
    pub fn resolve(&self, region_start: Address) -> Address {
        if self.frame {
            (self.addr + region_start) & 0xffff
        } else {
            self.addr
        }
    }
}
