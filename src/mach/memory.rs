use super::{Address, Error, Region, StringPool, Window};
use crate::error;
use std::ops::Range;

type Result<T> = std::result::Result<T, Error>;

pub const MEMORY_SIZE: usize = 0x10000;

/// ## Unified memory
///
/// The 64K byte-addressable space seen by programs. Addresses wrap at 16
/// bits. An address inside an installed window or the string pool goes
/// there; every other address lands in the interpreter-owned buffer that
/// holds globals and call frames. Multi-byte values are little-endian and
/// each byte is routed on its own, so a value may straddle two windows.

pub struct Memory {
    ram: Vec<u8>,
    region: Region,
    strings: StringPool,
    windows: Vec<(Range<Address>, Window)>,
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("region", &self.region)
            .field("strings", &self.strings.len())
            .field("windows", &self.windows)
            .finish()
    }
}

impl Memory {
    pub fn new(strings: StringPool) -> Memory {
        Memory {
            ram: vec![0; MEMORY_SIZE],
            region: Region::default(),
            strings,
            windows: vec![],
        }
    }

    /// Maps `window` at `base`. Windows may not overlap each other, the
    /// string pool, or run past the end of the address space.
    pub fn install(&mut self, base: Address, window: Window) -> Result<()> {
        let range = base..base + window.len();
        if range.end > MEMORY_SIZE {
            return Err(error!(WindowOverlap; &format!("0x{:04X} PAST END", base)));
        }
        let overlaps = |other: &Range<Address>| range.start < other.end && other.start < range.end;
        if self.windows.iter().any(|(r, _)| overlaps(r)) || overlaps(&self.strings.range()) {
            return Err(error!(WindowOverlap; &format!("0x{:04X}", base)));
        }
        self.windows.push((range, window));
        Ok(())
    }

    pub fn window_at(&self, base: Address) -> Option<&Window> {
        self.windows
            .iter()
            .find(|(r, _)| r.start == base)
            .map(|(_, w)| w)
    }

    /// Zeroes the owned buffer, the string pool and the region bounds.
    /// Installed windows belong to their hosts and are left alone.
    pub fn clear(&mut self) {
        self.ram.iter_mut().for_each(|b| *b = 0);
        self.strings.clear();
        self.region.clear();
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    pub fn strings_mut(&mut self) -> &mut StringPool {
        &mut self.strings
    }

    pub fn get_byte(&self, addr: Address) -> u8 {
        let addr = addr & 0xffff;
        for (range, window) in &self.windows {
            if range.contains(&addr) {
                return window.get(addr - range.start);
            }
        }
        if self.strings.contains(addr) {
            return self.strings.get(addr);
        }
        self.ram[addr]
    }

    pub fn set_byte(&mut self, addr: Address, val: u8) {
        let addr = addr & 0xffff;
        for (range, window) in &self.windows {
            if range.contains(&addr) {
                return window.set(addr - range.start, val);
            }
        }
        if self.strings.contains(addr) {
            return self.strings.set(addr, val);
        }
        self.ram[addr] = val;
    }

    /// Writes the owned buffer directly, bypassing windows and the pool.
    /// Used for the data images a program copies in at start-up.
    pub fn set_owned_byte(&mut self, addr: Address, val: u8) {
        self.ram[addr & 0xffff] = val;
    }

    /// Little-endian read of `len` bytes (at most 4), zero-extended.
    pub fn get_bytes(&self, addr: Address, len: usize) -> i32 {
        (0..len.min(4))
            .rev()
            .fold(0u32, |acc, i| (acc << 8) | self.get_byte(addr + i) as u32) as i32
    }

    pub fn set_bytes(&mut self, addr: Address, len: usize, val: i32) {
        for i in 0..len.min(4) {
            self.set_byte(addr + i, (val >> (8 * i)) as u8);
        }
    }

    pub fn get_char(&self, addr: Address) -> i32 {
        self.get_byte(addr) as i32
    }

    pub fn set_char(&mut self, addr: Address, val: i32) {
        self.set_byte(addr, val as u8)
    }

    pub fn get_int(&self, addr: Address) -> i32 {
        self.get_bytes(addr, 2) as i16 as i32
    }

    pub fn set_int(&mut self, addr: Address, val: i32) {
        self.set_bytes(addr, 2, val)
    }

    pub fn get_long(&self, addr: Address) -> i32 {
        self.get_bytes(addr, 4)
    }

    pub fn set_long(&mut self, addr: Address, val: i32) {
        self.set_bytes(addr, 4, val)
    }

    /// Three-byte program offset, as saved by `invoke`.
    pub fn get_addr(&self, addr: Address) -> usize {
        self.get_bytes(addr, 3) as usize
    }

    pub fn set_addr(&mut self, addr: Address, offset: usize) {
        self.set_bytes(addr, 3, offset as i32)
    }

    /// Bytes from `addr` up to, not including, the next NUL.
    pub fn c_string(&self, addr: Address) -> Vec<u8> {
        (0..MEMORY_SIZE)
            .map(|i| self.get_byte(addr + i))
            .take_while(|&b| b != 0)
            .collect()
    }

    pub fn read_block(&self, addr: Address, len: usize) -> Vec<u8> {
        (0..len).map(|i| self.get_byte(addr + i)).collect()
    }

    pub fn write_block(&mut self, addr: Address, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            self.set_byte(addr + i, *b);
        }
    }
}
