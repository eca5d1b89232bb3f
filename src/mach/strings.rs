use super::{Address, Error, Program, Reference};
use std::ops::Range;

type Result<T> = std::result::Result<T, Error>;

/// ## String pool
///
/// Literal strings interned straight from the program cursor. Every intern
/// appends a fresh copy; there is no deduplication. When the pool is full
/// it starts over from its base, recycling the oldest literals, which is
/// what long-running programs that intern inside loops rely on.

#[derive(Debug)]
pub struct StringPool {
    base: Address,
    bytes: Vec<u8>,
    next: usize,
    interned: usize,
}

impl StringPool {
    pub fn new(base: Address, size: usize) -> StringPool {
        StringPool {
            base,
            bytes: vec![0; size],
            next: 0,
            interned: 0,
        }
    }

    pub fn clear(&mut self) {
        self.bytes.iter_mut().for_each(|b| *b = 0);
        self.next = 0;
        self.interned = 0;
    }

    pub fn base(&self) -> Address {
        self.base
    }

    /// Number of strings interned since the last clear.
    pub fn len(&self) -> usize {
        self.interned
    }

    pub fn is_empty(&self) -> bool {
        self.interned == 0
    }

    pub fn range(&self) -> Range<Address> {
        self.base..self.base + self.bytes.len()
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.range().contains(&addr)
    }

    pub fn get(&self, addr: Address) -> u8 {
        self.bytes[addr - self.base]
    }

    pub fn set(&mut self, addr: Address, val: u8) {
        self.bytes[addr - self.base] = val;
    }

    /// Interns the NUL-terminated string at the cursor and returns its
    /// address tagged as a pool reference.
    pub fn add_string(&mut self, program: &mut Program) -> Result<i32> {
        let string = program.c_string()?;
        let capacity = self.bytes.len();
        if capacity == 0 {
            return Ok(Reference::pool(self.base).encode());
        }
        let len = string.len().min(capacity.saturating_sub(1));
        if self.next + len + 1 > capacity {
            self.next = 0;
        }
        let start = self.next;
        self.bytes[start..start + len].copy_from_slice(&string[..len]);
        self.bytes[start + len] = 0;
        self.next += len + 1;
        self.interned += 1;
        Ok(Reference::pool(self.base + start).encode())
    }
}
