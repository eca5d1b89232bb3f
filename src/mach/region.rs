use super::Address;

/// ## Runtime region
///
/// The active call frame as a `[start, end)` pair over the owned buffer.
/// Nested frames are not objects: `invoke` and `entry` thread the caller's
/// return offset and start address through the frame memory itself.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    start: Address,
    end: Address,
}

impl Region {
    pub fn start(&self) -> Address {
        self.start
    }
    pub fn end(&self) -> Address {
        self.end
    }
    pub fn set_start(&mut self, addr: Address) {
        self.start = addr & 0xffff;
    }
    pub fn set_end(&mut self, addr: Address) {
        self.end = addr & 0xffff;
    }
    pub fn clear(&mut self) {
        *self = Region::default();
    }
}
