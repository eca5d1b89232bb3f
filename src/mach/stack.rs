use crate::error;
use crate::mach::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Operand stack
///
/// A fixed-capacity stack of 32-bit words with a movable top pointer.
/// Words above the pointer stay in place until overwritten, so a system
/// call can drop its whole argument block with `move_pointer(-n)` and then
/// read the arguments back in push order with `peek(0)..peek(n - 1)`.

pub struct Stack {
    vec: Vec<i32>,
    top: usize,
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_slice())
    }
}

impl Stack {
    pub fn new(capacity: usize) -> Stack {
        Stack {
            vec: vec![0; capacity],
            top: 0,
        }
    }
    fn overflow_error(&self) -> Error {
        error!(StackOverflow; &format!("CAPACITY {}", self.vec.len()))
    }
    fn underflow_error(&self) -> Error {
        error!(StackUnderflow)
    }
    pub fn clear(&mut self) {
        self.top = 0;
    }
    pub fn len(&self) -> usize {
        self.top
    }
    pub fn is_empty(&self) -> bool {
        self.top == 0
    }
    /// Live words, bottom first.
    pub fn as_slice(&self) -> &[i32] {
        &self.vec[..self.top]
    }
    pub fn capacity(&self) -> usize {
        self.vec.len()
    }
    pub fn push(&mut self, val: i32) -> Result<()> {
        match self.vec.get_mut(self.top) {
            Some(slot) => {
                *slot = val;
                self.top += 1;
                Ok(())
            }
            None => Err(self.overflow_error()),
        }
    }
    pub fn pop(&mut self) -> Result<i32> {
        if self.top == 0 {
            return Err(self.underflow_error());
        }
        self.top -= 1;
        Ok(self.vec[self.top])
    }
    /// Word `index` slots above the top pointer.
    pub fn peek(&self, index: usize) -> Result<i32> {
        match self.vec.get(self.top + index) {
            Some(val) => Ok(*val),
            None => Err(self.overflow_error()),
        }
    }
    /// The word on top of the stack, left in place.
    pub fn last_value(&self) -> Result<i32> {
        match self.top {
            0 => Err(self.underflow_error()),
            top => Ok(self.vec[top - 1]),
        }
    }
    pub fn move_pointer(&mut self, delta: isize) -> Result<()> {
        let top = self.top as isize + delta;
        if top < 0 {
            Err(self.underflow_error())
        } else if top as usize > self.vec.len() {
            Err(self.overflow_error())
        } else {
            self.top = top as usize;
            Ok(())
        }
    }
    pub fn pop_2(&mut self) -> Result<(i32, i32)> {
        let two = self.pop()?;
        let one = self.pop()?;
        Ok((one, two))
    }
    /// Pops `len` words and returns them in push order.
    pub fn pop_n(&mut self, len: usize) -> Result<Vec<i32>> {
        self.move_pointer(-(len as isize))?;
        Ok(self.vec[self.top..self.top + len].to_vec())
    }
}
