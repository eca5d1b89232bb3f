use crate::error;
use crate::mach::Error;

type Result<T> = std::result::Result<T, Error>;

pub const MAGIC: [u8; 3] = *b"LAV";
pub const VERSION: u8 = 0x12;
/// Code starts after the fixed-size header.
pub const CODE_START: usize = 16;

/// ## Program image and cursor
///
/// An immutable LAV image with one read position. All fetches are
/// little-endian and advance the cursor; fetching past the end of the
/// image is a fault, never an implicit end of program.

#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    data: Vec<u8>,
    offset: usize,
}

impl Program {
    pub fn new(name: &str, data: Vec<u8>) -> Result<Program> {
        if data.len() <= CODE_START || data[0..3] != MAGIC {
            return Err(error!(BadImage; name));
        }
        if data[3] != VERSION {
            return Err(error!(UnsupportedVersion; &format!("{:02X}", data[3])));
        }
        Ok(Program {
            name: name.to_string(),
            data,
            offset: CODE_START,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn reset(&mut self) {
        self.offset = CODE_START;
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    fn fetch(&mut self, len: usize) -> Result<u32> {
        let end = self.offset + len;
        match self.data.get(self.offset..end) {
            Some(bytes) => {
                self.offset = end;
                Ok(bytes
                    .iter()
                    .rev()
                    .fold(0, |acc, &b| (acc << 8) | b as u32))
            }
            None => Err(error!(EndOfImage, self.offset)),
        }
    }

    pub fn uint8(&mut self) -> Result<u8> {
        Ok(self.fetch(1)? as u8)
    }

    /// Two-byte operands are the machine's `int`: signed.
    pub fn int16(&mut self) -> Result<i16> {
        Ok(self.fetch(2)? as u16 as i16)
    }

    pub fn uint24(&mut self) -> Result<u32> {
        self.fetch(3)
    }

    pub fn int32(&mut self) -> Result<i32> {
        Ok(self.fetch(4)? as i32)
    }

    /// Reads one NUL-terminated byte string, consuming the terminator.
    pub fn c_string(&mut self) -> Result<Vec<u8>> {
        let mut bytes = vec![];
        loop {
            match self.uint8()? {
                0 => return Ok(bytes),
                b => bytes.push(b),
            }
        }
    }
}
