use super::memory::MEMORY_SIZE;
use super::{Address, Memory, Opcode};
use chrono::{Datelike, Local, Timelike, Utc};

/// ## Runtime library
///
/// The C-like library that system calls run directly against memory.
/// Strings are NUL-terminated bytes. Every scan is bounded by the size of
/// the address space, so a string without a terminator wraps around once
/// and stops instead of spinning forever.

pub struct Function {}

impl Function {
    /// Character class tests on the low byte. Returns `None` for opcodes
    /// that are not ctype predicates.
    pub fn ctype(op: Opcode, c: i32) -> Option<bool> {
        let c = c as u8;
        Some(match op {
            Opcode::IsAlnum => c.is_ascii_alphanumeric(),
            Opcode::IsAlpha => c.is_ascii_alphabetic(),
            Opcode::IsCntrl => c.is_ascii_control(),
            Opcode::IsDigit => c.is_ascii_digit(),
            Opcode::IsGraph => c.is_ascii_graphic(),
            Opcode::IsLower => c.is_ascii_lowercase(),
            Opcode::IsPrint => c.is_ascii_graphic() || c == b' ',
            Opcode::IsPunct => c.is_ascii_punctuation(),
            // Includes vertical tab, unlike u8::is_ascii_whitespace.
            Opcode::IsSpace => matches!(c, b'\t' | b'\n' | 0x0b | 0x0c | b'\r' | b' '),
            Opcode::IsUpper => c.is_ascii_uppercase(),
            Opcode::IsXDigit => c.is_ascii_hexdigit(),
            _ => return None,
        })
    }

    pub fn to_lower(c: i32) -> i32 {
        (c as u8).to_ascii_lowercase() as i32
    }

    pub fn to_upper(c: i32) -> i32 {
        (c as u8).to_ascii_uppercase() as i32
    }

    pub fn strlen(memory: &Memory, addr: Address) -> i32 {
        (0..MEMORY_SIZE)
            .take_while(|i| memory.get_byte(addr + i) != 0)
            .count() as i32
    }

    /// Copies including the terminator.
    pub fn strcpy(memory: &mut Memory, dst: Address, src: Address) {
        for i in 0..MEMORY_SIZE {
            let b = memory.get_byte(src + i);
            memory.set_byte(dst + i, b);
            if b == 0 {
                break;
            }
        }
    }

    pub fn strcat(memory: &mut Memory, dst: Address, src: Address) {
        let end = dst + Function::strlen(memory, dst) as Address;
        Function::strcpy(memory, end, src);
    }

    /// Address of the first `c` in the string, or 0.
    pub fn strchr(memory: &Memory, addr: Address, c: u8) -> i32 {
        for i in 0..MEMORY_SIZE {
            match memory.get_byte(addr + i) {
                b if b == c => return ((addr + i) & 0xffff) as i32,
                0 => break,
                _ => {}
            }
        }
        0
    }

    /// Difference of the first mismatched bytes, compared unsigned.
    pub fn strcmp(memory: &Memory, lhs: Address, rhs: Address) -> i32 {
        for i in 0..MEMORY_SIZE {
            let l = memory.get_char(lhs + i);
            let r = memory.get_char(rhs + i);
            if l != r || l == 0 {
                return l - r;
            }
        }
        0
    }

    /// Address of the first occurrence of `needle` in `haystack`, or 0.
    pub fn strstr(memory: &Memory, haystack: Address, needle: Address) -> i32 {
        let needle = memory.c_string(needle);
        let haystack_len = Function::strlen(memory, haystack) as usize;
        for start in 0..haystack_len {
            let found = needle
                .iter()
                .enumerate()
                .all(|(i, b)| start + i < haystack_len && memory.get_byte(haystack + start + i) == *b);
            if found {
                return ((haystack + start) & 0xffff) as i32;
            }
        }
        0
    }

    pub fn memset(memory: &mut Memory, addr: Address, val: u8, len: i16) {
        for i in 0..len.max(0) as usize {
            memory.set_byte(addr + i, val);
        }
    }

    /// Ascending copy; overlapping ranges smear like C `memcpy` on the handheld.
    pub fn memcpy(memory: &mut Memory, dst: Address, src: Address, len: i16) {
        for i in 0..len.max(0) as usize {
            let b = memory.get_byte(src + i);
            memory.set_byte(dst + i, b);
        }
    }

    pub fn memmove(memory: &mut Memory, dst: Address, src: Address, len: i16) {
        let len = len.max(0) as usize;
        if src > dst {
            Function::memcpy(memory, dst, src, len as i16);
        } else {
            for i in (0..len).rev() {
                let b = memory.get_byte(src + i);
                memory.set_byte(dst + i, b);
            }
        }
    }

    /// CRC-16/X.25 of the range, as an unsigned 16-bit word.
    pub fn crc16(memory: &Memory, addr: Address, len: i16) -> i32 {
        let bytes = memory.read_block(addr, len.max(0) as usize);
        crc::crc16::checksum_x25(&bytes) as i32
    }

    /// XORs the range with `key`, repeating the key from its start each
    /// time its terminator is reached.
    pub fn secret(memory: &mut Memory, addr: Address, len: i16, key: Address) {
        let mut index = 0;
        for i in 0..len.max(0) as usize {
            let mut mask = memory.get_byte(key + index);
            if mask == 0 {
                index = 0;
                mask = memory.get_byte(key);
            }
            let b = memory.get_byte(addr + i);
            memory.set_byte(addr + i, b ^ mask);
            index += 1;
        }
    }

    /// Linear congruential generator. Yields 15 bits per call.
    pub fn rand(seed: &mut i32) -> i32 {
        *seed = seed.wrapping_mul(22_695_477).wrapping_add(1);
        (*seed >> 16) & 0x7fff
    }

    /// Cosine of whole degrees, scaled by 1024.
    pub fn cos(degrees: i16) -> i32 {
        ((degrees as f64).to_radians().cos() * 1024.0).round() as i32
    }

    /// Sine of whole degrees, scaled by 1024.
    pub fn sin(degrees: i16) -> i32 {
        ((degrees as f64).to_radians().sin() * 1024.0).round() as i32
    }

    /// The current second split into 256 ticks.
    pub fn ticks() -> i32 {
        let ms = Utc::now().timestamp_subsec_millis() % 1000;
        (ms * 256 / 1000) as i32
    }

    /// Writes the local time as year (2 bytes), month from 0, day, hour,
    /// minute, second and weekday from Sunday = 1.
    pub fn time(memory: &mut Memory, addr: Address) {
        let now = Local::now();
        memory.set_bytes(addr, 2, now.year());
        memory.set_bytes(addr + 2, 1, now.month0() as i32);
        memory.set_bytes(addr + 3, 1, now.day() as i32);
        memory.set_bytes(addr + 4, 1, now.hour() as i32);
        memory.set_bytes(addr + 5, 1, now.minute() as i32);
        memory.set_bytes(addr + 6, 1, now.second() as i32);
        memory.set_bytes(addr + 7, 1, now.weekday().number_from_sunday() as i32);
    }
}
