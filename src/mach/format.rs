use super::memory::MEMORY_SIZE;
use super::val::address;
use super::{Address, Memory};

/// ## printf and sprintf
///
/// Only `%d`, `%c` and `%s` are conversions. Any other byte after `%` is
/// emitted as itself, and a `%` at the very end of the format ends it.
/// Missing arguments read as zero.
///
/// With `wide` set, the output is for the text console: a byte with the
/// high bit set is joined with the byte after it into one double-byte
/// character, both in the format and in `%s` arguments. `%c` and the byte
/// after `%` are never joined.

pub fn expand(memory: &Memory, format: Address, args: &[i32], wide: bool) -> Vec<u16> {
    let mut out = vec![];
    let mut args = args.iter().copied();
    let mut next_arg = move || args.next().unwrap_or(0);
    let mut addr = format;
    for _ in 0..MEMORY_SIZE {
        let b = memory.get_byte(addr);
        addr += 1;
        match b {
            0 => break,
            b'%' => {
                let conversion = memory.get_byte(addr);
                addr += 1;
                match conversion {
                    0 => break,
                    b'd' => out.extend(next_arg().to_string().bytes().map(u16::from)),
                    b'c' => out.push((next_arg() & 0xff) as u16),
                    b's' => text(memory, address(next_arg()), wide, &mut out),
                    other => out.push(other as u16),
                }
            }
            b if wide && b >= 0x80 => {
                let second = memory.get_byte(addr);
                addr += 1;
                if second == 0 {
                    out.push(b as u16);
                    break;
                }
                out.push(b as u16 | (second as u16) << 8);
            }
            b => out.push(b as u16),
        }
    }
    out
}

fn text(memory: &Memory, mut addr: Address, wide: bool, out: &mut Vec<u16>) {
    for _ in 0..MEMORY_SIZE {
        let b = memory.get_byte(addr);
        addr += 1;
        if b == 0 {
            return;
        }
        if wide && b >= 0x80 {
            let second = memory.get_byte(addr);
            addr += 1;
            if second == 0 {
                out.push(b as u16);
                return;
            }
            out.push(b as u16 | (second as u16) << 8);
        } else {
            out.push(b as u16);
        }
    }
}
