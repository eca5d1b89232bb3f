use super::*;


/// A minimal valid image: header, then `code`.
fn image(code: &[u8]) -> Vec<u8> {
    let mut data = vec![0; CODE_START];
    data[..3].copy_from_slice(&MAGIC);
    data[3] = VERSION;
    data.extend_from_slice(code);
    data
}

fn memory() -> Memory {
    let config = Config::default();
    Memory::new(StringPool::new(config.string_base, config.string_size))
}

/// Writes `s` with its terminator.
fn poke_str(memory: &mut Memory, addr: Address, s: &[u8]) {
    memory.write_block(addr, s);
    memory.set_byte(addr + s.len(), 0);
}
