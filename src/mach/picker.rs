use super::config::ROW_HEIGHT;
use super::device::mode::{CLEAR, COPY, FILL, GRAPH, NOT};
use super::val::{FALSE, TRUE};
use super::{Address, Config, Devices, Error, Memory};
use encoding_rs::GBK;
use tracing::debug;

type Result<T> = std::result::Result<T, Error>;

/// ## File picker
///
/// A full-screen list of the working directory with ".." at the top.
/// Arrow keys move the highlight and scroll; enter copies the chosen
/// name into memory at `addr` and returns true, escape returns false.
/// Keys are read raw so an input method never sees them. Host names are
/// shown and returned in GB2312, the handheld's character set.

pub fn pick(devices: &mut Devices, memory: &mut Memory, config: &Config, addr: Address) -> Result<i32> {
    let count = devices.files.file_count();
    let mut names: Vec<Vec<u8>> = vec![b"..".to_vec()];
    names.extend(
        devices
            .files
            .list_files(0, count)
            .into_iter()
            .map(|name| encode(&name)),
    );
    let last = names.len() - 1;
    let width = config.screen_width as i16;
    let height = config.screen_height as i16;
    let rows = (config.screen_height / ROW_HEIGHT).max(1);
    let keys = devices.keys.key_map();
    let (mut first, mut current) = (0usize, 0usize);
    debug!(entries = names.len(), "file picker");
    loop {
        let render = &mut devices.render;
        render.set_draw_mode(CLEAR | FILL | GRAPH);
        render.draw_rect(0, 0, width - 1, height - 1);
        render.set_draw_mode(COPY | GRAPH);
        for (row, name) in names.iter().skip(first).take(rows).enumerate() {
            render.draw_string(0, (row * ROW_HEIGHT) as i16, name);
        }
        let top = (current * ROW_HEIGHT) as i16;
        render.set_draw_mode(NOT | FILL | GRAPH);
        render.draw_rect(0, top, width - 1, top + ROW_HEIGHT as i16 - 1);
        loop {
            let key = devices.keys.raw_key()?;
            if key == keys.enter {
                let name = &names[first + current];
                memory.write_block(addr, name);
                memory.set_byte(addr + name.len(), 0);
                return Ok(TRUE);
            } else if key == keys.escape {
                return Ok(FALSE);
            } else if key == keys.down || key == keys.right {
                if first + current >= last {
                    continue;
                }
                if current + 1 < rows {
                    current += 1;
                } else {
                    first += 1;
                }
                break;
            } else if key == keys.up || key == keys.left {
                if first + current == 0 {
                    continue;
                }
                if current > 0 {
                    current -= 1;
                } else {
                    first -= 1;
                }
                break;
            }
        }
    }
}

/// GB2312 bytes of a host file name. Characters with no GB2312 form
/// become numeric character references.
pub fn encode(name: &str) -> Vec<u8> {
    GBK.encode(name).0.into_owned()
}
