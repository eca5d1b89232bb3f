#![allow(dead_code)]

use gvm::mach::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Builds LAV images opcode by opcode.
#[derive(Default)]
pub struct Asm {
    code: Vec<u8>,
}

impl Asm {
    pub fn new() -> Asm {
        Asm::default()
    }

    /// Program offset of the next byte emitted.
    pub fn here(&self) -> u32 {
        (CODE_START + self.code.len()) as u32
    }

    pub fn op(&mut self, op: Opcode) -> &mut Asm {
        self.code.push(op as u8);
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Asm {
        self.code.extend_from_slice(bytes);
        self
    }

    pub fn int16(&mut self, val: i16) -> &mut Asm {
        self.raw(&val.to_le_bytes())
    }

    pub fn int24(&mut self, val: u32) -> &mut Asm {
        self.raw(&val.to_le_bytes()[..3])
    }

    pub fn push(&mut self, val: i32) -> &mut Asm {
        self.op(Opcode::PushLong).raw(&val.to_le_bytes())
    }

    /// Opcode with a 16-bit operand.
    pub fn op16(&mut self, op: Opcode, val: i16) -> &mut Asm {
        self.op(op).int16(val)
    }

    /// Jump-family opcode with a 24-bit target.
    pub fn jump(&mut self, op: Opcode, target: u32) -> &mut Asm {
        self.op(op).int24(target)
    }

    /// Emits a jump with a placeholder target and returns where to patch.
    pub fn jump_later(&mut self, op: Opcode) -> usize {
        self.op(op);
        let slot = self.code.len();
        self.int24(0);
        slot
    }

    pub fn patch(&mut self, slot: usize, target: u32) {
        self.code[slot..slot + 3].copy_from_slice(&target.to_le_bytes()[..3]);
    }

    pub fn string(&mut self, s: &[u8]) -> &mut Asm {
        self.op(Opcode::Intern).raw(s).raw(&[0])
    }

    pub fn image(&self) -> Vec<u8> {
        let mut data = vec![0; CODE_START];
        data[..3].copy_from_slice(&MAGIC);
        data[3] = VERSION;
        data.extend_from_slice(&self.code);
        data
    }

    pub fn program(&self) -> Program {
        Program::new("test.lav", self.image()).unwrap()
    }
}

pub type Log = Arc<Mutex<Vec<String>>>;

fn note(log: &Log, entry: String) {
    log.lock().unwrap().push(entry);
}

/// Records every drawing call.
pub struct RecRender {
    log: Log,
}

impl Render for RecRender {
    fn set_draw_mode(&mut self, mode: i32) {
        note(&self.log, format!("mode 0x{:02x}", mode));
    }
    fn draw_point(&mut self, x: i16, y: i16) {
        note(&self.log, format!("point {} {}", x, y));
    }
    fn draw_line(&mut self, x0: i16, y0: i16, x1: i16, y1: i16) {
        note(&self.log, format!("line {} {} {} {}", x0, y0, x1, y1));
    }
    fn draw_rect(&mut self, x0: i16, y0: i16, x1: i16, y1: i16) {
        note(&self.log, format!("rect {} {} {} {}", x0, y0, x1, y1));
    }
    fn draw_oval(&mut self, x: i16, y: i16, a: i16, b: i16) {
        note(&self.log, format!("oval {} {} {} {}", x, y, a, b));
    }
    fn draw_region(&mut self, x: i16, y: i16, w: i16, h: i16, image: &[u8]) {
        note(&self.log, format!("region {} {} {} {} {:?}", x, y, w, h, image));
    }
    fn draw_string(&mut self, x: i16, y: i16, text: &[u8]) {
        note(&self.log, format!("string {} {} {}", x, y, String::from_utf8_lossy(text)));
    }
    fn get_point(&self, x: i16, y: i16) -> i32 {
        (x + y) as i32 & 1
    }
    fn get_region(&self, _x: i16, _y: i16, w: i16, h: i16) -> Vec<u8> {
        vec![0x5a; region_len(w, h)]
    }
    fn clear_buffer(&mut self) {
        note(&self.log, "clear".to_string());
    }
    fn refresh(&mut self) {
        note(&self.log, "refresh".to_string());
    }
    fn xdraw(&mut self, mode: i32) {
        note(&self.log, format!("xdraw {}", mode));
    }
}

/// Collects console output.
pub struct RecText {
    log: Log,
    chars: Arc<Mutex<Vec<u16>>>,
}

impl TextConsole for RecText {
    fn add_char(&mut self, c: u16) {
        self.chars.lock().unwrap().push(c);
    }
    fn update_lcd(&mut self, mode: i32) {
        note(&self.log, format!("lcd {}", mode));
    }
    fn set_text_mode(&mut self, mode: u8) {
        note(&self.log, format!("text mode {}", mode));
    }
    fn set_location(&mut self, row: u8, col: u8) {
        note(&self.log, format!("locate {} {}", row, col));
    }
}

/// Plays back a fixed list of key presses.
pub struct ScriptKeys {
    keys: VecDeque<i32>,
}

impl ScriptKeys {
    fn next(&mut self) -> Result<i32, Error> {
        match self.keys.pop_front() {
            Some(key) => Ok(key),
            None => Err(Error::new(ErrorCode::HostIo).message("OUT OF KEYS")),
        }
    }
}

impl Keyboard for ScriptKeys {
    fn getchar(&mut self) -> Result<i32, Error> {
        self.next()
    }
    fn inkey(&mut self) -> i32 {
        self.keys.pop_front().unwrap_or(0)
    }
    fn raw_key(&mut self) -> Result<i32, Error> {
        self.next()
    }
    fn check_key(&mut self, key: i32) -> i32 {
        match self.keys.front() {
            Some(&k) if k == key => key,
            _ => 0,
        }
    }
    fn release_key(&mut self, _key: i32) {}
}

/// A directory listing with no file contents behind it.
pub struct ListFiles {
    log: Log,
    names: Vec<String>,
}

impl FileSystem for ListFiles {
    fn open(&mut self, name: &[u8], mode: &[u8]) -> i32 {
        note(
            &self.log,
            format!("open {} {}", String::from_utf8_lossy(name), String::from_utf8_lossy(mode)),
        );
        3
    }
    fn close(&mut self, fp: i32) {
        note(&self.log, format!("close {}", fp));
    }
    fn read(&mut self, _fp: i32, buf: &mut [u8]) -> i32 {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        buf.len() as i32
    }
    fn write(&mut self, _fp: i32, buf: &[u8]) -> i32 {
        note(&self.log, format!("write {:?}", buf));
        buf.len() as i32
    }
    fn seek(&mut self, fp: i32, offset: i32, base: i32) -> i32 {
        note(&self.log, format!("seek {} {} {}", fp, offset, base));
        offset
    }
    fn tell(&mut self, _fp: i32) -> i32 {
        0
    }
    fn eof(&mut self, _fp: i32) -> bool {
        true
    }
    fn rewind(&mut self, _fp: i32) {}
    fn getc(&mut self, _fp: i32) -> i32 {
        -1
    }
    fn putc(&mut self, c: i32, _fp: i32) -> i32 {
        c
    }
    fn change_dir(&mut self, _name: &[u8]) -> bool {
        false
    }
    fn make_dir(&mut self, _name: &[u8]) -> bool {
        true
    }
    fn delete_file(&mut self, _name: &[u8]) -> bool {
        false
    }
    fn file_count(&mut self) -> usize {
        self.names.len()
    }
    fn list_files(&mut self, start: usize, num: usize) -> Vec<String> {
        self.names.iter().skip(start).take(num).cloned().collect()
    }
    fn dispose(&mut self) {
        note(&self.log, "dispose".to_string());
    }
}

/// A session wired to recording peripherals.
pub struct Rig {
    pub runtime: Runtime,
    log: Log,
    chars: Arc<Mutex<Vec<u16>>>,
}

impl Rig {
    pub fn new(keys: &[i32]) -> Rig {
        Rig::with_files(keys, &[])
    }

    pub fn with_files(keys: &[i32], names: &[&str]) -> Rig {
        let log: Log = Arc::default();
        let chars: Arc<Mutex<Vec<u16>>> = Arc::default();
        let devices = Devices {
            render: Box::new(RecRender { log: log.clone() }),
            text: Box::new(RecText {
                log: log.clone(),
                chars: Arc::clone(&chars),
            }),
            keys: Box::new(ScriptKeys {
                keys: keys.iter().copied().collect(),
            }),
            files: Box::new(ListFiles {
                log: log.clone(),
                names: names.iter().map(|s| s.to_string()).collect(),
            }),
        };
        let runtime = Runtime::new(Config::default(), devices).unwrap();
        Rig { runtime, log, chars }
    }

    /// Loads the program, clears the log and runs until it stops.
    pub fn run(&mut self, asm: &Asm) -> Event {
        self.runtime.load(asm.program());
        self.log.lock().unwrap().clear();
        run(&mut self.runtime)
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Console output with double-byte characters split back into bytes.
    pub fn text(&self) -> Vec<u8> {
        let mut bytes = vec![];
        for &c in self.chars.lock().unwrap().iter() {
            bytes.push(c as u8);
            if c > 0xff {
                bytes.push((c >> 8) as u8);
            }
        }
        bytes
    }

    pub fn stack(&self) -> &Stack {
        self.runtime.stack()
    }

    pub fn memory(&self) -> &Memory {
        self.runtime.memory()
    }
}

pub fn run(runtime: &mut Runtime) -> Event {
    for _ in 0..100 {
        match runtime.execute(5000) {
            Event::Running => {}
            event => return event,
        }
    }
    Event::Running
}

pub fn expect_ended(event: Event) {
    match event {
        Event::Ended => {}
        other => panic!("expected end, got {:?}", other),
    }
}

pub fn expect_fault(event: Event, code: ErrorCode) -> Error {
    match event {
        Event::Fault(error) if error.is(code) => error,
        other => panic!("expected {:?}, got {:?}", code, other),
    }
}
