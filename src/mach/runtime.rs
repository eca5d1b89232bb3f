use super::device::{mode, region_len, Devices};
use super::format;
use super::picker;
use super::val::{address, from_bool, Reference};
use super::{Address, Config, Control, Error, Function, Memory, Opcode, Operation, Program, Stack, StringPool};
use crate::error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

type Result<T> = std::result::Result<T, Error>;

/// Result of running a batch of steps with [`Runtime::execute`].
#[derive(Debug)]
pub enum Event {
    /// All cycles ran with the program still running.
    Running,
    Ended,
    /// The run stopped on this error. The machine is ended.
    Fault(Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unloaded,
    Ready,
    Running,
    Ended,
}

/// ## Virtual machine session
///
/// Owns one loaded program, its operand stack, unified memory and the
/// peripherals. `step` executes exactly one opcode. Any error ends the
/// run; the session must be disposed or reloaded before it steps again.

pub struct Runtime {
    config: Config,
    program: Option<Program>,
    stack: Stack,
    memory: Memory,
    devices: Devices,
    control: Arc<Control>,
    seed: i32,
    state: State,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("state", &self.state)
            .field("stack", &self.stack)
            .field("memory", &self.memory)
            .finish()
    }
}

impl Runtime {
    /// Builds a session and maps every window the peripherals offer into
    /// memory at the configured bases.
    pub fn new(config: Config, devices: Devices) -> Result<Runtime> {
        let mut memory = Memory::new(StringPool::new(config.string_base, config.string_size));
        if let Some(window) = devices.render.graph_window() {
            memory.install(config.graph_base, window)?;
        }
        if let Some(window) = devices.render.buffer_window() {
            memory.install(config.buffer_base, window)?;
        }
        if let Some(window) = devices.text.text_window() {
            memory.install(config.text_base, window)?;
        }
        Ok(Runtime {
            stack: Stack::new(config.stack_size),
            config,
            program: None,
            memory,
            devices,
            control: Arc::new(Control::new()),
            seed: 0,
            state: State::Unloaded,
        })
    }

    /// Shares `control` with peripherals built before the session.
    pub fn with_control(mut self, control: Arc<Control>) -> Runtime {
        self.control = control;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn control(&self) -> Arc<Control> {
        self.control.clone()
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn devices_mut(&mut self) -> &mut Devices {
        &mut self.devices
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    /// Program offset of the next opcode.
    pub fn offset(&self) -> Option<usize> {
        self.program.as_ref().map(Program::offset)
    }

    /// Replaces any loaded program and readies it to run from the first
    /// opcode with fresh memory. A pending pause or cancel is cleared.
    pub fn load(&mut self, mut program: Program) {
        if self.program.is_some() {
            self.devices.render.clear_buffer();
            self.devices.render.refresh();
        }
        self.control.reset();
        self.memory.clear();
        self.devices.text.set_text_mode(0);
        self.stack.clear();
        self.seed = 0;
        program.reset();
        debug!(name = program.name(), len = program.len(), "loaded");
        self.program = Some(program);
        self.state = State::Ready;
    }

    pub fn is_ended(&self) -> bool {
        self.state == State::Ended
    }

    /// Releases the peripherals' resources. Memory is left as it was.
    pub fn dispose(&mut self) {
        if self.program.take().is_some() {
            self.devices.files.dispose();
            self.state = State::Ended;
            debug!("disposed");
        }
    }

    /// Runs up to `cycles` steps, checking the session control between
    /// each.
    pub fn execute(&mut self, cycles: usize) -> Event {
        if self.is_ended() {
            return Event::Ended;
        }
        for _ in 0..cycles {
            if let Err(error) = self.control.checkpoint() {
                self.state = State::Ended;
                return Event::Fault(error);
            }
            if let Err(error) = self.step() {
                return Event::Fault(error);
            }
            if self.is_ended() {
                return Event::Ended;
            }
        }
        Event::Running
    }

    /// Executes one opcode.
    pub fn step(&mut self) -> Result<()> {
        match self.state {
            State::Unloaded => return Err(error!(NotLoaded)),
            State::Ended => return Err(error!(ProgramEnded)),
            State::Ready | State::Running => {}
        }
        let mut program = match self.program.take() {
            Some(program) => program,
            None => return Err(error!(NotLoaded)),
        };
        self.state = State::Running;
        let offset = program.offset();
        let result = self.dispatch(&mut program);
        self.program = Some(program);
        if let Err(error) = result {
            self.state = State::Ended;
            let error = match error.offset() {
                Some(_) => error,
                None => error.at_offset(offset),
            };
            warn!("{}", error);
            return Err(error);
        }
        if self.state == State::Ended {
            debug!(offset, "program ended");
        }
        Ok(())
    }

    fn fetch_addr(program: &mut Program) -> Result<Address> {
        Ok(address(program.int16()? as i32))
    }

    fn region_start(&self) -> Address {
        self.memory.region().start()
    }

    fn push(&mut self, val: i32) -> Result<()> {
        self.stack.push(val)
    }

    fn pop(&mut self) -> Result<i32> {
        self.stack.pop()
    }

    fn binary(&mut self, f: fn(i32, i32) -> i32) -> Result<()> {
        let (lhs, rhs) = self.stack.pop_2()?;
        self.push(f(lhs, rhs))
    }

    fn immediate(&mut self, program: &mut Program, f: fn(i32, i32) -> i32) -> Result<()> {
        let imm = program.int16()? as i32;
        let val = self.pop()?;
        self.push(f(val, imm))
    }

    fn load_value(&mut self, addr: Address, width: usize) -> Result<()> {
        let val = match width {
            1 => self.memory.get_char(addr),
            2 => self.memory.get_int(addr),
            _ => self.memory.get_long(addr),
        };
        self.push(val)
    }

    fn read_reference(&self, reference: &Reference) -> (Address, i32) {
        let addr = reference.resolve(self.region_start());
        let val = match reference.width {
            2 => self.memory.get_int(addr),
            width => self.memory.get_bytes(addr, width),
        };
        (addr, val)
    }

    fn increment(&mut self, delta: i32, post: bool) -> Result<()> {
        let reference = Reference::decode(self.pop()?);
        let (addr, old) = self.read_reference(&reference);
        let new = old.wrapping_add(delta);
        self.memory.set_bytes(addr, reference.width, new);
        self.push(if post { old } else { new })
    }

    fn dispatch(&mut self, program: &mut Program) -> Result<()> {
        let offset = program.offset();
        let byte = program.uint8()?;
        let op = match Opcode::from_byte(byte) {
            Some(op) => op,
            None => return Err(error!(IllegalOpcode, offset; &format!("0x{:02X}", byte))),
        };
        trace!(offset, %op);
        match op {
            Opcode::Nop | Opcode::LoadAll | Opcode::Beep => {}
            Opcode::PushChar => {
                let val = program.uint8()? as i32;
                self.push(val)?;
            }
            Opcode::PushInt => {
                let val = program.int16()? as i32;
                self.push(val)?;
            }
            Opcode::PushLong => {
                let val = program.int32()?;
                self.push(val)?;
            }
            Opcode::LoadChar | Opcode::LoadInt | Opcode::LoadLong => {
                let addr = Runtime::fetch_addr(program)?;
                self.load_value(addr, width_of(op))?;
            }
            Opcode::IndexChar | Opcode::IndexInt | Opcode::IndexLong => {
                let base = self.pop()?;
                let addr = address(base.wrapping_add(program.int16()? as i32));
                self.load_value(addr, width_of(op))?;
            }
            Opcode::RefChar | Opcode::RefInt | Opcode::RefLong => {
                let base = self.pop()?;
                let addr = address(base.wrapping_add(program.int16()? as i32));
                self.push(Reference::new(addr, width_of(op)).encode())?;
            }
            Opcode::Intern => {
                let val = self.memory.strings_mut().add_string(program)?;
                self.push(val)?;
            }
            Opcode::LocalChar | Opcode::LocalInt | Opcode::LocalLong => {
                let addr = Runtime::fetch_addr(program)? + self.region_start();
                self.load_value(addr & 0xffff, width_of(op))?;
            }
            Opcode::LocalIndexChar | Opcode::LocalIndexInt | Opcode::LocalIndexLong => {
                let base = self.pop()?;
                let addr = address(base.wrapping_add(program.int16()? as i32)) + self.region_start();
                self.load_value(addr & 0xffff, width_of(op))?;
            }
            Opcode::LocalRefChar | Opcode::LocalRefInt | Opcode::LocalRefLong => {
                let base = self.pop()?;
                let addr = address(base.wrapping_add(program.int16()? as i32)) + self.region_start();
                self.push(Reference::new(addr & 0xffff, width_of(op)).encode())?;
            }
            Opcode::Addr => {
                let base = self.pop()?;
                let addr = address(base.wrapping_add(program.int16()? as i32));
                self.push(addr as i32)?;
            }
            Opcode::LocalIndexAddr => {
                let base = self.pop()?;
                let addr = address(base.wrapping_add(program.int16()? as i32)) + self.region_start();
                self.push((addr & 0xffff) as i32)?;
            }
            Opcode::LocalAddr => {
                let addr = Runtime::fetch_addr(program)? + self.region_start();
                self.push((addr & 0xffff) as i32)?;
            }
            Opcode::TextBase => self.push(self.config.text_base as i32)?,
            Opcode::GraphBase => self.push(self.config.graph_base as i32)?,
            Opcode::BufferBase => self.push(self.config.buffer_base as i32)?,
            Opcode::Neg => {
                let val = self.pop()?;
                self.push(Operation::negate(val))?;
            }
            Opcode::PreInc => self.increment(1, false)?,
            Opcode::PreDec => self.increment(-1, false)?,
            Opcode::PostInc => self.increment(1, true)?,
            Opcode::PostDec => self.increment(-1, true)?,
            Opcode::Add => self.binary(Operation::sum)?,
            Opcode::Sub => self.binary(Operation::subtract)?,
            Opcode::BitAnd => self.binary(|l, r| l & r)?,
            Opcode::BitOr => self.binary(|l, r| l | r)?,
            Opcode::BitNot => {
                let val = self.pop()?;
                self.push(!val)?;
            }
            Opcode::BitXor => self.binary(|l, r| l ^ r)?,
            Opcode::And => self.binary(Operation::and)?,
            Opcode::Or => self.binary(Operation::or)?,
            Opcode::Not => {
                let val = self.pop()?;
                self.push(Operation::not(val))?;
            }
            Opcode::Mul => self.binary(Operation::multiply)?,
            Opcode::Div => self.binary(Operation::divide)?,
            Opcode::Mod => self.binary(Operation::modulo)?,
            Opcode::Shl => self.binary(Operation::shift_left)?,
            Opcode::Shr => self.binary(Operation::shift_right)?,
            Opcode::Eq => self.binary(Operation::equal)?,
            Opcode::NotEq => self.binary(Operation::not_equal)?,
            Opcode::LtEq => self.binary(Operation::less_equal)?,
            Opcode::GtEq => self.binary(Operation::greater_equal)?,
            Opcode::Gt => self.binary(Operation::greater)?,
            Opcode::Lt => self.binary(Operation::less)?,
            Opcode::Store => {
                let val = self.pop()?;
                let reference = Reference::decode(self.pop()?);
                let addr = reference.resolve(self.region_start());
                self.memory.set_bytes(addr, reference.width, val);
                self.push(val)?;
            }
            Opcode::Deref => {
                let addr = address(self.pop()?);
                self.push(self.memory.get_char(addr))?;
            }
            Opcode::MakeRef => {
                let addr = address(self.pop()?);
                self.push(Reference::new(addr, 1).encode())?;
            }
            Opcode::Pop => {
                self.pop()?;
            }
            Opcode::JumpZero | Opcode::JumpNotZero => {
                let target = program.uint24()? as usize;
                let zero = self.stack.last_value()? == 0;
                if zero == (op == Opcode::JumpZero) {
                    program.set_offset(target);
                }
            }
            Opcode::Jump => {
                let target = program.uint24()? as usize;
                program.set_offset(target);
            }
            Opcode::Mark => {
                let addr = Runtime::fetch_addr(program)?;
                let region = self.memory.region_mut();
                region.set_end(addr);
                region.set_start(addr);
            }
            Opcode::Invoke => {
                let target = program.uint24()? as usize;
                let end = self.memory.region().end();
                self.memory.set_addr(end, program.offset());
                program.set_offset(target);
            }
            Opcode::Entry => self.entry(program)?,
            Opcode::Return => {
                let start = self.region_start();
                let offset = self.memory.get_addr(start);
                let caller = address(self.memory.get_int(start + 3));
                let region = self.memory.region_mut();
                region.set_end(start);
                region.set_start(caller);
                program.set_offset(offset);
            }
            Opcode::End | Opcode::Exit => self.state = State::Ended,
            Opcode::DataInit => {
                let addr = Runtime::fetch_addr(program)?;
                let len = program.int16()? as u16 as usize;
                for i in 0..len {
                    let b = program.uint8()?;
                    self.memory.set_owned_byte(addr + i, b);
                }
            }
            Opcode::Invalid => return Err(error!(IllegalOpcode, offset; "0x43")),
            Opcode::AddImm => self.immediate(program, Operation::sum)?,
            Opcode::SubImm => self.immediate(program, Operation::subtract)?,
            Opcode::MulImm => self.immediate(program, Operation::multiply)?,
            Opcode::DivImm => self.immediate(program, Operation::divide)?,
            Opcode::ModImm => self.immediate(program, Operation::modulo)?,
            Opcode::ShlImm => self.immediate(program, Operation::shift_left)?,
            Opcode::ShrImm => self.immediate(program, Operation::shift_right_unsigned)?,
            Opcode::EqImm => self.immediate(program, Operation::equal)?,
            Opcode::NotEqImm => self.immediate(program, Operation::not_equal)?,
            Opcode::GtImm => self.immediate(program, Operation::greater)?,
            Opcode::LtImm => self.immediate(program, Operation::less)?,
            Opcode::GtEqImm => self.immediate(program, Operation::greater_equal)?,
            Opcode::LtEqImm => self.immediate(program, Operation::less_equal)?,
            _ => self.system(op)?,
        }
        Ok(())
    }

    fn entry(&mut self, program: &mut Program) -> Result<()> {
        let start = self.region_start();
        let end = self.memory.region().end();
        self.memory.set_bytes(end + 3, 2, start as i32);
        let size = program.int16()? as u16 as usize;
        let count = program.uint8()? as usize;
        let region = self.memory.region_mut();
        region.set_start(end);
        region.set_end(end + size);
        for i in 0..count {
            let val = self.pop()?;
            self.memory.set_long(end + 5 + 4 * (count - 1 - i), val);
        }
        Ok(())
    }

    fn system(&mut self, op: Opcode) -> Result<()> {
        match op {
            Opcode::PutChar => {
                let c = self.pop()? & 0xff;
                self.devices.text.add_char(c as u16);
                self.devices.text.update_lcd(0);
            }
            Opcode::GetChar => {
                let key = self.devices.keys.getchar()?;
                self.push(key)?;
            }
            Opcode::Printf => self.printf()?,
            Opcode::Sprintf => self.sprintf()?,
            Opcode::StrCpy => {
                let src = address(self.pop()?);
                let dst = address(self.pop()?);
                Function::strcpy(&mut self.memory, dst, src);
            }
            Opcode::StrLen => {
                let addr = address(self.pop()?);
                self.push(Function::strlen(&self.memory, addr))?;
            }
            Opcode::SetScreen => {
                let mode = self.pop()? as u8;
                self.devices.text.set_text_mode(mode);
            }
            Opcode::UpdateLcd => {
                let mode = self.pop()?;
                self.devices.text.update_lcd(mode);
            }
            Opcode::Delay => {
                let ms = (self.pop()? & 0x7fff) * 3 / 4;
                if ms > 0 {
                    self.control.sleep(Duration::from_millis(ms as u64))?;
                }
            }
            Opcode::WriteBlock => {
                let args = self.stack.pop_n(6)?;
                let (x, y, w, h) = (args[0] as i16, args[1] as i16, args[2] as i16, args[3] as i16);
                let image = self.memory.read_block(address(args[5]), region_len(w, h));
                self.devices.render.set_draw_mode(args[4]);
                self.devices.render.draw_region(x, y, w, h, &image);
            }
            Opcode::Refresh => self.devices.render.refresh(),
            Opcode::TextOut => {
                let args = self.stack.pop_n(4)?;
                let text = self.memory.c_string(address(args[2]));
                self.devices.render.set_draw_mode(args[3]);
                self.devices.render.draw_string(args[0] as i16, args[1] as i16, &text);
            }
            Opcode::Block | Opcode::Rectangle => {
                let args = self.stack.pop_n(5)?;
                let fill = if op == Opcode::Block { mode::FILL } else { 0 };
                self.devices.render.set_draw_mode(args[4] | fill);
                self.draw_rect(&args);
            }
            Opcode::ClearScreen => self.devices.render.clear_buffer(),
            Opcode::Abs => {
                let val = self.pop()?;
                self.push(Operation::abs(val))?;
            }
            Opcode::Rand => {
                let val = Function::rand(&mut self.seed);
                self.push(val)?;
            }
            Opcode::Srand => self.seed = self.pop()?,
            Opcode::Locate => {
                let col = self.pop()? as u8;
                let row = self.pop()? as u8;
                self.devices.text.set_location(row, col);
            }
            Opcode::Inkey => {
                let key = self.devices.keys.inkey();
                self.push(key)?;
            }
            Opcode::Point => {
                let args = self.stack.pop_n(3)?;
                self.devices.render.set_draw_mode(args[2] ^ mode::GRAPH);
                self.devices.render.draw_point(args[0] as i16, args[1] as i16);
            }
            Opcode::GetPoint => {
                let y = self.pop()? as i16;
                let x = self.pop()? as i16;
                let val = self.devices.render.get_point(x, y);
                self.push(val)?;
            }
            Opcode::Line => {
                let args = self.stack.pop_n(5)?;
                self.devices.render.set_draw_mode(args[4] ^ mode::GRAPH);
                let (x0, y0, x1, y1) = (args[0] as i16, args[1] as i16, args[2] as i16, args[3] as i16);
                self.devices.render.draw_line(x0, y0, x1, y1);
            }
            Opcode::Box => {
                let args = self.stack.pop_n(6)?;
                self.devices.render.set_draw_mode(shape_mode(args[5], args[4]));
                self.draw_rect(&args);
            }
            Opcode::Circle => {
                let args = self.stack.pop_n(5)?;
                self.devices.render.set_draw_mode(shape_mode(args[4], args[3]));
                let (x, y, r) = (args[0] as i16, args[1] as i16, args[2] as i16);
                self.devices.render.draw_oval(x, y, r, r);
            }
            Opcode::Ellipse => {
                let args = self.stack.pop_n(6)?;
                self.devices.render.set_draw_mode(shape_mode(args[5], args[4]));
                let (x, y, a, b) = (args[0] as i16, args[1] as i16, args[2] as i16, args[3] as i16);
                self.devices.render.draw_oval(x, y, a, b);
            }
            Opcode::IsAlnum
            | Opcode::IsAlpha
            | Opcode::IsCntrl
            | Opcode::IsDigit
            | Opcode::IsGraph
            | Opcode::IsLower
            | Opcode::IsPrint
            | Opcode::IsPunct
            | Opcode::IsSpace
            | Opcode::IsUpper
            | Opcode::IsXDigit => {
                let c = self.pop()?;
                let val = Function::ctype(op, c).unwrap_or(false);
                self.push(from_bool(val))?;
            }
            Opcode::StrCat => {
                let src = address(self.pop()?);
                let dst = address(self.pop()?);
                Function::strcat(&mut self.memory, dst, src);
            }
            Opcode::StrChr => {
                let c = self.pop()? as u8;
                let addr = address(self.pop()?);
                self.push(Function::strchr(&self.memory, addr, c))?;
            }
            Opcode::StrCmp | Opcode::StrStr => {
                let rhs = address(self.pop()?);
                let lhs = address(self.pop()?);
                let val = if op == Opcode::StrCmp {
                    Function::strcmp(&self.memory, lhs, rhs)
                } else {
                    Function::strstr(&self.memory, lhs, rhs)
                };
                self.push(val)?;
            }
            Opcode::ToLower => {
                let c = self.pop()?;
                self.push(Function::to_lower(c))?;
            }
            Opcode::ToUpper => {
                let c = self.pop()?;
                self.push(Function::to_upper(c))?;
            }
            Opcode::MemSet => {
                let len = self.pop()? as i16;
                let val = self.pop()? as u8;
                let addr = address(self.pop()?);
                Function::memset(&mut self.memory, addr, val, len);
            }
            Opcode::MemCpy | Opcode::MemMove => {
                let len = self.pop()? as i16;
                let src = address(self.pop()?);
                let dst = address(self.pop()?);
                if op == Opcode::MemCpy {
                    Function::memcpy(&mut self.memory, dst, src, len);
                } else {
                    Function::memmove(&mut self.memory, dst, src, len);
                }
            }
            Opcode::FOpen => {
                let args = self.stack.pop_n(2)?;
                let name = self.memory.c_string(address(args[0]));
                let mode = self.memory.c_string(address(args[1]));
                let fp = self.devices.files.open(&name, &mode);
                self.push(fp)?;
            }
            Opcode::FClose => {
                let fp = self.pop()?;
                self.devices.files.close(fp);
            }
            Opcode::FRead => {
                let args = self.stack.pop_n(4)?;
                let mut buf = vec![0; (args[2] as i16).max(0) as usize];
                let count = self.devices.files.read(args[3], &mut buf);
                let stored = (count.max(0) as usize).min(buf.len());
                self.memory.write_block(address(args[0]), &buf[..stored]);
                self.push(count)?;
            }
            Opcode::FWrite => {
                let args = self.stack.pop_n(4)?;
                let len = (args[2] as i16).max(0) as usize;
                let buf = self.memory.read_block(address(args[0]), len);
                let count = self.devices.files.write(args[3], &buf);
                self.push(count)?;
            }
            Opcode::FSeek => {
                let args = self.stack.pop_n(3)?;
                let pos = self.devices.files.seek(args[0], args[1], args[2]);
                self.push(pos)?;
            }
            Opcode::FTell => {
                let fp = self.pop()?;
                let pos = self.devices.files.tell(fp);
                self.push(pos)?;
            }
            Opcode::FEof => {
                let fp = self.pop()?;
                let eof = self.devices.files.eof(fp);
                self.push(from_bool(eof))?;
            }
            Opcode::Rewind => {
                let fp = self.pop()?;
                self.devices.files.rewind(fp);
            }
            Opcode::GetC => {
                let fp = self.pop()?;
                let c = self.devices.files.getc(fp);
                self.push(c)?;
            }
            Opcode::PutC => {
                let fp = self.pop()?;
                let c = self.pop()?;
                let val = self.devices.files.putc(c, fp);
                self.push(val)?;
            }
            Opcode::MakeDir | Opcode::DeleteFile | Opcode::ChDir => {
                let addr = address(self.pop()?);
                let name = self.memory.c_string(addr);
                let files = &mut self.devices.files;
                let ok = match op {
                    Opcode::MakeDir => files.make_dir(&name),
                    Opcode::DeleteFile => files.delete_file(&name),
                    _ => files.change_dir(&name),
                };
                self.push(from_bool(ok))?;
            }
            Opcode::GetMs => self.push(Function::ticks())?,
            Opcode::CheckKey => {
                let key = self.pop()? & 0xffff;
                let val = self.devices.keys.check_key(key);
                self.push(val)?;
            }
            Opcode::Crc16 => {
                let len = self.pop()? as i16;
                let addr = address(self.pop()?);
                self.push(Function::crc16(&self.memory, addr, len))?;
            }
            Opcode::Secret => {
                let key = address(self.pop()?);
                let len = self.pop()? as i16;
                let addr = address(self.pop()?);
                Function::secret(&mut self.memory, addr, len, key);
            }
            Opcode::FileList => {
                let addr = address(self.pop()?);
                let val = picker::pick(&mut self.devices, &mut self.memory, &self.config, addr)?;
                self.push(val)?;
            }
            Opcode::GetTime => {
                let addr = address(self.pop()?);
                Function::time(&mut self.memory, addr);
            }
            Opcode::SetTime => {
                self.pop()?;
            }
            Opcode::GetWord => {
                self.pop()?;
                let key = self.devices.keys.getchar()?;
                self.push(key)?;
            }
            Opcode::XDraw => {
                let mode = self.pop()?;
                self.devices.render.xdraw(mode);
            }
            Opcode::ReleaseKey => {
                let key = self.pop()? & 0xffff;
                self.devices.keys.release_key(key);
            }
            Opcode::GetBlock => {
                let args = self.stack.pop_n(6)?;
                let (x, y, w, h) = (args[0] as i16, args[1] as i16, args[2] as i16, args[3] as i16);
                self.devices.render.set_draw_mode(args[4]);
                let image = self.devices.render.get_region(x, y, w, h);
                self.memory.write_block(address(args[5]), &image);
            }
            Opcode::Cos => {
                let degrees = self.pop()? as i16;
                self.push(Function::cos(degrees))?;
            }
            Opcode::Sin => {
                let degrees = self.pop()? as i16;
                self.push(Function::sin(degrees))?;
            }
            Opcode::FillArea => return Err(error!(Unimplemented; "FILLAREA")),
            _ => return Err(error!(IllegalOpcode; op.mnemonic())),
        }
        Ok(())
    }

    fn draw_rect(&mut self, args: &[i32]) {
        let (x0, y0, x1, y1) = (args[0] as i16, args[1] as i16, args[2] as i16, args[3] as i16);
        self.devices.render.draw_rect(x0, y0, x1, y1);
    }

    /// Pops the argument count, then the block of arguments.
    fn format_args(&mut self) -> Result<Vec<i32>> {
        let count = (self.pop()? & 0xff) as usize;
        self.stack.pop_n(count)
    }

    fn printf(&mut self) -> Result<()> {
        let args = self.format_args()?;
        if let Some((fmt, rest)) = args.split_first() {
            for c in format::expand(&self.memory, address(*fmt), rest, true) {
                self.devices.text.add_char(c);
            }
        }
        self.devices.text.update_lcd(0);
        Ok(())
    }

    fn sprintf(&mut self) -> Result<()> {
        let args = self.format_args()?;
        if args.len() < 2 {
            return Ok(());
        }
        let bytes: Vec<u8> = format::expand(&self.memory, address(args[1]), &args[2..], false)
            .into_iter()
            .map(|c| c as u8)
            .collect();
        let dst = address(args[0]);
        self.memory.write_block(dst, &bytes);
        self.memory.set_byte(dst + bytes.len(), 0);
        Ok(())
    }
}

fn width_of(op: Opcode) -> usize {
    match op {
        Opcode::LoadChar
        | Opcode::IndexChar
        | Opcode::RefChar
        | Opcode::LocalChar
        | Opcode::LocalIndexChar
        | Opcode::LocalRefChar => 1,
        Opcode::LoadInt
        | Opcode::IndexInt
        | Opcode::RefInt
        | Opcode::LocalInt
        | Opcode::LocalIndexInt
        | Opcode::LocalRefInt => 2,
        _ => 4,
    }
}

/// Shape calls draw on the screen unless the program asks for the buffer.
fn shape_mode(mode: i32, fill: i32) -> i32 {
    let mut mode = mode ^ mode::GRAPH;
    if fill & 0xff != 0 {
        mode |= mode::FILL;
    }
    mode
}
