/*!
## Rust Machine Module

This Rust module is a virtual machine for LAV programs, the compiled
form of GVmaker C for 160x80 handheld dictionaries.

*/

pub type Address = usize;

#[macro_use]
mod error;
mod config;
mod control;
mod device;
mod format;
mod function;
mod memory;
mod opcode;
mod operation;
mod picker;
mod program;
mod region;
mod runtime;
mod stack;
mod strings;
mod val;
mod window;
mod worker;

pub use config::{Config, ROW_HEIGHT, TEXT_WINDOW_SIZE};
pub use control::Control;
pub use device::{mode, region_len, Detached, Devices, FileSystem, KeyMap, Keyboard, Render, TextConsole};
pub use error::{Error, ErrorCode, Fault};
pub use function::Function;
pub use memory::{Memory, MEMORY_SIZE};
pub use opcode::Opcode;
pub use operation::Operation;
pub use program::{Program, CODE_START, MAGIC, VERSION};
pub use region::Region;
pub use runtime::{Event, Runtime};
pub use stack::Stack;
pub use strings::StringPool;
pub use val::{address, from_bool, Reference, FALSE, TRUE};
pub use window::Window;
pub use worker::Worker;

#[cfg(test)]
mod tests;
