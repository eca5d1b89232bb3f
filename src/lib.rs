//! # GVM
//!
//! A virtual machine for LAV programs, the compiled form of GVmaker C
//! that ran on 160x80 monochrome electronic dictionaries.
//!
//! The machine lives in [`mach`]. It knows nothing about screens or
//! disks: everything outside the interpreter is reached through the
//! peripheral traits in [`mach::Devices`]. [`term`] plugs terminal
//! versions of those in and runs a program from the command line.
//!
//! ```text
//! gvm game.lav --root ./disk
//! ```

pub mod mach;
pub mod term;
