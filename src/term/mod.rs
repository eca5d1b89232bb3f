extern crate ansi_term;
extern crate ctrlc;
use crate::error;
use crate::mach::{Config, Control, Devices, Error, Event, Fault, Program, Runtime};
use ansi_term::Style;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

mod console;
mod files;
mod keys;
mod screen;

pub use console::Console;
pub use files::HostFiles;
pub use keys::{translate, TermKeys};
pub use screen::{Screen, MAX_LABELS};

/// Runs a GVmaker LAV program in the terminal
#[derive(Parser, Debug)]
#[command(name = "gvm", version)]
pub struct Args {
    /// LAV program to run
    #[arg(value_name = "PROGRAM")]
    pub program: PathBuf,

    /// Directory the program sees as its disk
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Operand stack capacity in words
    #[arg(long, value_name = "N", default_value_t = Config::default().stack_size)]
    pub stack_size: usize,

    /// More logging on stderr; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub fn main() {
    let args = Args::parse();
    init_tracing(match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    });
    if let Err(error) = main_loop(&args) {
        eprintln!("{}", Style::new().bold().paint(error.to_string()));
        std::process::exit(1);
    }
}

fn init_tracing(level: Level) {
    let _ = tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load(path: &Path) -> Result<Program, Error> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(error) => return Err(error!(HostIo; &format!("{}: {}", path.display(), error))),
    };
    Program::new(&path.display().to_string(), data)
}

fn main_loop(args: &Args) -> Result<(), Error> {
    let program = load(&args.program)?;
    let config = Config {
        stack_size: args.stack_size,
        ..Config::default()
    };
    let screen = Screen::new(config.screen_width, config.screen_height)
        .with_output(Box::new(std::io::stdout()));
    let console = Console::new().with_output(Box::new(std::io::stdout()));
    let files = HostFiles::new(&args.root)?;
    let control = Arc::new(Control::new());
    let keys = TermKeys::new(control.clone())?;
    let devices = Devices {
        render: Box::new(screen),
        text: Box::new(console),
        keys: Box::new(keys),
        files: Box::new(files),
    };
    let mut runtime = Runtime::new(config, devices)?.with_control(control.clone());
    runtime.load(program);

    let int_moved = control.clone();
    if let Err(error) = ctrlc::set_handler(move || int_moved.cancel()) {
        return Err(error!(HostIo; &error.to_string()));
    }

    let result = loop {
        match runtime.execute(5000) {
            Event::Running => {}
            Event::Ended => break Ok(()),
            Event::Fault(error) => match error.fault() {
                Fault::Interrupted => break Ok(()),
                _ => break Err(error),
            },
        }
    };
    runtime.dispose();
    result
}
