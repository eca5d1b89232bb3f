use crate::error;
use crate::mach::{Control, Error, Keyboard};
use mortal::{Event, Key, PrepareConfig, PrepareState, Terminal};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

type Result<T> = std::result::Result<T, Error>;

const POLL: Duration = Duration::from_millis(50);

/// ## Terminal keyboard
///
/// Reads raw key events from the terminal and translates them to handheld
/// key codes. A terminal reports presses but not releases, so a key counts
/// as held from the moment it is read until the program releases it.
/// Ctrl-C cancels the session, either as a signal or, where the terminal
/// delivers it as a key, from here.

pub struct TermKeys {
    terminal: Terminal,
    state: Option<PrepareState>,
    control: Arc<Control>,
    pending: VecDeque<i32>,
    held: HashSet<i32>,
}

impl TermKeys {
    pub fn new(control: Arc<Control>) -> Result<TermKeys> {
        let terminal = Terminal::new()?;
        let state = terminal.prepare(TermKeys::prepare_config())?;
        Ok(TermKeys {
            terminal,
            state: Some(state),
            control,
            pending: VecDeque::new(),
            held: HashSet::new(),
        })
    }

    /// Raw input that still lets Ctrl-C raise SIGINT, so a program that
    /// never reads a key can be stopped.
    pub fn prepare_config() -> PrepareConfig {
        PrepareConfig {
            block_signals: false,
            ..PrepareConfig::default()
        }
    }

    /// Reads one event, waiting at most `timeout`.
    fn poll(&mut self, timeout: Duration) -> Result<Option<i32>> {
        match self.terminal.read_event(Some(timeout))? {
            Some(Event::Key(Key::Ctrl('c'))) => {
                self.control.cancel();
                Err(error!(Interrupted))
            }
            Some(Event::Key(key)) => {
                let code = translate(key);
                if let Some(code) = code {
                    self.held.insert(code);
                }
                Ok(code)
            }
            _ => Ok(None),
        }
    }

    fn wait(&mut self) -> Result<i32> {
        if let Some(code) = self.pending.pop_front() {
            return Ok(code);
        }
        loop {
            if self.control.is_cancelled() {
                return Err(error!(Interrupted));
            }
            if let Some(code) = self.poll(POLL)? {
                return Ok(code);
            }
        }
    }
}

impl Drop for TermKeys {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            if let Err(error) = self.terminal.restore(state) {
                warn!("keyboard: {}", error);
            }
        }
    }
}

impl Keyboard for TermKeys {
    fn getchar(&mut self) -> Result<i32> {
        self.wait()
    }

    fn inkey(&mut self) -> i32 {
        if let Some(code) = self.pending.pop_front() {
            return code;
        }
        match self.poll(Duration::from_millis(0)) {
            Ok(Some(code)) => code,
            _ => 0,
        }
    }

    fn raw_key(&mut self) -> Result<i32> {
        self.wait()
    }

    /// Codes of 128 and up ask whether any key is held and answer with it.
    fn check_key(&mut self, key: i32) -> i32 {
        if let Ok(Some(code)) = self.poll(Duration::from_millis(0)) {
            self.pending.push_back(code);
        }
        if key >= 128 {
            self.held.iter().next().copied().unwrap_or(0)
        } else if self.held.contains(&key) {
            key
        } else {
            0
        }
    }

    fn release_key(&mut self, key: i32) {
        if key >= 128 {
            self.held.clear();
        } else {
            self.held.remove(&key);
        }
    }
}

/// Handheld key code for a terminal key.
pub fn translate(key: Key) -> Option<i32> {
    Some(match key {
        Key::Enter => 13,
        Key::Escape => 27,
        Key::Up => 20,
        Key::Down => 21,
        Key::Right => 22,
        Key::Left => 23,
        Key::PageUp => 19,
        Key::PageDown => 14,
        Key::Tab => 25,
        Key::F(n) if (1..=4).contains(&n) => 27 + n as i32,
        Key::Char(c) if c.is_ascii_graphic() || c == ' ' => c.to_ascii_lowercase() as i32,
        _ => return None,
    })
}
