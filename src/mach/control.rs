use super::Error;
use crate::error;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suspend {
    Running,
    Paused,
    Cancelled,
}

/// ## Cooperative pause and cancel
///
/// Shared between the stepping thread and whoever drives it. The stepping
/// thread calls `checkpoint` between steps; a step that has begun always
/// finishes. Cancellation is sticky until `reset` and wins over pause.

#[derive(Debug)]
pub struct Control {
    state: Mutex<Suspend>,
    wake: Condvar,
}

impl Default for Control {
    fn default() -> Control {
        Control {
            state: Mutex::new(Suspend::Running),
            wake: Condvar::new(),
        }
    }
}

impl Control {
    pub fn new() -> Control {
        Control::default()
    }

    fn lock(&self) -> MutexGuard<'_, Suspend> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set(&self, to: Suspend) {
        let mut state = self.lock();
        if *state != Suspend::Cancelled {
            *state = to;
        }
        self.wake.notify_all();
    }

    pub fn pause(&self) {
        self.set(Suspend::Paused);
    }

    pub fn resume(&self) {
        self.set(Suspend::Running);
    }

    pub fn cancel(&self) {
        self.set(Suspend::Cancelled);
    }

    /// Clears a pause or a cancel. Called when a new program is loaded.
    pub fn reset(&self) {
        *self.lock() = Suspend::Running;
        self.wake.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        *self.lock() == Suspend::Paused
    }

    pub fn is_cancelled(&self) -> bool {
        *self.lock() == Suspend::Cancelled
    }

    /// Blocks while paused. Fails once cancelled.
    pub fn checkpoint(&self) -> Result<()> {
        let mut state = self.lock();
        while *state == Suspend::Paused {
            state = self
                .wake
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        match *state {
            Suspend::Cancelled => Err(error!(Interrupted)),
            _ => Ok(()),
        }
    }

    /// Sleeps for `duration` unless cancelled first.
    pub fn sleep(&self, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        let mut state = self.lock();
        loop {
            if *state == Suspend::Cancelled {
                return Err(error!(Interrupted));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            state = self
                .wake
                .wait_timeout(state, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }
}
