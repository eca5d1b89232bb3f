use super::{Control, Error, Event, Runtime};
use crate::error;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

type Result<T> = std::result::Result<T, Error>;

const BATCH: usize = 5000;

/// ## Dedicated stepping thread
///
/// Moves a loaded session onto its own thread and steps it until it ends
/// or faults. Other threads steer it through the shared [`Control`].

pub struct Worker {
    control: Arc<Control>,
    handle: JoinHandle<(Runtime, Event)>,
}

impl Worker {
    pub fn spawn(mut runtime: Runtime) -> Worker {
        let control = runtime.control();
        let handle = thread::spawn(move || {
            let event = loop {
                match runtime.execute(BATCH) {
                    Event::Running => continue,
                    event => break event,
                }
            };
            debug!(?event, "worker finished");
            (runtime, event)
        });
        Worker { control, handle }
    }

    pub fn control(&self) -> &Arc<Control> {
        &self.control
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the run to finish and hands the session back.
    pub fn join(self) -> Result<(Runtime, Event)> {
        self.handle
            .join()
            .map_err(|_| error!(HostIo; "WORKER THREAD PANICKED"))
    }
}
