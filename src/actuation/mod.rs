//! Actuation dispatcher - turns alert codes into display and indicator work
//!
//! Each physical device gets one worker thread fed by an unbounded queue, so
//! jobs for the same device run one after another in arrival order while the
//! caller never waits on device timing.

use crate::error::ActuationError;
use crate::types::AlertCode;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

mod devices;

pub use devices::{
    scroll_windows, BlinkingIndicator, CharacterLcd, IndicatorPin, LogPanel, LogPin, ScrollingDisplay,
    SysfsGpioPin,
};

/// Something that can show a text message. Blocking.
pub trait TextDisplay: Send + 'static {
    fn display_text(&mut self, message: &str) -> Result<(), ActuationError>;
}

/// Something that can blink. Blocking.
pub trait Indicator: Send + 'static {
    fn blink(&mut self, count: u32) -> Result<(), ActuationError>;
}

/// A unit of actuation work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuationTask {
    DisplayText { message: String },
    Blink { count: u32 },
}

/// Job counters for one device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub completed: u64,
    pub failed: u64,
}

/// Single-writer queue in front of one device
struct DeviceSequencer<J> {
    name: &'static str,
    tx: Sender<J>,
    handle: JoinHandle<()>,
    stats: Arc<Mutex<DeviceStats>>,
}

impl<J: Send + 'static> DeviceSequencer<J> {
    fn spawn<F>(name: &'static str, mut run: F) -> io::Result<Self>
    where
        F: FnMut(J) -> Result<(), ActuationError> + Send + 'static,
    {
        let (tx, rx): (Sender<J>, Receiver<J>) = crossbeam_channel::unbounded();
        let stats = Arc::new(Mutex::new(DeviceStats::default()));
        let worker_stats = stats.clone();
        let handle = thread::Builder::new()
            .name(format!("presently-{name}"))
            .spawn(move || {
                log::debug!("{name} worker started");
                for job in rx.iter() {
                    // A panicking driver costs one job, not the device.
                    let result = panic::catch_unwind(AssertUnwindSafe(|| run(job)));
                    let mut stats = worker_stats.lock();
                    match result {
                        Ok(Ok(())) => stats.completed += 1,
                        Ok(Err(e)) => {
                            stats.failed += 1;
                            log::error!("{name} job failed: {e}");
                        }
                        Err(_) => {
                            stats.failed += 1;
                            log::error!("{name} job panicked");
                        }
                    }
                }
                log::debug!("{name} worker stopped");
            })?;

        Ok(Self {
            name,
            tx,
            handle,
            stats,
        })
    }

    fn submit(&self, job: J) -> Result<(), ActuationError> {
        self.tx.send(job).map_err(|_| ActuationError::WorkerGone(self.name))?;
        let queued = self.tx.len();
        if queued > 1 {
            log::debug!("{} queue depth: {}", self.name, queued);
        }
        Ok(())
    }

    fn stats(&self) -> DeviceStats {
        *self.stats.lock()
    }

    /// Close the queue, let already queued jobs finish, and join the worker.
    fn shutdown(self) -> DeviceStats {
        drop(self.tx);
        if self.handle.join().is_err() {
            log::error!("{} worker panicked", self.name);
        }
        let stats = *self.stats.lock();
        log::info!("{} worker done: {} completed, {} failed", self.name, stats.completed, stats.failed);
        stats
    }
}

pub struct ActuationDispatcher {
    display: DeviceSequencer<String>,
    indicator: DeviceSequencer<u32>,
    blink_count: u32,
}

impl ActuationDispatcher {
    pub const DEFAULT_BLINK_COUNT: u32 = 3;

    pub fn new<D, I>(mut display: D, mut indicator: I, blink_count: u32) -> io::Result<Self>
    where
        D: TextDisplay,
        I: Indicator,
    {
        let display = DeviceSequencer::spawn("display", move |message: String| display.display_text(&message))?;
        let indicator = DeviceSequencer::spawn("indicator", move |count: u32| indicator.blink(count))?;

        Ok(Self {
            display,
            indicator,
            blink_count,
        })
    }

    /// The display and indicator jobs for an alert.
    pub fn tasks_for(&self, code: AlertCode) -> [ActuationTask; 2] {
        [
            ActuationTask::DisplayText {
                message: code.message().to_string(),
            },
            ActuationTask::Blink {
                count: self.blink_count,
            },
        ]
    }

    /// Queue both jobs for `code` and return immediately.
    pub fn dispatch(&self, code: AlertCode) -> Result<(), ActuationError> {
        log::info!("Dispatching actuation for {code}");
        for task in self.tasks_for(code) {
            self.submit(task)?;
        }
        Ok(())
    }

    pub fn submit(&self, task: ActuationTask) -> Result<(), ActuationError> {
        match task {
            ActuationTask::DisplayText { message } => self.display.submit(message),
            ActuationTask::Blink { count } => self.indicator.submit(count),
        }
    }

    /// Display and indicator job counters so far.
    pub fn stats(&self) -> (DeviceStats, DeviceStats) {
        (self.display.stats(), self.indicator.stats())
    }

    /// Drain queued jobs and stop both device workers.
    pub fn shutdown(self) -> (DeviceStats, DeviceStats) {
        log::info!("Waiting for queued actuation jobs to finish...");
        (self.display.shutdown(), self.indicator.shutdown())
    }
}
