use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{sync::mpsc, task::JoinHandle};

/// Per-path quiescence timers.
///
/// Each [`Debouncer::schedule`] call (re)starts the timer for that path; only
/// the newest timer of a path may fire, and firing sends the path once on the
/// `ready` channel. All timers live in one map behind one mutex.
pub struct Debouncer {
    delay: Duration,
    ready: mpsc::UnboundedSender<PathBuf>,
    timers: Arc<Mutex<Timers>>,
}

#[derive(Default)]
struct Timers {
    next_generation: u64,
    pending: HashMap<PathBuf, Timer>,
}

struct Timer {
    generation: u64,
    task: JoinHandle<()>,
}

impl Debouncer {
    /// Create a debouncer that emits settled paths on `ready` after `delay` of quiet.
    pub fn new(delay: Duration, ready: mpsc::UnboundedSender<PathBuf>) -> Self {
        Self {
            delay,
            ready,
            timers: Arc::new(Mutex::new(Timers::default())),
        }
    }

    /// Start or restart the timer for `path`. Must be called inside a tokio runtime.
    pub fn schedule(&self, path: PathBuf) {
        let mut timers = self.timers.lock();
        timers.next_generation += 1;
        let generation = timers.next_generation;

        let task = tokio::spawn(fire(
            Arc::clone(&self.timers),
            path.clone(),
            generation,
            self.delay,
            self.ready.clone(),
        ));
        if let Some(previous) = timers.pending.insert(path, Timer { generation, task }) {
            previous.task.abort();
        }
    }

    /// Number of paths still waiting for their window to elapse.
    pub fn pending(&self) -> usize {
        self.timers.lock().pending.len()
    }

    /// Drop every pending timer without firing it.
    pub fn cancel_all(&self) {
        for (_, timer) in self.timers.lock().pending.drain() {
            timer.task.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn fire(
    timers: Arc<Mutex<Timers>>,
    path: PathBuf,
    generation: u64,
    delay: Duration,
    ready: mpsc::UnboundedSender<PathBuf>,
) {
    tokio::time::sleep(delay).await;
    {
        let mut timers = timers.lock();
        // A newer schedule for this path superseded us.
        match timers.pending.get(&path) {
            Some(timer) if timer.generation == generation => {
                timers.pending.remove(&path);
            }
            _ => return,
        }
    }
    let _ = ready.send(path);
}

#[cfg(test)]
#[path = "../../tests/unit/watch/debounce.rs"]
mod tests;
