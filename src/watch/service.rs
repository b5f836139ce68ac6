use std::{
    collections::{HashMap, HashSet},
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};

use notify::{RecursiveMode, Watcher as _};
use tokio::{
    sync::{Semaphore, mpsc},
    task::{self, JoinSet},
};

use crate::{
    config::Config,
    foundation::error::{ThumbError, ThumbResult},
    pipeline::{JobOutcome, Pipeline},
    watch::{
        debounce::Debouncer,
        events::{dir_present, eligible_arrivals, may_signal_loss},
    },
};

/// Long-running drop-folder service.
///
/// Subscribes to the input directory, converts whatever is already there, then
/// debounces change notifications and runs one job per settled file on the
/// blocking pool. A file never has more than one job in flight; if it settles
/// again while its job runs, it is re-debounced once that job has finished.
pub struct WatchService {
    config: Arc<Config>,
    pipeline: Pipeline,
    outcomes: Option<mpsc::UnboundedSender<JobOutcome>>,
}

impl WatchService {
    /// Build a service over a validated configuration whose directories exist.
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            pipeline: Pipeline::new(Arc::clone(&config)),
            config,
            outcomes: None,
        }
    }

    /// Forward every job outcome to `sink` after it has been logged.
    pub fn with_outcome_sink(mut self, sink: mpsc::UnboundedSender<JobOutcome>) -> Self {
        self.outcomes = Some(sink);
        self
    }

    /// Run until `shutdown` resolves or the watched directory becomes unusable.
    ///
    /// Pending timers are dropped on shutdown; conversions already running on
    /// the blocking pool are not waited for.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> ThumbResult<()> {
        let input = self.config.input_dir.clone();

        let (event_tx, mut events) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = event_tx.send(res);
        })
        .map_err(|e| ThumbError::watch(format!("create watcher: {e}")))?;
        watcher
            .watch(&input, RecursiveMode::NonRecursive)
            .map_err(|e| ThumbError::watch(format!("watch '{}': {e}", input.display())))?;
        tracing::info!(input = %input.display(), "watching for new images");

        // Subscribed first, so anything dropped during the scan still produces an event.
        let scan = self.pipeline.clone();
        let existing = tokio::task::spawn_blocking(move || scan.convert_existing())
            .await
            .map_err(|e| ThumbError::Other(anyhow::anyhow!("startup scan task failed: {e}")))??;
        for outcome in existing {
            self.forward(outcome);
        }

        let (ready_tx, mut ready) = mpsc::unbounded_channel();
        let debouncer = Debouncer::new(self.config.debounce(), ready_tx);
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_jobs));
        let mut jobs = JoinSet::new();
        let mut in_flight = InFlight::default();
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break Ok(());
                }
                Some(res) = events.recv() => {
                    if let Err(e) = self.on_event(res, &debouncer) {
                        break Err(e);
                    }
                }
                Some(path) = ready.recv() => {
                    if in_flight.is_running(&path) {
                        tracing::debug!(path = %path.display(), "changed mid-conversion; deferred");
                        in_flight.defer(path);
                    } else {
                        self.dispatch(path, &permits, &mut jobs, &mut in_flight);
                    }
                }
                Some(joined) = jobs.join_next_with_id(), if !jobs.is_empty() => {
                    let id = match joined {
                        Ok((id, ())) => id,
                        Err(e) => {
                            tracing::error!(error = %e, "conversion task failed");
                            e.id()
                        }
                    };
                    if let Some(path) = in_flight.finish(id) {
                        debouncer.schedule(path);
                    }
                }
                else => break Err(ThumbError::watch("change notification stream closed")),
            }
        };

        debouncer.cancel_all();
        jobs.abort_all();
        drop(watcher);
        if let Err(e) = &result {
            tracing::error!(error = %e, "watcher stopped");
        }
        result
    }

    fn on_event(
        &self,
        res: notify::Result<notify::Event>,
        debouncer: &Debouncer,
    ) -> ThumbResult<()> {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "watch backend reported an error");
                return self.ensure_input_present();
            }
        };
        if may_signal_loss(&event) {
            self.ensure_input_present()?;
        }
        for path in eligible_arrivals(&event, &self.config.valid_extensions) {
            tracing::trace!(path = %path.display(), "change noted");
            debouncer.schedule(path);
        }
        Ok(())
    }

    fn ensure_input_present(&self) -> ThumbResult<()> {
        if dir_present(&self.config.input_dir) {
            Ok(())
        } else {
            Err(ThumbError::watch(format!(
                "input directory '{}' is no longer accessible",
                self.config.input_dir.display()
            )))
        }
    }

    fn dispatch(
        &self,
        path: PathBuf,
        permits: &Arc<Semaphore>,
        jobs: &mut JoinSet<()>,
        in_flight: &mut InFlight,
    ) {
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "settled path is gone");
            return;
        }
        let pipeline = self.pipeline.clone();
        let permits = Arc::clone(permits);
        let sink = self.outcomes.clone();
        let source = path.clone();
        let handle = jobs.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            match task::spawn_blocking(move || pipeline.run(&source)).await {
                Ok(Some(outcome)) => {
                    outcome.report();
                    if let Some(sink) = sink {
                        let _ = sink.send(outcome);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::error!(error = %e, "conversion panicked"),
            }
        });
        in_flight.start(path, handle.id());
    }

    fn forward(&self, outcome: JobOutcome) {
        if let Some(sink) = &self.outcomes {
            let _ = sink.send(outcome);
        }
    }
}

/// Paths with a spawned job that has not been joined yet.
#[derive(Default)]
struct InFlight {
    running: HashMap<PathBuf, task::Id>,
    deferred: HashSet<PathBuf>,
}

impl InFlight {
    fn is_running(&self, path: &Path) -> bool {
        self.running.contains_key(path)
    }

    fn start(&mut self, path: PathBuf, id: task::Id) {
        self.running.insert(path, id);
    }

    fn defer(&mut self, path: PathBuf) {
        self.deferred.insert(path);
    }

    /// Forget the job `id`. Returns its path when the file settled again while
    /// the job was running.
    fn finish(&mut self, id: task::Id) -> Option<PathBuf> {
        let path = self
            .running
            .iter()
            .find_map(|(path, running)| (*running == id).then(|| path.clone()))?;
        self.running.remove(&path);
        self.deferred.remove(&path).then_some(path)
    }
}
