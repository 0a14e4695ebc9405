use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFrequency {
    Seconds(u64),
    Daily,
}

impl JobFrequency {
    pub fn duration(&self) -> Duration {
        match self {
            JobFrequency::Seconds(secs) => Duration::from_secs((*secs).max(1)),
            JobFrequency::Daily => Duration::from_secs(86_400),
        }
    }
}

/// Recurring background work.
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;

    fn frequency(&self) -> JobFrequency;

    async fn execute(&self) -> anyhow::Result<()>;
}

/// Runs each registered job on its own task. The first run happens at start,
/// then once per period until shutdown.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    pub fn start(&mut self) {
        info!(jobs = self.jobs.len(), "Starting job scheduler");

        for job in &self.jobs {
            let job = Arc::clone(job);
            let mut shutdown_rx = self.shutdown_rx.clone();

            let handle = tokio::spawn(async move {
                let name = job.name();
                let frequency = job.frequency();
                let mut interval = tokio::time::interval(frequency.duration());
                info!(job = name, ?frequency, "Job scheduled");

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let started = Instant::now();
                            match job.execute().await {
                                Ok(()) => info!(
                                    job = name,
                                    elapsed_ms = started.elapsed().as_millis(),
                                    "Job completed"
                                ),
                                Err(e) => error!(
                                    job = name,
                                    elapsed_ms = started.elapsed().as_millis(),
                                    error = %e,
                                    "Job failed"
                                ),
                            }
                        }
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                info!(job = name, "Job shutting down");
                                break;
                            }
                        }
                    }
                }
            });

            self.handles.push(handle);
        }
    }

    /// Signals every job to stop after its current run.
    pub fn shutdown(&self) {
        info!("Stopping job scheduler");
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn wait_for_shutdown(self, timeout: Duration) {
        let all_done = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Job task panicked");
                }
            }
        };
        if tokio::time::timeout(timeout, all_done).await.is_err() {
            warn!(?timeout, "Job shutdown timed out");
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}
