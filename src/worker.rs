//! Bounded pool of assembly workers.
//!
//! Assemblies run on a fixed set of threads fed by a bounded queue, so the
//! number of documents in flight is capped. Every submission returns an
//! [`AssemblyHandle`] that can be waited on or cancelled; failures, including
//! a panicking content provider, come back as `Err` values.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::actions::ContentProvider;
use crate::config::AssemblyConfig;
use crate::error::{Error, Result};
use crate::pipeline::{assemble, Artifact};

/// Shared flag checked between content actions.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

struct AssemblyJob {
    config: AssemblyConfig,
    provider: Arc<dyn ContentProvider>,
    cancel: CancellationToken,
    reply: Sender<Result<Artifact>>,
}

impl AssemblyJob {
    fn run(self) {
        let result = if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            let provider = self.provider.as_ref();
            catch_unwind(AssertUnwindSafe(|| assemble(&self.config, provider, &self.cancel)))
                .unwrap_or_else(|_| {
                    log::error!("Assembly for {} panicked", self.config.output_path().display());
                    Err(Error::WorkerLost)
                })
        };
        // The caller may have dropped its handle.
        let _ = self.reply.send(result);
    }
}

/// Result of one submitted assembly.
#[derive(Debug)]
pub struct AssemblyHandle {
    result: Receiver<Result<Artifact>>,
    cancel: CancellationToken,
}

impl AssemblyHandle {
    /// Block until the assembly finishes.
    pub fn wait(self) -> Result<Artifact> {
        self.result.recv().unwrap_or(Err(Error::WorkerLost))
    }

    /// Wait at most `timeout`; `None` if the assembly is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<Artifact>> {
        match self.result.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(Error::WorkerLost)),
        }
    }

    /// Ask the assembly to stop before its next action.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The token this assembly checks.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Fixed-size thread pool running assemblies from a bounded queue.
pub struct AssemblyPool {
    sender: Option<Sender<AssemblyJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl AssemblyPool {
    /// Start `workers` threads sharing a queue of `queue_capacity` jobs.
    /// Both are raised to at least one.
    pub fn new(workers: usize, queue_capacity: usize) -> Result<Self> {
        let (sender, receiver) = bounded::<AssemblyJob>(queue_capacity.max(1));

        let mut handles = Vec::with_capacity(workers.max(1));
        for id in 0..workers.max(1) {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("assembly-worker-{}", id))
                .spawn(move || {
                    log::debug!("Assembly worker {} started", id);
                    for job in receiver.iter() {
                        job.run();
                    }
                    log::debug!("Assembly worker {} stopped", id);
                })?;
            handles.push(handle);
        }

        Ok(Self {
            sender: Some(sender),
            workers: handles,
        })
    }

    /// Pool sized from `config.workers` and `config.queue_capacity`.
    pub fn from_config(config: &AssemblyConfig) -> Result<Self> {
        Self::new(config.workers, config.queue_capacity)
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn job(
        config: AssemblyConfig,
        provider: Arc<dyn ContentProvider>,
    ) -> (AssemblyJob, AssemblyHandle) {
        let (reply, result) = bounded(1);
        let cancel = CancellationToken::new();
        let job = AssemblyJob {
            config,
            provider,
            cancel: cancel.clone(),
            reply,
        };
        (job, AssemblyHandle { result, cancel })
    }

    /// Queue an assembly, blocking while the queue is full.
    pub fn submit(
        &self,
        config: AssemblyConfig,
        provider: Arc<dyn ContentProvider>,
    ) -> Result<AssemblyHandle> {
        let sender = self.sender.as_ref().ok_or(Error::PoolClosed)?;
        let (job, handle) = Self::job(config, provider);
        sender.send(job).map_err(|_| Error::PoolClosed)?;
        Ok(handle)
    }

    /// Queue an assembly or fail immediately with [`Error::QueueFull`].
    pub fn try_submit(
        &self,
        config: AssemblyConfig,
        provider: Arc<dyn ContentProvider>,
    ) -> Result<AssemblyHandle> {
        let sender = self.sender.as_ref().ok_or(Error::PoolClosed)?;
        let (job, handle) = Self::job(config, provider);
        match sender.try_send(job) {
            Ok(()) => Ok(handle),
            Err(TrySendError::Full(_)) => Err(Error::QueueFull),
            Err(TrySendError::Disconnected(_)) => Err(Error::PoolClosed),
        }
    }

    /// Stop accepting jobs, finish the queued ones, and join the workers.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("Assembly worker exited abnormally");
            }
        }
    }
}

impl Drop for AssemblyPool {
    fn drop(&mut self) {
        self.stop();
    }
}
