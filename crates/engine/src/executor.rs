//! Background worker thread shared by flush and compaction jobs.
//!
//! A single dedicated thread drains two queues: flush jobs and compaction
//! jobs. Flushes are always drained first so a running (or backlogged)
//! compaction never starves a pending flush. Shutdown sets a flag, wakes
//! the worker, and waits up to a bounded timeout for it to drain and exit;
//! past that timeout the thread is abandoned rather than force-killed --
//! Rust has no safe preemptive thread termination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs flush and compaction jobs on one background thread.
///
/// `shutdown` takes `&self` (not `self`) so an `Executor` can live behind an
/// `Arc` shared with in-flight background jobs -- a job needs to be able to
/// `submit_compact` a follow-on job from inside its own closure.
pub struct Executor {
    flush_tx: Sender<Job>,
    compact_tx: Sender<Job>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Executor {
    pub fn start() -> Self {
        let (flush_tx, flush_rx) = mpsc::channel::<Job>();
        let (compact_tx, compact_rx) = mpsc::channel::<Job>();
        let running = Arc::new(AtomicBool::new(true));
        let worker_running = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("riptidekv-worker".to_string())
            .spawn(move || Self::run(flush_rx, compact_rx, worker_running))
            .expect("failed to spawn background worker thread");

        Self {
            flush_tx,
            compact_tx,
            running,
            handle: Mutex::new(Some(handle)),
        }
    }

    fn run(flush_rx: Receiver<Job>, compact_rx: Receiver<Job>, running: Arc<AtomicBool>) {
        loop {
            if let Ok(job) = flush_rx.try_recv() {
                job();
                continue;
            }
            if let Ok(job) = compact_rx.try_recv() {
                job();
                continue;
            }
            if !running.load(Ordering::Acquire) {
                break;
            }
            match flush_rx.recv_timeout(IDLE_POLL_INTERVAL) {
                Ok(job) => job(),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    if !running.load(Ordering::Acquire) {
                        break;
                    }
                }
            }
        }
        tracing::debug!("background worker thread exiting");
    }

    /// Queues a flush job. Flush jobs are always drained before compaction
    /// jobs.
    pub fn submit_flush<F: FnOnce() + Send + 'static>(&self, job: F) {
        let _ = self.flush_tx.send(Box::new(job));
    }

    /// Queues a compaction job.
    pub fn submit_compact<F: FnOnce() + Send + 'static>(&self, job: F) {
        let _ = self.compact_tx.send(Box::new(job));
    }

    /// Signals the worker to stop once its queues drain, then waits up to a
    /// bounded timeout for it to exit. If the timeout elapses the thread is
    /// left to finish on its own; the process is shutting down regardless.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);

        let Some(handle) = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take() else {
            return;
        };

        let (done_tx, done_rx) = mpsc::channel::<()>();
        thread::spawn(move || {
            let _ = handle.join();
            let _ = done_tx.send(());
        });

        match done_rx.recv_timeout(SHUTDOWN_DRAIN_TIMEOUT) {
            Ok(()) => tracing::info!("background worker drained cleanly"),
            Err(_) => tracing::warn!(
                "background worker did not exit within {:?}; abandoning it",
                SHUTDOWN_DRAIN_TIMEOUT
            ),
        }
    }
}
