use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::common::ScanConfig;
use crate::core::attempt::AttemptExecutor;
use crate::core::outcome::AttemptOutcome;
use crate::core::session::SharedSession;

/// Drives the cadence of authentication attempts: one warm-up delay, then a
/// fixed scan interval, until an attempt succeeds or `stop()` is called.
///
/// Timer state lives inside this object and its worker thread; nothing else
/// mutates the session. Attempts run sequentially on the worker, and the
/// executor sits behind a mutex shared across runs, so at most one
/// recognition call is ever outstanding. A tick that falls due while an
/// attempt is still in flight is dropped, not queued; under a slow network
/// the effective interval stretches instead.
pub struct ScanScheduler {
    session: SharedSession,
    executor: Arc<Mutex<AttemptExecutor>>,
    config: ScanConfig,
    generation: Arc<AtomicU64>,
    run: Option<Run>,
}

struct Run {
    stop_tx: Sender<()>,
    worker: JoinHandle<()>,
}

impl ScanScheduler {
    pub fn new(session: SharedSession, executor: AttemptExecutor, config: ScanConfig) -> Self {
        Self {
            session,
            executor: Arc::new(Mutex::new(executor)),
            config,
            generation: Arc::new(AtomicU64::new(0)),
            run: None,
        }
    }

    /// Arm the controller: session goes to `Warming` and a worker thread
    /// takes over the cadence. No-op while a run is already active.
    pub fn start(&mut self) {
        if let Some(run) = &self.run {
            if !run.worker.is_finished() {
                return;
            }
            // Previous run ended on its own (authenticated); replace it.
            self.run = None;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (stop_tx, stop_rx) = mpsc::channel();

        self.session.update(|s| s.activate());
        info!(generation, "scan scheduler armed");

        let worker = thread::spawn({
            let session = self.session.clone();
            let executor = Arc::clone(&self.executor);
            let generations = Arc::clone(&self.generation);
            let warmup = self.config.warmup_delay();
            let interval = self.config.scan_interval();
            move || {
                run_loop(
                    session,
                    executor,
                    generations,
                    generation,
                    warmup,
                    interval,
                    stop_rx,
                )
            }
        });

        self.run = Some(Run { stop_tx, worker });
    }

    /// Cancel the run: pending warm-up and interval waits are interrupted
    /// immediately, and an attempt already on the wire has its eventual
    /// result discarded. Idempotent; safe in every phase.
    pub fn stop(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };

        // Invalidate the run before waking the worker so an in-flight
        // attempt can never commit its result.
        self.generation.fetch_add(1, Ordering::SeqCst);
        drop(run.stop_tx);

        self.session.update(|s| s.stop());
        info!("scan scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.run
            .as_ref()
            .map(|run| !run.worker.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for ScanScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    session: SharedSession,
    executor: Arc<Mutex<AttemptExecutor>>,
    generations: Arc<AtomicU64>,
    my_generation: u64,
    warmup: Duration,
    interval: Duration,
    stop_rx: Receiver<()>,
) {
    // Warm-up phase: an interruptible one-shot wait.
    match stop_rx.recv_timeout(warmup) {
        Err(RecvTimeoutError::Timeout) => {}
        _ => return,
    }
    if generations.load(Ordering::SeqCst) != my_generation {
        return;
    }

    session.update(|s| s.begin_scanning());

    // First attempt fires immediately; later ones on the interval.
    let mut next_tick = Instant::now();
    loop {
        if generations.load(Ordering::SeqCst) != my_generation {
            return;
        }

        let outcome = {
            let mut executor = executor.lock().unwrap_or_else(PoisonError::into_inner);
            executor.run_once()
        };

        // The run may have been superseded while the attempt was on the
        // wire; a stale result must not touch the session, success included.
        if generations.load(Ordering::SeqCst) != my_generation {
            debug!(generation = my_generation, "discarding stale attempt result");
            return;
        }

        match outcome {
            Some(AttemptOutcome::Success(user)) => {
                info!(user = user.name(), confidence = %user.confidence(), "authenticated");
                session.update(|s| s.authenticate(user));
                return;
            }
            Some(outcome) => {
                if let AttemptOutcome::TransientFailure(detail) = &outcome {
                    warn!("recognition attempt failed: {}", detail);
                }
                session.update(|s| s.record_outcome(&outcome));
            }
            // No frame this tick; leave the status text alone.
            None => {}
        }

        // Ticks that fell due during a slow attempt are dropped.
        next_tick += interval;
        let now = Instant::now();
        while next_tick <= now {
            next_tick += interval;
        }

        match stop_rx.recv_timeout(next_tick - now) {
            Err(RecvTimeoutError::Timeout) => {}
            _ => return,
        }
    }
}
