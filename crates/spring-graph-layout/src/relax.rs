//! Background relaxation loop.
//!
//! One dedicated worker thread per relax session drives the layout until it
//! converges or is cancelled; consumers on other threads only read the
//! shared [`LayoutModel`]. Cancellation is cooperative: `stop()` raises a
//! flag checked once per loop iteration, and an in-flight step always
//! completes, so the scheduler never has to roll back half a step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::algorithm::{LayoutPhase, SpringLayout};
use crate::error::{LayoutError, LayoutResult};
use crate::graph::LayoutGraph;
use crate::model::LayoutModel;

/// Notifications emitted by a running relaxer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxEvent {
    /// Sent exactly once with `true` when the loop starts and exactly once
    /// with `false` when it exits, whether by convergence or cancellation.
    Active(bool),
    /// Best-effort notification after each committed step, for incremental
    /// consumers that want to avoid full rescans.
    Step { iteration: usize },
}

type Subscribers = Arc<Mutex<Vec<Sender<RelaxEvent>>>>;

fn broadcast(subscribers: &Subscribers, event: RelaxEvent) {
    let mut subs = subscribers.lock().unwrap_or_else(|e| e.into_inner());
    // Disconnected receivers drop out of the registry.
    let before = subs.len();
    subs.retain(|tx| tx.send(event).is_ok());
    if subs.len() < before {
        warn!(dropped = before - subs.len(), "relax subscriber disconnected");
    }
}

fn subscribe_to(subscribers: &Subscribers) -> Receiver<RelaxEvent> {
    let (tx, rx) = mpsc::channel();
    subscribers
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .push(tx);
    rx
}

/// A relax session that has not started yet. Subscribe here to be
/// guaranteed the initial `Active(true)` event.
pub struct Relaxer<G: LayoutGraph> {
    layout: SpringLayout<G>,
    subscribers: Subscribers,
}

impl<G> Relaxer<G>
where
    G: LayoutGraph + Send + 'static,
{
    /// Wrap `layout`, bringing it to the stepping phase.
    ///
    /// Phase errors (for example a layout that already ran to completion)
    /// surface here, before any thread exists.
    pub fn new(mut layout: SpringLayout<G>) -> LayoutResult<Self> {
        match layout.phase() {
            LayoutPhase::Uninitialized => layout.initialize_and_start()?,
            LayoutPhase::Initialized => layout.start()?,
            LayoutPhase::Stepping => {}
            LayoutPhase::Done => {
                return Err(LayoutError::InvalidPhase {
                    operation: "relax",
                    required: "Uninitialized, Initialized or Stepping",
                    actual: "Done",
                })
            }
        }
        Ok(Self {
            layout,
            subscribers: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// The shared position store, for readers.
    pub fn model(&self) -> Arc<LayoutModel<G::NodeKey>> {
        self.layout.model()
    }

    /// Register for relax events before the loop starts.
    pub fn subscribe(&self) -> Receiver<RelaxEvent> {
        subscribe_to(&self.subscribers)
    }

    /// Spawn the relax loop on a dedicated background thread.
    pub fn spawn(self) -> RelaxerHandle<G> {
        let stop = Arc::new(AtomicBool::new(false));
        let active = Arc::new(AtomicBool::new(true));
        let model = self.layout.model();
        let interval = self.layout.config().step_interval();
        let subscribers = self.subscribers;

        let worker = {
            let layout = self.layout;
            let stop = Arc::clone(&stop);
            let active = Arc::clone(&active);
            let subscribers = Arc::clone(&subscribers);
            thread::spawn(move || run_loop(layout, interval, stop, active, subscribers))
        };

        RelaxerHandle {
            stop,
            active,
            subscribers,
            model,
            worker: Some(worker),
        }
    }
}

/// Handle to a relax session running on its own thread.
pub struct RelaxerHandle<G: LayoutGraph> {
    stop: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    subscribers: Subscribers,
    model: Arc<LayoutModel<G::NodeKey>>,
    worker: Option<JoinHandle<LayoutResult<SpringLayout<G>>>>,
}

impl<G> RelaxerHandle<G>
where
    G: LayoutGraph + Send + 'static,
{
    /// The shared position store, for readers.
    pub fn model(&self) -> Arc<LayoutModel<G::NodeKey>> {
        Arc::clone(&self.model)
    }

    /// Register for relax events. Subscribing after the loop started may
    /// miss the initial `Active(true)`.
    pub fn subscribe(&self) -> Receiver<RelaxEvent> {
        subscribe_to(&self.subscribers)
    }

    /// Whether the loop is still running.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Request cancellation. Non-blocking; the flag is checked once per loop
    /// iteration, so the loop exits within one step plus one interval.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Wait for the loop to exit and recover the layout.
    ///
    /// Returns the algorithm in its terminal state (`done()` is false for a
    /// cancelled run), or the error that aborted it.
    pub fn join(mut self) -> LayoutResult<SpringLayout<G>> {
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| LayoutError::WorkerPanicked)?,
            None => Err(LayoutError::WorkerPanicked),
        }
    }

    /// `stop()` followed by `join()`.
    pub fn stop_and_join(self) -> LayoutResult<SpringLayout<G>> {
        self.stop();
        self.join()
    }
}

fn run_loop<G>(
    mut layout: SpringLayout<G>,
    interval: Duration,
    stop: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    subscribers: Subscribers,
) -> LayoutResult<SpringLayout<G>>
where
    G: LayoutGraph,
{
    info!(interval_ms = interval.as_millis() as u64, "relaxer started");
    broadcast(&subscribers, RelaxEvent::Active(true));

    let mut failure: Option<LayoutError> = None;
    while !layout.done() && !stop.load(Ordering::SeqCst) {
        if let Err(e) = layout.step() {
            error!(error = %e, "layout step aborted the relax loop");
            failure = Some(e);
            break;
        }
        broadcast(
            &subscribers,
            RelaxEvent::Step {
                iteration: layout.iteration(),
            },
        );
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    // The inactive transition is reported exactly once, on every exit path.
    broadcast(&subscribers, RelaxEvent::Active(false));
    active.store(false, Ordering::SeqCst);

    match failure {
        Some(e) => Err(e),
        None => {
            if layout.done() {
                info!(iteration = layout.iteration(), "relaxer finished");
            } else {
                debug!(iteration = layout.iteration(), "relaxer cancelled");
            }
            Ok(layout)
        }
    }
}
