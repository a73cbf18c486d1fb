//! Runs a workflow on a background thread and relays its progress.
//!
//! The worker thread owns a tokio runtime and executes one async job. Its
//! [`Reporter`] pushes events into a bounded channel with `try_send`, so a
//! slow or absent consumer never blocks the job; events are dropped instead.
//! The job's result travels through a separate single-slot channel and is
//! always delivered. The event sender is dropped before the result is sent.
//!
//! The consumer pulls [`BridgeMessage`]s with [`ProgressBridge::next`], which
//! moves through three states:
//!
//! - `DrainingBoth`: wait on both channels. A result that is already
//!   available is taken first and any events still buffered are discarded.
//! - `EventsClosed`: the event channel disconnected; wait for the result.
//! - `Done`: the result was returned; `next` yields `None`.
//!
//! If the worker dies without sending a result, the consumer receives
//! [`SwitcherError::WorkerLost`] instead of blocking forever.

use std::any::Any;
use std::future::Future;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, TryRecvError, bounded};
use tokio_util::sync::CancellationToken;

use crate::errors::SwitcherError;
use crate::progress::{ProgressEvent, Reporter};

/// Capacity of the event buffer.
const EVENT_CAPACITY: usize = 128;

/// Something the consumer receives from the bridge.
#[derive(Debug)]
pub enum BridgeMessage<T> {
    Event(ProgressEvent),
    Finished(Result<T>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BridgeState {
    DrainingBoth,
    EventsClosed,
    Done,
}

/// Consumer end of a background job.
pub struct ProgressBridge<T> {
    events: Receiver<ProgressEvent>,
    result: Receiver<Result<T>>,
    cancel: CancellationToken,
    state: BridgeState,
    worker: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> ProgressBridge<T> {
    /// Starts `work` on a dedicated worker thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<F, Fut>(work: F) -> Result<Self>
    where
        F: FnOnce(Reporter, CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>>,
    {
        Self::start(work, false)
    }

    /// Like [`spawn`](Self::spawn), and also cancels the job on Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn_interruptible<F, Fut>(work: F) -> Result<Self>
    where
        F: FnOnce(Reporter, CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>>,
    {
        Self::start(work, true)
    }

    fn start<F, Fut>(work: F, interruptible: bool) -> Result<Self>
    where
        F: FnOnce(Reporter, CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>>,
    {
        let (event_tx, event_rx) = bounded::<ProgressEvent>(EVENT_CAPACITY);
        let (result_tx, result_rx) = bounded::<Result<T>>(1);
        let cancel = CancellationToken::new();
        let job_cancel = cancel.clone();

        let reporter = Reporter::new(move |event| {
            if event_tx.try_send(event).is_err() {
                tracing::trace!("progress event dropped");
            }
        });

        let worker = std::thread::Builder::new()
            .name("switcher-worker".to_string())
            .spawn(move || {
                let outcome = run_job(work, reporter, job_cancel, interruptible);
                // Every reporter clone is gone once the runtime is dropped,
                // which disconnects the event channel before the result.
                let _ = result_tx.send(outcome);
            })
            .context("Failed to spawn worker thread")?;

        Ok(Self {
            events: event_rx,
            result: result_rx,
            cancel,
            state: BridgeState::DrainingBoth,
            worker: Some(worker),
        })
    }
}

fn run_job<T, F, Fut>(
    work: F,
    reporter: Reporter,
    cancel: CancellationToken,
    interruptible: bool,
) -> Result<T>
where
    F: FnOnce(Reporter, CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let outcome = runtime.block_on(async move {
        let interrupt = interruptible.then(|| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, cancelling");
                    cancel.cancel();
                }
            })
        });
        let outcome = work(reporter, cancel).await;
        if let Some(handle) = interrupt {
            handle.abort();
        }
        outcome
    });
    drop(runtime);
    outcome
}

enum Step<T> {
    Event(ProgressEvent),
    EventsClosed,
    Finished(Option<Result<T>>),
}

impl<T> ProgressBridge<T> {
    /// Returns the next event, then the result, then `None` forever.
    pub fn next(&mut self) -> Option<BridgeMessage<T>> {
        loop {
            let step = match self.state {
                BridgeState::Done => return None,
                BridgeState::DrainingBoth => match self.result.try_recv() {
                    Ok(result) => Step::Finished(Some(result)),
                    Err(TryRecvError::Disconnected) => Step::Finished(None),
                    Err(TryRecvError::Empty) => crossbeam_channel::select! {
                        recv(self.events) -> msg => match msg {
                            Ok(event) => Step::Event(event),
                            Err(_) => Step::EventsClosed,
                        },
                        recv(self.result) -> msg => Step::Finished(msg.ok()),
                    },
                },
                BridgeState::EventsClosed => Step::Finished(self.result.recv().ok()),
            };

            match step {
                Step::Event(event) => return Some(BridgeMessage::Event(event)),
                Step::EventsClosed => self.state = BridgeState::EventsClosed,
                Step::Finished(result) => {
                    self.state = BridgeState::Done;
                    if let Some(worker) = self.worker.take()
                        && let Err(payload) = worker.join()
                    {
                        let message = panic_message(payload.as_ref());
                        tracing::error!("worker panicked: {message}");
                    }
                    let result = result.unwrap_or_else(|| Err(SwitcherError::WorkerLost.into()));
                    return Some(BridgeMessage::Finished(result));
                }
            }
        }
    }

    /// Requests cancellation of the running job.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Discards remaining events and returns the job's result.
    ///
    /// # Errors
    ///
    /// Returns the job's error, or [`SwitcherError::WorkerLost`] if the
    /// worker died, or if the result was already consumed.
    pub fn wait(mut self) -> Result<T> {
        while let Some(message) = self.next() {
            if let BridgeMessage::Finished(result) = message {
                return result;
            }
        }
        Err(SwitcherError::WorkerLost.into())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl<T> Drop for ProgressBridge<T> {
    fn drop(&mut self) {
        if self.state != BridgeState::Done {
            self.cancel.cancel();
        }
    }
}
