// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Readiness gate: run callbacks once the host signals it is ready.
//!
//! ## Semantics
//!
//! - Before the signal, [`ReadyGate::on_ready`] queues callbacks.
//! - [`ReadyGate::signal`] fires the gate once and drains the queue in registration order.
//!   Later signals do nothing.
//! - After the signal, `on_ready` never runs a callback synchronously. The callback is
//!   scheduled and runs on the next [`ReadyGate::tick`], which the host calls from its
//!   event loop.
//! - Each callback runs in isolation: a returned error (and, with the `std` feature,
//!   a panic) is recorded in the [`DrainReport`] and logged, and the remaining callbacks
//!   still run. Failures never propagate to the caller of `signal` or `tick`.
//!
//! ```
//! use understory_delegate::ready::ReadyGate;
//!
//! let mut gate: ReadyGate<&str> = ReadyGate::new();
//! gate.on_ready(|who| {
//!     assert_eq!(*who, "host");
//!     Ok(())
//! });
//! gate.on_ready(|_| Err("boom".into()));
//! gate.on_ready(|_| Ok(()));
//!
//! let report = gate.signal(&"host");
//! assert_eq!(report.invoked, 3);
//! assert_eq!(report.failures.len(), 1);
//! assert!(gate.signal(&"host").is_empty());
//! ```

use alloc::boxed::Box;
#[cfg(feature = "std")]
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Error type ready callbacks may return.
pub type BoxError = Box<dyn core::error::Error>;

/// A queued readiness callback. It receives the value the gate was signalled with.
pub type ReadyCallback<A> = Box<dyn FnOnce(&A) -> Result<(), BoxError>>;

/// A failure isolated while draining ready callbacks.
#[derive(Debug, thiserror::Error)]
pub enum ReadyError {
    /// The callback returned an error.
    #[error("ready callback failed: {0}")]
    Failed(BoxError),
    /// The callback panicked; the panic was caught.
    #[cfg(feature = "std")]
    #[error("ready callback panicked: {message}")]
    Panicked {
        /// Panic payload, if it was a string.
        message: String,
    },
}

/// Result of one drain.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Callbacks invoked, including failed ones.
    pub invoked: usize,
    /// Failures in invocation order.
    pub failures: Vec<ReadyError>,
}

impl DrainReport {
    /// Returns true if no callback ran.
    pub fn is_empty(&self) -> bool {
        self.invoked == 0
    }

    /// Returns true if every callback that ran succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn absorb(&mut self, other: Self) {
        self.invoked += other.invoked;
        self.failures.extend(other.failures);
    }
}

/// One-shot readiness gate with deferred scheduling after it fires.
pub struct ReadyGate<A> {
    fired: bool,
    pending: Vec<ReadyCallback<A>>,
    scheduled: Vec<ReadyCallback<A>>,
}

impl<A> Default for ReadyGate<A> {
    fn default() -> Self {
        Self {
            fired: false,
            pending: Vec::new(),
            scheduled: Vec::new(),
        }
    }
}

impl<A> fmt::Debug for ReadyGate<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyGate")
            .field("fired", &self.fired)
            .field("pending", &self.pending.len())
            .field("scheduled", &self.scheduled.len())
            .finish()
    }
}

impl<A> ReadyGate<A> {
    /// A gate that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate that already fired; every callback goes straight to the schedule.
    pub fn fired() -> Self {
        Self {
            fired: true,
            ..Self::default()
        }
    }

    /// Whether the readiness signal has been observed.
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Callbacks waiting for the signal.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Callbacks waiting for the next tick.
    pub fn scheduled_len(&self) -> usize {
        self.scheduled.len()
    }

    /// Register a callback. See the module docs for when it runs.
    pub fn on_ready(&mut self, callback: impl FnOnce(&A) -> Result<(), BoxError> + 'static) {
        self.push(Box::new(callback));
    }

    /// Register an already boxed callback.
    pub fn push(&mut self, callback: ReadyCallback<A>) {
        if self.fired {
            self.scheduled.push(callback);
        } else {
            self.pending.push(callback);
        }
    }

    /// Fire the gate and drain queued callbacks with `arg`. Only the first call does anything.
    pub fn signal(&mut self, arg: &A) -> DrainReport {
        match self.take_signal() {
            Some(batch) => drain(batch, arg),
            None => DrainReport::default(),
        }
    }

    /// Run callbacks scheduled since the last tick, including any scheduled while
    /// they run, until the schedule is empty.
    pub fn tick(&mut self, arg: &A) -> DrainReport {
        let mut report = DrainReport::default();
        loop {
            let batch = self.take_scheduled();
            if batch.is_empty() {
                return report;
            }
            report.absorb(drain(batch, arg));
        }
    }

    /// Mark the gate fired and hand out the queued callbacks.
    ///
    /// Returns `None` if the gate had already fired. Hosts that need callbacks to
    /// reach back into the owner of the gate take the batch, release their borrow,
    /// then run it with [`drain`].
    pub fn take_signal(&mut self) -> Option<Vec<ReadyCallback<A>>> {
        if self.fired {
            return None;
        }
        self.fired = true;
        tracing::debug!(pending = self.pending.len(), "readiness signal fired");
        Some(core::mem::take(&mut self.pending))
    }

    /// Hand out the callbacks scheduled since the last tick.
    pub fn take_scheduled(&mut self) -> Vec<ReadyCallback<A>> {
        core::mem::take(&mut self.scheduled)
    }
}

/// Run `batch` in order with `arg`, isolating each callback's failure.
pub fn drain<A>(batch: Vec<ReadyCallback<A>>, arg: &A) -> DrainReport {
    let mut report = DrainReport::default();
    for (index, callback) in batch.into_iter().enumerate() {
        report.invoked += 1;
        if let Err(err) = run_isolated(callback, arg) {
            tracing::warn!(index, error = %err, "ready callback failed");
            report.failures.push(err);
        }
    }
    report
}

#[cfg(feature = "std")]
fn run_isolated<A>(callback: ReadyCallback<A>, arg: &A) -> Result<(), ReadyError> {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    match catch_unwind(AssertUnwindSafe(|| callback(arg))) {
        Ok(result) => result.map_err(ReadyError::Failed),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| String::from(*s))
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| String::from("non-string panic payload"));
            Err(ReadyError::Panicked { message })
        }
    }
}

#[cfg(not(feature = "std"))]
fn run_isolated<A>(callback: ReadyCallback<A>, arg: &A) -> Result<(), ReadyError> {
    callback(arg).map_err(ReadyError::Failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::string::ToString;
    use alloc::vec;
    use core::cell::RefCell;

    type Log = Rc<RefCell<Vec<u32>>>;

    fn push(log: &Log, n: u32) -> impl FnOnce(&()) -> Result<(), BoxError> + 'static {
        let log = log.clone();
        move |_| {
            log.borrow_mut().push(n);
            Ok(())
        }
    }

    #[test]
    fn queued_callbacks_run_in_order_on_signal() {
        let log = Log::default();
        let mut gate = ReadyGate::new();
        gate.on_ready(push(&log, 1));
        gate.on_ready(push(&log, 2));
        assert!(log.borrow().is_empty());
        assert_eq!(gate.pending_len(), 2);

        let report = gate.signal(&());
        assert_eq!(report.invoked, 2);
        assert!(report.is_clean());
        assert_eq!(*log.borrow(), vec![1, 2]);
        assert!(gate.has_fired());
    }

    #[test]
    fn signal_is_one_time() {
        let log = Log::default();
        let mut gate = ReadyGate::new();
        gate.on_ready(push(&log, 1));
        gate.signal(&());
        assert!(gate.signal(&()).is_empty());
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn after_firing_callbacks_wait_for_tick() {
        let log = Log::default();
        let mut gate = ReadyGate::new();
        gate.signal(&());
        gate.on_ready(push(&log, 7));
        assert!(log.borrow().is_empty(), "must not run synchronously");
        assert_eq!(gate.scheduled_len(), 1);

        assert_eq!(gate.tick(&()).invoked, 1);
        assert_eq!(*log.borrow(), vec![7]);
        assert!(gate.tick(&()).is_empty());
    }

    #[test]
    fn prefired_gate_schedules() {
        let log = Log::default();
        let mut gate = ReadyGate::fired();
        gate.on_ready(push(&log, 3));
        assert!(gate.signal(&()).is_empty());
        assert!(log.borrow().is_empty());
        gate.tick(&());
        assert_eq!(*log.borrow(), vec![3]);
    }

    #[test]
    fn failing_callback_does_not_stop_siblings() {
        let log = Log::default();
        let mut gate = ReadyGate::new();
        gate.on_ready(push(&log, 1));
        gate.on_ready(|_| Err("first".into()));
        gate.on_ready(push(&log, 2));
        gate.on_ready(|_| Err("second".into()));

        let report = gate.signal(&());
        assert_eq!(report.invoked, 4);
        assert_eq!(*log.borrow(), vec![1, 2]);
        let messages: Vec<_> = report.failures.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            [
                "ready callback failed: first",
                "ready callback failed: second",
            ]
        );
    }

    #[test]
    fn callbacks_receive_signal_argument() {
        let seen = Rc::new(RefCell::new(None));
        let mut gate: ReadyGate<u32> = ReadyGate::new();
        let sink = seen.clone();
        gate.on_ready(move |n| {
            *sink.borrow_mut() = Some(*n);
            Ok(())
        });
        gate.signal(&42);
        assert_eq!(*seen.borrow(), Some(42));
    }

    #[cfg(feature = "std")]
    #[test]
    fn panicking_callback_is_isolated() {
        let log = Log::default();
        let mut gate = ReadyGate::new();
        gate.on_ready(|_| panic!("kaboom"));
        gate.on_ready(push(&log, 1));

        let report = gate.signal(&());
        assert_eq!(report.invoked, 2);
        assert_eq!(*log.borrow(), vec![1]);
        assert!(matches!(
            &report.failures[..],
            [ReadyError::Panicked { message }] if message == "kaboom"
        ));
    }
}
