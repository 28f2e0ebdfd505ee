//! Bounded inter-task channels, the latest-value snapshot cell, and the
//! cooperative shutdown flag.
//!
//! Every queue in the pipeline is a fixed-capacity FIFO with a non-blocking
//! send and a blocking-with-timeout receive:
//!
//! ```text
//! ┌──────────┐  Sample   ┌────────────┐
//! │ Sampler  │──────────▶│            │
//! └──────────┘           │ Classifier │──▶ set_color()
//! ┌──────────┐  Config   │            │
//! │ HTTP     │──────────▶│            │
//! └──────────┘           └────────────┘
//! ┌──────────┐  Event    ┌────────────┐
//! │ WiFi/OTA │──────────▶│  Monitor   │──▶ status atomics
//! └──────────┘           └────────────┘
//! ```
//!
//! The send side never blocks: producers are ISR-adjacent (periodic sampling,
//! HTTP callbacks) and must not stall. A full queue drops the item being sent
//! — the newest — and bumps a per-channel counter; staleness of one dropped
//! sample is tolerable, a blocked producer is not. Receivers own their queue
//! exclusively and drain it FIFO.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, TrySendError};
use log::warn;

/// Create a fixed-capacity channel. `name` shows up in drop diagnostics.
pub fn bounded<T>(name: &'static str, capacity: usize) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        Sender {
            tx,
            name,
            dropped: Arc::clone(&dropped),
        },
        Receiver { rx, dropped },
    )
}

/// Producer handle. Cloneable — the connectivity-event channel has two
/// producers (Wi-Fi lifecycle and OTA callback).
pub struct Sender<T> {
    tx: crossbeam_channel::Sender<T>,
    name: &'static str,
    dropped: Arc<AtomicU64>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            name: self.name,
            dropped: Arc::clone(&self.dropped),
        }
    }
}

impl<T> Sender<T> {
    /// Non-blocking send. Returns `false` and drops `item` when the channel
    /// is full or the consumer is gone. Capacity exhaustion is a silent-loss
    /// policy, not an error: it is counted and logged, never propagated.
    pub fn try_send(&self, item: T) -> bool {
        match self.tx.try_send(item) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!("channel '{}' full, dropped newest (total {total})", self.name);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer handle. Each channel has exactly one logical owner that drains it.
pub struct Receiver<T> {
    rx: crossbeam_channel::Receiver<T>,
    dropped: Arc<AtomicU64>,
}

impl<T> Receiver<T> {
    /// Suspend until an item arrives or `timeout` elapses.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Suspend indefinitely. `None` only when every producer is gone.
    pub fn recv(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Non-blocking poll, used by the classifier's config check.
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Items dropped on the send side since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Latest-value snapshot cell
// ---------------------------------------------------------------------------

/// Single-writer, many-reader snapshot of the most recent value.
///
/// The legacy firmware served `/sensor_value` by blocking on the sample
/// queue — a request could hang forever if no sample ever arrived. HTTP
/// handlers instead read this cell non-blockingly; the classifier writes it
/// after every consumed sample.
#[derive(Clone)]
pub struct LatestCell<T> {
    inner: Arc<Mutex<Option<T>>>,
}

impl<T: Clone> LatestCell<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the snapshot. Writer side only.
    pub fn store(&self, value: T) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = Some(value);
        }
    }

    /// Read the latest value, `None` until the first store.
    pub fn load(&self) -> Option<T> {
        self.inner.lock().ok().and_then(|guard| guard.clone())
    }
}

impl<T: Clone> Default for LatestCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Cooperative shutdown
// ---------------------------------------------------------------------------

/// Shared cancellation flag checked by every task loop at its suspension
/// point. The deployed firmware's loops ran for the process lifetime; the
/// flag exists so hosts and tests can stop the pipeline cleanly.
#[derive(Clone, Default)]
pub struct ShutdownFlag {
    flag: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
