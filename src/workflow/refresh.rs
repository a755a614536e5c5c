// src/workflow/refresh.rs
//
// Refresh signalling between the mutation path and anything rendering
// request lists. Ordinary signals are debounced (a burst collapses into
// one); the post-mutation nudge is sent twice with a short gap because the
// first broadcast can land before dependent views finish re-rendering.

use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    ActionCompleted,
    EventCreated,
    Forced,
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshSignal {
    pub reason: RefreshReason,
}

pub struct RefreshBus {
    tx: broadcast::Sender<RefreshSignal>,
    debounce: Duration,
    nudge_gap: Duration,
    last_sent: Mutex<Option<Instant>>,
}

impl RefreshBus {
    pub fn new(debounce: Duration) -> Self {
        let (tx, _) = broadcast::channel(32);
        Self {
            tx,
            debounce,
            nudge_gap: Duration::from_millis(750),
            last_sent: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshSignal> {
        self.tx.subscribe()
    }

    /// Debounced signal. Returns whether the signal was actually sent or
    /// collapsed into the previous one.
    pub fn signal(&self, reason: RefreshReason) -> bool {
        let mut last = self.last_sent.lock().expect("refresh bus lock poisoned");
        let now = Instant::now();
        if let Some(previous) = *last {
            if now.duration_since(previous) < self.debounce {
                return false;
            }
        }
        *last = Some(now);
        let _ = self.tx.send(RefreshSignal { reason });
        true
    }

    /// Forced signal, bypasses the debounce window.
    fn signal_forced(&self, reason: RefreshReason) {
        let mut last = self.last_sent.lock().expect("refresh bus lock poisoned");
        *last = Some(Instant::now());
        let _ = self.tx.send(RefreshSignal { reason });
    }

    /// Double-broadcast after a successful mutation: one signal now, a second
    /// nudge after a short gap so views that missed the first one catch up.
    pub async fn nudge_after_mutation(&self, reason: RefreshReason) {
        self.signal_forced(reason);
        tokio::time::sleep(self.nudge_gap).await;
        self.signal_forced(reason);
    }

    #[cfg(test)]
    fn with_nudge_gap(mut self, gap: Duration) -> Self {
        self.nudge_gap = gap;
        self
    }
}
