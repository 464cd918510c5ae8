// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress/status reporter — one overwrite-only (percent, message) signal for
// the whole session.
//
// There is no history and no queueing: every write replaces the current
// value, and concurrent runs interleave their writes (last write wins).
// Listeners are called with a copy of the new state after the lock has been
// released, so a listener may read `current()` freely.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use toolghor_core::ProgressState;
use tracing::trace;

type ProgressListener = Arc<dyn Fn(&ProgressState) + Send + Sync>;

/// Session-wide progress and status signal.
pub struct ProgressReporter {
    state: Mutex<ProgressState>,
    listeners: Mutex<Vec<ProgressListener>>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ProgressState::default()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Replace both percent and message.
    pub fn set(&self, percent: u8, message: impl Into<String>) {
        let message = message.into();
        self.update(|state| {
            state.percent = percent.min(100);
            state.message = message;
        });
    }

    /// Replace the message, keep the percent.
    pub fn set_status(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|state| state.message = message);
    }

    /// Replace the percent, keep the message.
    pub fn set_percent(&self, percent: u8) {
        self.update(|state| state.percent = percent.min(100));
    }

    /// Back to 0% with an empty message.
    pub fn reset(&self) {
        self.update(|state| *state = ProgressState::default());
    }

    /// Snapshot of the current signal.
    pub fn current(&self) -> ProgressState {
        lock(&self.state).clone()
    }

    /// Register a callback fired after every write.
    pub fn on_progress<F>(&self, listener: F)
    where
        F: Fn(&ProgressState) + Send + Sync + 'static,
    {
        lock(&self.listeners).push(Arc::new(listener));
    }

    fn update(&self, apply: impl FnOnce(&mut ProgressState)) {
        let snapshot = {
            let mut state = lock(&self.state);
            apply(&mut state);
            state.clone()
        };
        trace!(percent = snapshot.percent, message = %snapshot.message, "progress");
        let listeners = lock(&self.listeners).clone();
        for listener in &listeners {
            listener(&snapshot);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
