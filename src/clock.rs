//! Logical Clock
//!
//! Strictly increasing timestamps built from wall-clock milliseconds plus a
//! per-millisecond counter: `millis * 1_000_000 + counter`.
//!
//! The clock is an explicit object owned by the engine (shared through an
//! `Arc`), not process-global state, so tests can inject their own time source.

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Counter slots reserved per millisecond
const TICKS_PER_MILLI: u64 = 1_000_000;

type MillisSource = Box<dyn Fn() -> u64 + Send + Sync>;

/// Monotonic timestamp generator
pub struct LogicalClock {
    source: MillisSource,
    /// (last_millis, counter)
    state: Mutex<(u64, u64)>,
}

impl LogicalClock {
    /// Clock driven by the system wall clock
    pub fn new() -> Self {
        Self::with_source(system_millis)
    }

    /// Clock driven by an arbitrary millisecond source
    pub fn with_source<F>(source: F) -> Self
    where
        F: Fn() -> u64 + Send + Sync + 'static,
    {
        Self {
            source: Box::new(source),
            state: Mutex::new((0, 0)),
        }
    }

    /// Next timestamp; strictly greater than every value returned before
    pub fn next(&self) -> u64 {
        let millis = (self.source)();
        let mut state = self.state.lock();
        let (last_millis, counter) = *state;

        // A wall clock standing still or stepping back keeps counting
        // inside the last observed millisecond.
        *state = if millis > last_millis {
            (millis, 0)
        } else if counter + 1 < TICKS_PER_MILLI {
            (last_millis, counter + 1)
        } else {
            (last_millis + 1, 0)
        };

        state.0 * TICKS_PER_MILLI + state.1
    }

    /// Make sure every future `next()` is greater than `timestamp`
    pub fn observe(&self, timestamp: u64) {
        let mut state = self.state.lock();
        let current = state.0 * TICKS_PER_MILLI + state.1;
        if timestamp > current {
            *state = (timestamp / TICKS_PER_MILLI, timestamp % TICKS_PER_MILLI);
        }
    }
}

impl Default for LogicalClock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LogicalClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (last_millis, counter) = *self.state.lock();
        f.debug_struct("LogicalClock")
            .field("last_millis", &last_millis)
            .field("counter", &counter)
            .finish()
    }
}

fn system_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
