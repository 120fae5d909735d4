//! Millisecond time sources for timeout bookkeeping.

use core::sync::atomic::{AtomicU64, Ordering};

/// Monotonic milliseconds since some fixed point.
pub trait Clock {
    fn now_ms(&self) -> u64;

    /// Called from the timer interrupt, before timeouts are swept.
    fn on_timer_tick(&self) {}
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn on_timer_tick(&self) {
        (**self).on_timer_tick();
    }
}

/// Counts timer interrupts of a fixed period.
#[derive(Debug)]
pub struct TickClock {
    ticks: AtomicU64,
    ms_per_tick: u64,
}

impl TickClock {
    #[must_use]
    pub const fn new(ms_per_tick: u64) -> Self {
        Self {
            ticks: AtomicU64::new(0),
            ms_per_tick,
        }
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Clock for TickClock {
    fn now_ms(&self) -> u64 {
        self.ticks().saturating_mul(self.ms_per_tick)
    }

    fn on_timer_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: AtomicU64::new(0),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::Relaxed);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_clock_counts_periods() {
        let clock = TickClock::new(10);
        assert_eq!(clock.now_ms(), 0);
        clock.on_timer_tick();
        clock.on_timer_tick();
        assert_eq!((clock.ticks(), clock.now_ms()), (2, 20));
    }

    #[test]
    fn manual_clock_ignores_ticks() {
        let clock = ManualClock::new();
        clock.on_timer_tick();
        assert_eq!(clock.now_ms(), 0);
        clock.advance(49);
        (&clock).on_timer_tick();
        assert_eq!((&clock).now_ms(), 49);
    }
}
