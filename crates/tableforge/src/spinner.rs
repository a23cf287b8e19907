//! The driving loop: posts ticks at a fixed cadence and drains the bus.
//!
//! Nothing in the dispatch core runs on its own — [`Bus::drain`] only
//! happens when somebody calls it. The spinner is that somebody: each
//! cycle it posts a `tick`, gives the caller's pump closure a chance to
//! do I/O upkeep (endpoint polling, accepting peers), drains the queue,
//! and sleeps off the rest of the period. A processed `quit` ends the
//! loop; the quit event is the notification, the spinner's flag is the
//! cancellation token.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rand::Rng;
use tableforge_events::{Bus, TICK, fields};
use tracing::{debug, trace, warn};

use crate::TableforgeError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Cadence configuration for a [`Spinner`].
#[derive(Debug, Clone)]
pub struct SpinnerConfig {
    /// Tick rate in Hz. Default 50, clamped to 10–100.
    pub rate_hz: u32,
    /// Random jitter (0–max µs) added before the *first* tick, so
    /// several domains started at the same instant do not tick in
    /// lockstep.
    pub initial_jitter_us: u64,
}

impl Default for SpinnerConfig {
    fn default() -> Self {
        Self {
            rate_hz: 50,
            initial_jitter_us: 2_000, // 0–2 ms default jitter
        }
    }
}

impl SpinnerConfig {
    /// Minimum supported tick rate.
    pub const MIN_RATE_HZ: u32 = 10;
    /// Maximum supported tick rate.
    pub const MAX_RATE_HZ: u32 = 100;

    /// Create a config for a specific tick rate with default jitter.
    pub fn with_rate(rate_hz: u32) -> Self {
        Self {
            rate_hz,
            ..Default::default()
        }
    }

    /// Clamp any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`Spinner::new`]. Cadence mistakes should
    /// degrade, not crash a running table.
    pub fn validated(mut self) -> Self {
        if self.rate_hz < Self::MIN_RATE_HZ || self.rate_hz > Self::MAX_RATE_HZ {
            warn!(
                rate = self.rate_hz,
                min = Self::MIN_RATE_HZ,
                max = Self::MAX_RATE_HZ,
                "rate_hz out of range — clamping"
            );
            self.rate_hz = self.rate_hz.clamp(Self::MIN_RATE_HZ, Self::MAX_RATE_HZ);
        }
        self
    }

    /// Duration of one cycle.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_hz as f64)
    }
}

// ---------------------------------------------------------------------------
// Spinner
// ---------------------------------------------------------------------------

/// Drives one domain's bus until a `quit` event is processed.
pub struct Spinner {
    bus: Bus,
    config: SpinnerConfig,
    keep_going: Rc<Cell<bool>>,
}

/// A cheap handle that can stop a [`Spinner`] from a handler or another
/// collaborator in the same domain.
#[derive(Clone)]
pub struct SpinnerHalt {
    keep_going: Rc<Cell<bool>>,
}

impl SpinnerHalt {
    /// Makes the spinner exit at the end of its current cycle.
    pub fn halt(&self) {
        self.keep_going.set(false);
    }
}

impl Spinner {
    /// Creates a spinner for `bus` with a validated config.
    pub fn new(bus: Bus, config: SpinnerConfig) -> Self {
        let config = config.validated();
        debug!(rate_hz = config.rate_hz, "spinner created");
        Self {
            bus,
            config,
            keep_going: Rc::new(Cell::new(true)),
        }
    }

    /// A handle for stopping the loop without posting `quit`.
    pub fn halt_handle(&self) -> SpinnerHalt {
        SpinnerHalt {
            keep_going: Rc::clone(&self.keep_going),
        }
    }

    /// Runs the loop until `quit` is processed or the halt handle fires.
    ///
    /// Each cycle: post `tick` (with the fixed `dt` in seconds as a
    /// field), call `pump` for I/O upkeep, drain the bus, sleep to
    /// cadence. `pump` runs before the drain so frames that completed
    /// during the sleep are dispatched in the same cycle.
    ///
    /// # Errors
    ///
    /// Whatever `pump` returns, and handler failures when the bus is
    /// configured to propagate them.
    pub fn run(
        &self,
        mut pump: impl FnMut() -> Result<(), TableforgeError>,
    ) -> Result<(), TableforgeError> {
        let period = self.config.period();
        let dt = period.as_secs_f64();

        if self.config.initial_jitter_us > 0 {
            let us = rand::rng().random_range(0..self.config.initial_jitter_us);
            std::thread::sleep(Duration::from_micros(us));
        }

        while self.keep_going.get() {
            let cycle_start = Instant::now();

            self.bus.post(TICK, fields! { "dt" => dt });
            pump()?;
            if self.bus.drain()? {
                debug!("quit processed; spinner stopping");
                self.keep_going.set(false);
                break;
            }

            let elapsed = cycle_start.elapsed();
            if let Some(rest) = period.checked_sub(elapsed) {
                std::thread::sleep(rest);
            } else {
                // Overran the budget; start the next cycle immediately.
                trace!(elapsed_ms = elapsed.as_secs_f64() * 1000.0, "cycle overran its period");
            }
        }
        Ok(())
    }
}
