//! Periodic temperature sampling task.
//!
//! Reads the thermistor every [`SAMPLE_PERIOD`] and pushes one [`Sample`]
//! onto the bounded sample channel. Wake-ups use absolute deadlines
//! (`next += period`), not relative sleeps, so per-cycle processing jitter
//! never accumulates into period drift.

use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::adapters::time::MonotonicClock;
use crate::channel::{Sender, ShutdownFlag};
use crate::sensors::thermistor::ThermistorSensor;

/// Fixed sampling period (observed: 100 ms).
pub const SAMPLE_PERIOD: Duration = Duration::from_millis(100);

/// A timestamped temperature reading. Produced periodically, consumed exactly
/// once by the classifier, not retained after consumption. Timestamps are
/// monotonic non-decreasing within this single producer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp_ms: u64,
    pub temperature_c: f32,
}

/// Sampler task body. Runs until `shutdown` is triggered.
pub fn run(
    mut sensor: ThermistorSensor,
    tx: &Sender<Sample>,
    clock: &MonotonicClock,
    shutdown: &ShutdownFlag,
) {
    let mut next_wake = Instant::now() + SAMPLE_PERIOD;

    while !shutdown.is_set() {
        match sensor.read() {
            Ok(temperature_c) => {
                let sample = Sample {
                    timestamp_ms: clock.uptime_ms(),
                    temperature_c,
                };
                debug!("sampler: {:.2} C", temperature_c);
                // Drop-on-full: the sampler must never block on the consumer.
                tx.try_send(sample);
            }
            Err(e) => {
                // No sample this period; retry on the next deadline.
                warn!("sampler: skipping cycle ({e})");
            }
        }

        let now = Instant::now();
        if next_wake > now {
            std::thread::sleep(next_wake - now);
        }
        next_wake += SAMPLE_PERIOD;
    }

    debug!("sampler: shutdown");
}
