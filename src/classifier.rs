//! Classifier/actuator task: maps samples to indicator commands.
//!
//! Per cycle the task:
//!
//! 1. Drains the config channel non-blockingly; each received table replaces
//!    the active one wholesale (all-or-nothing — a partially applied band set
//!    would be a correctness bug).
//! 2. Blocks on the sample channel, bounded by one sample period.
//! 3. Classifies the temperature against the active table in fixed order
//!    high → medium → low; the first matching band wins, so overlapping
//!    tables favor the higher classification. No match falls back to the
//!    low band's color.
//! 4. Applies the command through [`ActuatorPort`] only when it differs from
//!    the current one.
//!
//! The classifier is the exclusive owner of the indicator hardware and of the
//! active threshold table. One malformed or surprising message never halts
//! the loop.

use std::time::Duration;

use log::{debug, info, warn};

use crate::channel::{LatestCell, Receiver, ShutdownFlag};
use crate::config::{Rgb, ThresholdConfig};
use crate::ports::ActuatorPort;
use crate::sampler::{Sample, SAMPLE_PERIOD};

/// A color triple actively driving the indicator. Superseded by the next
/// command; no history retained.
pub type ActuatorCommand = Rgb;

/// Classifier state: the active threshold table and the command currently
/// driving the hardware.
pub struct Classifier {
    config: ThresholdConfig,
    current: ActuatorCommand,
}

impl Classifier {
    /// Start with the given table (boot default until the operator posts one)
    /// and the indicator off.
    pub fn new(config: ThresholdConfig) -> Self {
        Self {
            config,
            current: Rgb::OFF,
        }
    }

    /// Replace the active table atomically.
    pub fn apply_config(&mut self, config: ThresholdConfig) {
        if config != self.config {
            info!(
                "classifier: threshold table replaced (low {}..={}, medium {}..={}, high {}..={})",
                config.low.lower,
                config.low.upper,
                config.medium.lower,
                config.medium.upper,
                config.high.lower,
                config.high.upper,
            );
        }
        self.config = config;
    }

    /// Band matching in fixed order high → medium → low, first match wins.
    /// A temperature in no band maps to the low band's color.
    pub fn classify(&self, temperature_c: f32) -> ActuatorCommand {
        if self.config.high.contains(temperature_c) {
            self.config.high.color
        } else if self.config.medium.contains(temperature_c) {
            self.config.medium.color
        } else {
            // Either a low-band match or no match at all; both yield the
            // low band's color, the defined fallback.
            self.config.low.color
        }
    }

    /// Evaluate one sample and drive the actuator when the command changes.
    ///
    /// Returns the new command when it differed from the current one. A
    /// failed hardware write is logged and the command state still updated:
    /// the next change retries the new target implicitly.
    pub fn step(
        &mut self,
        sample: &Sample,
        actuator: &mut impl ActuatorPort,
    ) -> Option<ActuatorCommand> {
        let command = self.classify(sample.temperature_c);
        if command == self.current {
            return None;
        }

        if let Err(e) = actuator.set_color(command) {
            warn!("classifier: actuator write failed ({e}), state updated anyway");
        }
        self.current = command;
        Some(command)
    }

    /// The command currently driving the indicator.
    pub fn current_command(&self) -> ActuatorCommand {
        self.current
    }

    /// The table currently in force.
    pub fn active_config(&self) -> &ThresholdConfig {
        &self.config
    }
}

/// Receive timeout for the sample channel: bounded by the next scheduled
/// sample so config updates and shutdown are noticed within one period.
const RECV_BOUND: Duration = SAMPLE_PERIOD;

/// Classifier task body. Runs until `shutdown` is triggered.
pub fn run(
    mut classifier: Classifier,
    sample_rx: &Receiver<Sample>,
    config_rx: &Receiver<ThresholdConfig>,
    actuator: &mut impl ActuatorPort,
    latest: &LatestCell<Sample>,
    shutdown: &ShutdownFlag,
) {
    while !shutdown.is_set() {
        // Config first, so a sample is always evaluated against the table
        // in force at the moment it is consumed.
        while let Some(config) = config_rx.try_recv() {
            classifier.apply_config(config);
        }

        let Some(sample) = sample_rx.recv_timeout(RECV_BOUND) else {
            continue;
        };

        if let Some(command) = classifier.step(&sample, actuator) {
            debug!(
                "classifier: {:.1} C -> ({}, {}, {})",
                sample.temperature_c, command.r, command.g, command.b
            );
        }
        latest.store(sample);
    }

    debug!("classifier: shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Band;
    use crate::error::ActuatorError;

    struct MockLed {
        applied: Vec<Rgb>,
        fail_next: bool,
    }

    impl MockLed {
        fn new() -> Self {
            Self {
                applied: Vec::new(),
                fail_next: false,
            }
        }
    }

    impl ActuatorPort for MockLed {
        fn set_color(&mut self, color: Rgb) -> Result<(), ActuatorError> {
            if self.fail_next {
                self.fail_next = false;
                return Err(ActuatorError::PwmWriteFailed);
            }
            self.applied.push(color);
            Ok(())
        }
    }

    const BLUE: Rgb = Rgb::new(0, 0, 255);
    const GREEN: Rgb = Rgb::new(0, 255, 0);
    const RED: Rgb = Rgb::new(255, 0, 0);

    fn table() -> ThresholdConfig {
        ThresholdConfig {
            low: Band::new(-40, 19, BLUE),
            medium: Band::new(20, 29, GREEN),
            high: Band::new(30, 100, RED),
        }
    }

    fn sample(t: f32) -> Sample {
        Sample {
            timestamp_ms: 0,
            temperature_c: t,
        }
    }

    #[test]
    fn bands_classify_in_range() {
        let c = Classifier::new(table());
        assert_eq!(c.classify(15.0), BLUE);
        assert_eq!(c.classify(22.0), GREEN);
        assert_eq!(c.classify(31.0), RED);
    }

    #[test]
    fn overlap_favors_high_over_medium() {
        // Overlapping table straight from the wire: 25 C is in both medium
        // and high; the high-first evaluation order must win.
        let c = Classifier::new(ThresholdConfig {
            low: Band::new(-40, 10, BLUE),
            medium: Band::new(11, 30, GREEN),
            high: Band::new(20, 100, RED),
        });
        assert_eq!(c.classify(25.0), RED);
    }

    #[test]
    fn gap_falls_back_to_low_color() {
        let c = Classifier::new(ThresholdConfig {
            low: Band::new(-40, 10, BLUE),
            medium: Band::new(20, 25, GREEN),
            high: Band::new(35, 100, RED),
        });
        // 15 C is in no band.
        assert_eq!(c.classify(15.0), BLUE);
    }

    #[test]
    fn step_applies_only_on_change() {
        let mut c = Classifier::new(table());
        let mut led = MockLed::new();

        assert_eq!(c.step(&sample(22.0), &mut led), Some(GREEN));
        assert_eq!(c.step(&sample(23.0), &mut led), None);
        assert_eq!(c.step(&sample(31.0), &mut led), Some(RED));
        assert_eq!(led.applied, vec![GREEN, RED]);
    }

    #[test]
    fn identical_config_resend_is_idempotent() {
        let mut c = Classifier::new(table());
        let mut led = MockLed::new();

        c.step(&sample(22.0), &mut led);
        c.apply_config(table());
        // Steady-state sample stream: no command change after the resend.
        assert_eq!(c.step(&sample(22.0), &mut led), None);
        assert_eq!(led.applied, vec![GREEN]);
    }

    #[test]
    fn write_failure_still_updates_state() {
        let mut c = Classifier::new(table());
        let mut led = MockLed::new();
        led.fail_next = true;

        assert_eq!(c.step(&sample(22.0), &mut led), Some(GREEN));
        assert_eq!(c.current_command(), GREEN);
        // The failed write was not retried.
        assert!(led.applied.is_empty());
        // Next change reaches the hardware as usual.
        assert_eq!(c.step(&sample(31.0), &mut led), Some(RED));
        assert_eq!(led.applied, vec![RED]);
    }

    #[test]
    fn config_swap_is_all_or_nothing() {
        let mut c = Classifier::new(table());
        let mut led = MockLed::new();

        // Same geometry, different colors: after the swap every band must
        // answer with the new color, never a mix of old and new.
        let recolored = ThresholdConfig {
            low: Band::new(-40, 19, Rgb::new(1, 1, 1)),
            medium: Band::new(20, 29, Rgb::new(2, 2, 2)),
            high: Band::new(30, 100, Rgb::new(3, 3, 3)),
        };
        c.apply_config(recolored);
        assert_eq!(c.step(&sample(15.0), &mut led), Some(Rgb::new(1, 1, 1)));
        assert_eq!(c.step(&sample(22.0), &mut led), Some(Rgb::new(2, 2, 2)));
        assert_eq!(c.step(&sample(31.0), &mut led), Some(Rgb::new(3, 3, 3)));
    }
}
