//! Integration tests: sampler → channels → classifier → indicator, and the
//! event channel → monitor → status snapshot path, with real threads.

#![cfg(not(target_os = "espidf"))]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use templight::adapters::time::MonotonicClock;
use templight::channel::{self, LatestCell, ShutdownFlag};
use templight::classifier::{self, Classifier};
use templight::config::{Band, Rgb, ThresholdConfig};
use templight::error::ActuatorError;
use templight::events::ConnectivityEvent;
use templight::http::{self, HttpState};
use templight::monitor::{self, ConnectivityStatusMonitor, OtaStatus, StatusCell, WifiStatus};
use templight::ports::{ActuatorPort, RestartPort, TimeSyncPort};
use templight::sampler::{self, Sample};
use templight::sensors::thermistor::sim_set_adc;

/// The simulated ADC is a single shared injection point; tests that drive it
/// must not overlap.
static ADC_LOCK: Mutex<()> = Mutex::new(());

const BLUE: Rgb = Rgb::new(0, 0, 255);
const GREEN: Rgb = Rgb::new(0, 255, 0);
const RED: Rgb = Rgb::new(255, 0, 0);

// ── Mock implementations ──────────────────────────────────────

/// Actuator mock whose applied-command log is observable from the test
/// thread while the classifier thread owns the port.
#[derive(Clone)]
struct SharedLed(Arc<Mutex<Vec<Rgb>>>);

impl SharedLed {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    fn applied(&self) -> Vec<Rgb> {
        self.0.lock().unwrap().clone()
    }
}

impl ActuatorPort for SharedLed {
    fn set_color(&mut self, color: Rgb) -> Result<(), ActuatorError> {
        self.0.lock().unwrap().push(color);
        Ok(())
    }
}

struct NoopSync;
impl TimeSyncPort for NoopSync {
    fn sync_time(&mut self) {}
}

struct NoopRestart;
impl RestartPort for NoopRestart {
    fn restart(&mut self) {}
}

/// Poll `predicate` until it holds or the deadline expires.
fn wait_for(deadline: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let end = Instant::now() + deadline;
    while Instant::now() < end {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    predicate()
}

fn sample(t: f32) -> Sample {
    Sample {
        timestamp_ms: 0,
        temperature_c: t,
    }
}

// ── Classifier over real channels ─────────────────────────────

#[test]
fn classifier_walks_samples_through_all_bands() {
    let (sample_tx, sample_rx) = channel::bounded("sample", 10);
    let (_config_tx, config_rx) = channel::bounded::<ThresholdConfig>("config", 10);
    let latest = LatestCell::new();
    let shutdown = ShutdownFlag::new();
    let led = SharedLed::new();

    let task = {
        let mut led = led.clone();
        let latest = latest.clone();
        let shutdown = shutdown.clone();
        std::thread::spawn(move || {
            classifier::run(
                Classifier::new(ThresholdConfig::default()),
                &sample_rx,
                &config_rx,
                &mut led,
                &latest,
                &shutdown,
            );
        })
    };

    // Default table: low -40..=18, medium 19..=27, high 28..=85.
    for t in [15.0, 22.0, 31.0, 18.0] {
        assert!(sample_tx.try_send(sample(t)));
    }

    assert!(wait_for(Duration::from_secs(2), || led.applied().len() == 4));
    assert_eq!(led.applied(), vec![BLUE, GREEN, RED, BLUE]);

    // The snapshot holds the last consumed sample.
    assert_eq!(latest.load().map(|s| s.temperature_c), Some(18.0));

    shutdown.trigger();
    task.join().unwrap();
}

#[test]
fn posted_config_applies_before_the_next_sample() {
    let (sample_tx, sample_rx) = channel::bounded("sample", 10);
    let (config_tx, config_rx) = channel::bounded("config", 10);
    let latest = LatestCell::new();
    let shutdown = ShutdownFlag::new();
    let led = SharedLed::new();

    let task = {
        let mut led = led.clone();
        let latest = latest.clone();
        let shutdown = shutdown.clone();
        std::thread::spawn(move || {
            classifier::run(
                Classifier::new(ThresholdConfig::default()),
                &sample_rx,
                &config_rx,
                &mut led,
                &latest,
                &shutdown,
            );
        })
    };

    assert!(sample_tx.try_send(sample(22.0)));
    assert!(wait_for(Duration::from_secs(2), || led.applied().len() == 1));
    assert_eq!(led.applied(), vec![GREEN]);

    // 22 C is "high" under the replacement table.
    let hot_table = ThresholdConfig {
        low: Band::new(-40, 9, BLUE),
        medium: Band::new(10, 19, GREEN),
        high: Band::new(20, 85, RED),
    };
    assert!(config_tx.try_send(hot_table));
    assert!(sample_tx.try_send(sample(22.0)));

    assert!(wait_for(Duration::from_secs(2), || led.applied().len() == 2));
    assert_eq!(led.applied(), vec![GREEN, RED]);

    shutdown.trigger();
    task.join().unwrap();
}

// ── HTTP surface against the live pipeline ────────────────────

#[test]
fn sensor_value_endpoint_tracks_the_classifier() {
    let (sample_tx, sample_rx) = channel::bounded("sample", 10);
    let (config_tx, config_rx) = channel::bounded("config", 10);
    let latest = LatestCell::new();
    let shutdown = ShutdownFlag::new();
    let led = SharedLed::new();

    let state = HttpState {
        status: StatusCell::new(),
        latest: latest.clone(),
        config_tx,
    };
    assert_eq!(http::get_sensor_value(&state).0, 503);

    let task = {
        let mut led = led.clone();
        let latest = latest.clone();
        let shutdown = shutdown.clone();
        std::thread::spawn(move || {
            classifier::run(
                Classifier::new(ThresholdConfig::default()),
                &sample_rx,
                &config_rx,
                &mut led,
                &latest,
                &shutdown,
            );
        })
    };

    assert!(sample_tx.try_send(sample(21.5)));
    assert!(wait_for(Duration::from_secs(2), || latest.load().is_some()));
    assert_eq!(http::get_sensor_value(&state), (200, "21.50".into()));

    shutdown.trigger();
    task.join().unwrap();
}

// ── Sampler thread against the simulated ADC ──────────────────

#[test]
fn sampler_produces_monotonic_timestamps() {
    let _adc = ADC_LOCK.lock().unwrap();
    sim_set_adc(2048);
    let (sample_tx, sample_rx) = channel::bounded("sample", 10);
    let clock = MonotonicClock::new();
    let shutdown = ShutdownFlag::new();

    let task = {
        let clock = clock.clone();
        let shutdown = shutdown.clone();
        std::thread::spawn(move || {
            let sensor = templight::sensors::thermistor::ThermistorSensor::new(32);
            sampler::run(sensor, &sample_tx, &clock, &shutdown);
        })
    };

    std::thread::sleep(Duration::from_millis(350));
    shutdown.trigger();
    task.join().unwrap();

    let mut samples = Vec::new();
    while let Some(s) = sample_rx.try_recv() {
        samples.push(s);
    }
    assert!(samples.len() >= 2, "expected several samples, got {}", samples.len());
    for pair in samples.windows(2) {
        assert!(pair[1].timestamp_ms >= pair[0].timestamp_ms);
    }
    for s in &samples {
        assert!((s.temperature_c - 25.0).abs() < 1.0);
    }
}

#[test]
fn sampler_emits_nothing_while_the_adc_is_railed() {
    let _adc = ADC_LOCK.lock().unwrap();
    // Railed low: open divider, treated as a fault every cycle.
    sim_set_adc(0);
    let (sample_tx, sample_rx) = channel::bounded("sample", 10);
    let clock = MonotonicClock::new();
    let shutdown = ShutdownFlag::new();

    let task = {
        let clock = clock.clone();
        let shutdown = shutdown.clone();
        std::thread::spawn(move || {
            let sensor = templight::sensors::thermistor::ThermistorSensor::new(32);
            sampler::run(sensor, &sample_tx, &clock, &shutdown);
        })
    };

    // Several periods elapse; every cycle is skipped, nothing is emitted.
    std::thread::sleep(Duration::from_millis(350));
    assert!(sample_rx.try_recv().is_none());

    // Sensor recovers: sampling resumes on the next deadline without a
    // resend of any stale value.
    sim_set_adc(2048);
    assert!(wait_for(Duration::from_secs(2), || {
        sample_rx.try_recv().is_some_and(|s| (s.temperature_c - 25.0).abs() < 1.0)
    }));

    shutdown.trigger();
    task.join().unwrap();
}

// ── Monitor over the real event channel ───────────────────────

#[test]
fn wifi_events_reach_the_status_snapshot() {
    let (event_tx, event_rx) = channel::bounded("events", 3);
    let cell = StatusCell::new();
    let clock = MonotonicClock::new();
    let shutdown = ShutdownFlag::new();

    let task = {
        let cell = cell.clone();
        let clock = clock.clone();
        let shutdown = shutdown.clone();
        std::thread::spawn(move || {
            let mut sync = NoopSync;
            let mut restart = NoopRestart;
            monitor::run(
                ConnectivityStatusMonitor::new(cell),
                &event_rx,
                &mut sync,
                &mut restart,
                &clock,
                &shutdown,
            );
        })
    };

    assert!(event_tx.try_send(ConnectivityEvent::WifiConnectInit));
    assert!(event_tx.try_send(ConnectivityEvent::WifiConnectSuccess));
    assert!(event_tx.try_send(ConnectivityEvent::OtaFailed));

    assert!(wait_for(Duration::from_secs(2), || {
        let snap = cell.read();
        snap.wifi == WifiStatus::Connected && snap.ota == OtaStatus::Failed
    }));

    shutdown.trigger();
    task.join().unwrap();
}
