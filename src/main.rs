//! TempLight Firmware — Main Entry Point
//!
//! Boot sequence: logger, peripherals, bounded channels, three task loops
//! (sampler, classifier, monitor), Wi-Fi adapter, HTTP server. On non-espidf
//! targets the same pipeline runs against simulated peripherals and walks the
//! indicator through all three temperature bands before stopping.
#![deny(unused_must_use)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use log::{info, warn};

use templight::adapters::time::{MonotonicClock, SntpSync, SystemRestart};
use templight::adapters::wifi::WifiAdapter;
use templight::channel::{self, LatestCell, ShutdownFlag};
use templight::classifier::{self, Classifier};
use templight::config::{Rgb, ThresholdConfig};
use templight::drivers::{hw, rgb_led::RgbLed};
use templight::http::HttpState;
use templight::monitor::{self, ConnectivityStatusMonitor, StatusCell};
use templight::ports::ActuatorPort;
use templight::sampler::{self, Sample};
use templight::sensors::thermistor::ThermistorSensor;
use templight::{http, pins};

// Queue depths, sized for one consumer draining at the sample period.
const SAMPLE_QUEUE_DEPTH: usize = 10;
const CONFIG_QUEUE_DEPTH: usize = 10;
const EVENT_QUEUE_DEPTH: usize = 3;

/// Indicator color from power-on until the first classified sample.
const BOOT_COLOR: Rgb = Rgb::new(255, 45, 0);

/// Worker stack size. The FreeRTOS pthread default is too small for the
/// logging and JSON paths.
const TASK_STACK: usize = 8 * 1024;

fn main() -> Result<()> {
    // ── 1. Platform bootstrap ─────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(target_os = "espidf"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("TempLight v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = hw::init_peripherals() {
        // Peripheral init failure is critical — log and halt; the watchdog
        // resets the device after timeout.
        log::error!("HAL init failed: {e} — halting");
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 2. Shared plumbing ────────────────────────────────────
    let clock = MonotonicClock::new();
    let shutdown = ShutdownFlag::new();
    let latest: LatestCell<Sample> = LatestCell::new();
    let status = StatusCell::new();

    let (sample_tx, sample_rx) = channel::bounded("sample", SAMPLE_QUEUE_DEPTH);
    let (config_tx, config_rx) = channel::bounded("config", CONFIG_QUEUE_DEPTH);
    let (event_tx, event_rx) = channel::bounded("events", EVENT_QUEUE_DEPTH);

    let mut led = RgbLed::new();
    if let Err(e) = led.set_color(BOOT_COLOR) {
        warn!("boot indicator write failed ({e})");
    }

    // ── 3. Task loops ─────────────────────────────────────────
    let sampler_task = {
        let clock = clock.clone();
        let shutdown = shutdown.clone();
        std::thread::Builder::new()
            .name("sampler".into())
            .stack_size(TASK_STACK)
            .spawn(move || {
                let sensor = ThermistorSensor::new(pins::THERMISTOR_ADC_GPIO);
                sampler::run(sensor, &sample_tx, &clock, &shutdown);
            })?
    };

    let classifier_task = {
        let latest = latest.clone();
        let shutdown = shutdown.clone();
        std::thread::Builder::new()
            .name("classifier".into())
            .stack_size(TASK_STACK)
            .spawn(move || {
                classifier::run(
                    Classifier::new(ThresholdConfig::default()),
                    &sample_rx,
                    &config_rx,
                    &mut led,
                    &latest,
                    &shutdown,
                );
            })?
    };

    let monitor_task = {
        let clock = clock.clone();
        let shutdown = shutdown.clone();
        let status = status.clone();
        std::thread::Builder::new()
            .name("monitor".into())
            .stack_size(TASK_STACK)
            .spawn(move || {
                let mut sync = SntpSync::new();
                let mut restart = SystemRestart::new();
                monitor::run(
                    ConnectivityStatusMonitor::new(status),
                    &event_rx,
                    &mut sync,
                    &mut restart,
                    &clock,
                    &shutdown,
                );
            })?
    };

    let tasks = [sampler_task, classifier_task, monitor_task];

    // ── 4. Connectivity + HTTP surface ────────────────────────
    let wifi = Arc::new(Mutex::new(WifiAdapter::new(event_tx.clone())));
    let http_state = HttpState {
        status,
        latest: latest.clone(),
        config_tx,
    };

    #[cfg(target_os = "espidf")]
    {
        let _server = http::server::start(http_state, Arc::clone(&wifi))?;
        info!("pipeline running");
        // Task loops run for the device lifetime; joining parks this thread
        // while the HTTP server handle stays alive.
        for task in tasks {
            let _ = task.join();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    {
        use templight::sensors::thermistor::sim_set_adc;

        // Simulated station associates immediately; the monitor moves to
        // Connected and latches its one-shot time sync.
        {
            let mut wifi = wifi.lock().expect("wifi adapter lock");
            wifi.set_credentials("SimNet", "simulated")
                .map_err(templight::error::Error::from)?;
            if let Err(e) = wifi.connect() {
                warn!("sim: connect failed ({e})");
            }
        }

        // Walk the indicator through cold, room, and hot readings.
        for raw in [3000_u16, 2048, 1000, 2048] {
            sim_set_adc(raw);
            std::thread::sleep(std::time::Duration::from_millis(500));
            if let Some(sample) = latest.load() {
                let (_, body) = http::get_status(&http_state);
                info!("sim: {:.2} C, status {body}", sample.temperature_c);
            }
        }

        shutdown.trigger();
        for task in tasks {
            let _ = task.join();
        }
        info!("sim: pipeline stopped");
    }

    Ok(())
}
