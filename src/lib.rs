//! TempLight Firmware — Library Root
//!
//! Networked thermistor-to-RGB indicator with hexagonal task wiring:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                    │
//! │                                                            │
//! │  RgbLed          WifiAdapter      SntpSync/SystemRestart   │
//! │  (ActuatorPort)  (event source)   (TimeSync/RestartPort)   │
//! │  ThermistorSensor        HTTP handlers                     │
//! │                                                            │
//! │  ─────────────── Port Trait Boundary ──────────────────    │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │        Pure logic (host-testable)                    │  │
//! │  │  Sampler · Classifier · ConnectivityStatusMonitor    │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │                                                            │
//! │  Bounded channels (drop-newest) · snapshot cells           │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Three tasks communicate only through bounded channels: the sampler
//! produces timestamped temperatures, the classifier maps them to indicator
//! colors against an operator-configurable threshold table, and the monitor
//! tracks connectivity and firmware-update state for the web UI.
#![deny(unused_must_use)]

pub mod adapters;
pub mod channel;
pub mod classifier;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod http;
pub mod monitor;
pub mod pins;
pub mod ports;
pub mod sampler;
pub mod sensors;
