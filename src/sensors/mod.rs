//! Sensor subsystem — the NTC thermistor front end.

pub mod thermistor;
