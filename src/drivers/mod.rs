//! Actuator drivers and one-shot peripheral initialisation.

pub mod hw;
pub mod rgb_led;
