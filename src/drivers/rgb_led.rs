//! Tri-color indicator driver.
//!
//! Three LEDC PWM channels (8-bit duty, 100 Hz timer) drive discrete R/G/B
//! LEDs. Implements [`ActuatorPort`]; the classifier is the only caller.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes duty cycles through the LEDC channels set up by
//! [`hw::init_peripherals`](crate::drivers::hw::init_peripherals).
//! On host/test: tracks the last applied color in memory only.

use crate::config::Rgb;
use crate::error::ActuatorError;
use crate::ports::ActuatorPort;

pub struct RgbLed {
    current: Rgb,
}

impl RgbLed {
    pub fn new() -> Self {
        Self { current: Rgb::OFF }
    }

    /// The last color successfully applied.
    pub fn current_color(&self) -> Rgb {
        self.current
    }

    #[cfg(target_os = "espidf")]
    fn write_duty(&self, color: Rgb) -> Result<(), ActuatorError> {
        use crate::drivers::hw;
        hw::ledc_set(0, color.r).map_err(|_| ActuatorError::PwmWriteFailed)?;
        hw::ledc_set(1, color.g).map_err(|_| ActuatorError::PwmWriteFailed)?;
        hw::ledc_set(2, color.b).map_err(|_| ActuatorError::PwmWriteFailed)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_duty(&self, _color: Rgb) -> Result<(), ActuatorError> {
        Ok(())
    }
}

impl Default for RgbLed {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for RgbLed {
    fn set_color(&mut self, color: Rgb) -> Result<(), ActuatorError> {
        self.write_duty(color)?;
        self.current = color;
        Ok(())
    }
}
