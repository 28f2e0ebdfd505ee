//! NTC thermistor temperature sensor (10 kOhm @ 25 C).
//!
//! Wired in a voltage divider with a fixed 10 kOhm reference resistor, read
//! through a 12-bit ADC channel. The full three-coefficient Steinhart–Hart
//! equation converts resistance to temperature:
//!
//! `1/T = A + B·ln(R) + C·ln(R)^3`
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 channel 4 via the oneshot API.
//! On host/test: reads from a static `AtomicU16` for injection.

use core::sync::atomic::AtomicU16;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

use crate::error::SensorError;

static SIM_ADC: AtomicU16 = AtomicU16::new(2048);

/// Inject a raw ADC count for host-side tests and simulation.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(raw: u16) {
    SIM_ADC.store(raw, Ordering::Relaxed);
}

const ADC_MAX: f64 = 4095.0;
const V_REF: f64 = 3.3;
const R_REF: f64 = 10_000.0;

// Steinhart–Hart coefficients for a 10 k NTC bead.
const A_COEFF: f64 = 1.009_249_522e-3;
const B_COEFF: f64 = 2.378_405_444e-4;
const C_COEFF: f64 = 2.019_202_697e-7;

/// Temperatures the analog front end can plausibly represent. Anything
/// outside is treated as a wiring/transducer fault, not a reading.
const PLAUSIBLE_MIN_C: f64 = -55.0;
const PLAUSIBLE_MAX_C: f64 = 150.0;

/// Convert a raw ADC count to degrees Celsius.
///
/// Pure function, unit-testable independently of the pipeline. Fails when
/// the count pins to either rail (open or shorted divider) or the derived
/// temperature is outside the plausible range of the front end.
pub fn raw_to_celsius(raw: u16) -> Result<f32, SensorError> {
    let raw = f64::from(raw);
    if raw <= 0.0 || raw >= ADC_MAX {
        return Err(SensorError::OutOfRange);
    }

    let v = raw * V_REF / ADC_MAX;
    let resistance = R_REF * v / (V_REF - v);

    let ln_r = resistance.ln();
    let inv_t = A_COEFF + B_COEFF * ln_r + C_COEFF * ln_r.powi(3);
    if inv_t <= 0.0 {
        return Err(SensorError::OutOfRange);
    }

    let celsius = 1.0 / inv_t - 273.15;
    if !(PLAUSIBLE_MIN_C..=PLAUSIBLE_MAX_C).contains(&celsius) {
        return Err(SensorError::OutOfRange);
    }
    Ok(celsius as f32)
}

/// The thermistor front end. Calibration constants only — no other state.
pub struct ThermistorSensor {
    _adc_gpio: i32,
}

impl ThermistorSensor {
    pub fn new(adc_gpio: i32) -> Self {
        Self { _adc_gpio: adc_gpio }
    }

    /// Read one temperature in engineering units.
    ///
    /// On fault the caller must treat this as "no sample this period" and
    /// skip the cycle — the previous value is never resent.
    pub fn read(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_adc()?;
        raw_to_celsius(raw)
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&mut self) -> Result<u16, SensorError> {
        // ADC1 oneshot handle initialised by main before the sampler starts.
        crate::drivers::hw::adc1_read().map_err(|_| SensorError::AdcReadFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&mut self) -> Result<u16, SensorError> {
        Ok(SIM_ADC.load(Ordering::Relaxed))
    }
}
