//! GPIO and ADC channel assignments (observed board wiring).

/// Thermistor divider on ADC1 channel 4.
pub const THERMISTOR_ADC_GPIO: i32 = 32;
pub const THERMISTOR_ADC_CHANNEL: u32 = 4;

/// Discrete RGB LED, one LEDC PWM channel per color.
pub const RGB_LED_RED_GPIO: i32 = 21;
pub const RGB_LED_GREEN_GPIO: i32 = 22;
pub const RGB_LED_BLUE_GPIO: i32 = 23;
