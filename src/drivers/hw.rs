//! One-shot hardware peripheral initialisation.
//!
//! Configures the ADC oneshot unit, the LEDC timer/channels, and the Wi-Fi
//! station driver using raw ESP-IDF sys calls. Called once from `main()`
//! before any task starts; the read/write helpers are then safe to call from
//! the single task that owns each peripheral (sampler for the ADC, classifier
//! for the LEDC channels).

/// Errors during one-shot peripheral initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    LedcInitFailed(i32),
    WifiInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={rc})"),
            Self::LedcInitFailed(rc) => write!(f, "LEDC config failed (rc={rc})"),
            Self::WifiInitFailed(rc) => write!(f, "WiFi init failed (rc={rc})"),
        }
    }
}

#[cfg(target_os = "espidf")]
mod espidf {
    use esp_idf_svc::sys::*;
    use log::info;

    use super::HwInitError;
    use crate::pins;

    static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

    /// Initialise ADC1 and the LEDC timer/channels. Single-threaded boot
    /// path only, before any task is spawned.
    pub fn init_peripherals() -> Result<(), HwInitError> {
        unsafe {
            init_adc()?;
            init_ledc()?;
        }
        info!("hw: ADC1 + LEDC configured");
        Ok(())
    }

    unsafe fn init_adc() -> Result<(), HwInitError> {
        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        // SAFETY: ADC1_HANDLE is written once here at boot.
        let rc = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
        if rc != ESP_OK {
            return Err(HwInitError::AdcInitFailed(rc));
        }

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        let rc = unsafe {
            adc_oneshot_config_channel(ADC1_HANDLE, pins::THERMISTOR_ADC_CHANNEL, &chan_cfg)
        };
        if rc != ESP_OK {
            return Err(HwInitError::AdcInitFailed(rc));
        }
        Ok(())
    }

    /// Read the thermistor channel. Sampler task only.
    pub fn adc1_read() -> Result<u16, HwInitError> {
        let mut raw: i32 = 0;
        // SAFETY: handle written once during init, read from one task.
        let rc = unsafe { adc_oneshot_read(ADC1_HANDLE, pins::THERMISTOR_ADC_CHANNEL, &mut raw) };
        if rc != ESP_OK {
            return Err(HwInitError::AdcInitFailed(rc));
        }
        Ok(raw.max(0) as u16)
    }

    const LEDC_CHANNELS: [(u32, i32); 3] = [
        (0, pins::RGB_LED_RED_GPIO),
        (1, pins::RGB_LED_GREEN_GPIO),
        (2, pins::RGB_LED_BLUE_GPIO),
    ];

    unsafe fn init_ledc() -> Result<(), HwInitError> {
        let timer_cfg = ledc_timer_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
            timer_num: ledc_timer_t_LEDC_TIMER_0,
            freq_hz: 100,
            clk_cfg: ledc_clk_cfg_t_LEDC_AUTO_CLK,
            ..Default::default()
        };
        let rc = unsafe { ledc_timer_config(&timer_cfg) };
        if rc != ESP_OK {
            return Err(HwInitError::LedcInitFailed(rc));
        }

        for (channel, gpio) in LEDC_CHANNELS {
            let chan_cfg = ledc_channel_config_t {
                gpio_num: gpio,
                speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
                channel,
                intr_type: ledc_intr_type_t_LEDC_INTR_DISABLE,
                timer_sel: ledc_timer_t_LEDC_TIMER_0,
                duty: 0,
                hpoint: 0,
                ..Default::default()
            };
            let rc = unsafe { ledc_channel_config(&chan_cfg) };
            if rc != ESP_OK {
                return Err(HwInitError::LedcInitFailed(rc));
            }
        }
        Ok(())
    }

    /// Write one 8-bit duty value. Classifier task only.
    pub fn ledc_set(channel: u32, duty: u8) -> Result<(), HwInitError> {
        let rc = unsafe {
            ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty))
        };
        if rc != ESP_OK {
            return Err(HwInitError::LedcInitFailed(rc));
        }
        let rc = unsafe { ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel) };
        if rc != ESP_OK {
            return Err(HwInitError::LedcInitFailed(rc));
        }
        Ok(())
    }

    /// Configure and start the station with the given credentials.
    pub fn wifi_sta_connect(ssid: &str, password: &str) -> Result<(), HwInitError> {
        let mut sta: wifi_sta_config_t = unsafe { core::mem::zeroed() };
        for (dst, src) in sta.ssid.iter_mut().zip(ssid.bytes()) {
            *dst = src;
        }
        for (dst, src) in sta.password.iter_mut().zip(password.bytes()) {
            *dst = src;
        }
        let mut cfg = wifi_config_t { sta };

        let rc = unsafe { esp_wifi_set_config(wifi_interface_t_WIFI_IF_STA, &mut cfg) };
        if rc != ESP_OK {
            return Err(HwInitError::WifiInitFailed(rc));
        }
        let rc = unsafe { esp_wifi_connect() };
        if rc != ESP_OK {
            return Err(HwInitError::WifiInitFailed(rc));
        }
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
pub use espidf::{adc1_read, init_peripherals, ledc_set, wifi_sta_connect};

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw(sim): peripheral init skipped");
    Ok(())
}
