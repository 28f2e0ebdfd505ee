//! Connectivity lifecycle events.
//!
//! Produced by the Wi-Fi station adapter and the OTA upload callback, both of
//! which push onto the same bounded channel. Consumed exclusively by the
//! [`ConnectivityStatusMonitor`](crate::monitor::ConnectivityStatusMonitor) —
//! single-consumer channel semantics are what serialize the monitor's state,
//! so it needs no internal locking.

/// A discrete notification of Wi-Fi or firmware-update lifecycle progress.
/// Transient: consumed exactly once, never retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// A station connect attempt has started (boot or credentials posted).
    WifiConnectInit,
    /// The station associated and got an IP.
    WifiConnectSuccess,
    /// The connect attempt failed.
    WifiConnectFail,
    /// A firmware image was received and flashed successfully.
    OtaSuccess,
    /// Firmware upload or flash failed.
    OtaFailed,
}
