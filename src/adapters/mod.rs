//! Platform adapters behind the port traits: clock, SNTP, restart, Wi-Fi.

pub mod time;
pub mod wifi;
