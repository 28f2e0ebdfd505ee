//! Port traits — the boundary between the coordination core and hardware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ task loop (domain)
//! ```
//!
//! Driven adapters (LED PWM, SNTP, system reset) implement these traits. The
//! task loops consume them via generics, so the core never touches hardware
//! directly and runs unmodified under host tests with mock adapters.

use crate::config::Rgb;
use crate::error::ActuatorError;

/// Write-side port for the tri-color indicator.
///
/// The classifier is the sole caller — no other component may drive the
/// indicator. A failed write is logged by the caller and not retried; the
/// next command change retries the hardware implicitly.
pub trait ActuatorPort {
    fn set_color(&mut self, color: Rgb) -> Result<(), ActuatorError>;
}

/// One-shot wall-clock synchronization, triggered by the monitor on the
/// first successful Wi-Fi connection. Implementations must be idempotent.
pub trait TimeSyncPort {
    fn sync_time(&mut self);
}

/// Deferred system restart, fired by the monitor 8 s after a successful
/// firmware update so the web page can receive its acknowledgement first.
pub trait RestartPort {
    fn restart(&mut self);
}
