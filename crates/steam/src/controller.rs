//! Steam process detection.
//!
//! The shortcuts file must not be written while Steam is running: Steam keeps
//! its own copy in memory and rewrites the file on exit. Platform-specific
//! probes live in `controller_linux.rs` and `controller_windows.rs`.

/// Steam process probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct Controller;

impl Controller {
    pub fn new() -> Self {
        Self
    }

    /// Returns `true` if the Steam process is currently running.
    pub async fn is_running(&self) -> bool {
        let running = platform::is_running().await;
        tracing::debug!(running, "checked Steam process");
        running
    }
}

// Platform-specific implementation.
#[cfg(target_os = "linux")]
#[path = "controller_linux.rs"]
mod platform;

#[cfg(target_os = "windows")]
#[path = "controller_windows.rs"]
mod platform;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
mod platform {
    pub async fn is_running() -> bool {
        false
    }
}
