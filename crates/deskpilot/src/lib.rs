//! Public SDK surface for deskpilot.
//!
//! This crate re-exports the control plane building blocks and
//! provides a small initialization helper to keep consumer setup
//! consistent.

/// Re-export for convenience.
pub use deskpilot_config as config;
pub use deskpilot_core as core;
/// Re-export for convenience.
pub use deskpilot_mcp as mcp;
/// Re-export for convenience.
pub use deskpilot_process as process;
/// Re-export for convenience.
pub use deskpilot_protocol as protocol;
/// Re-export for convenience.
pub use deskpilot_providers as providers;
/// Re-export for convenience.
pub use deskpilot_sandbox as sandbox;

pub use deskpilot_core::ControlPlane;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
