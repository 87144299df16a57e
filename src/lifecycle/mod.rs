//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Env overrides → Validate → Build adapters → Build coordinator
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Disconnect wallet → Notify watcher tasks → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{build_coordinator, load_config, StartupError};
