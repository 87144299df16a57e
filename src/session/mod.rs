//! Session ownership and recovery.

pub mod recovery;
pub mod registry;

pub use recovery::{RecoveryReport, StaleSessionRecovery};
pub use registry::{SessionEntry, SessionRegistry};
