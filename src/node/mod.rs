//! Node integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private keys, RPC URL)
//!     → accounts.rs (key loading, message signing)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → provider::local (answers injected-provider requests)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod accounts;
pub mod client;
pub mod types;

pub use accounts::LocalAccounts;
pub use client::NodeClient;
pub use types::{NodeConfig, NodeError, NodeResult};
