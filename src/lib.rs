//! Wallet connection coordinator.
//!
//! Unifies an injected provider and a pairing relay behind one adapter
//! trait, drives the connect/disconnect state machine, relays wallet
//! notifications, recovers stale relay sessions and polls gas prices while
//! a session is active.

pub mod adapter;
pub mod config;
pub mod coordinator;
pub mod gas;
pub mod lifecycle;
pub mod node;
pub mod observability;
pub mod provider;
pub mod session;
pub mod storage;

pub use adapter::{ProviderKind, WalletAdapter, WalletError, WalletInfo, WalletResult};
pub use config::WalletConfig;
pub use coordinator::{ConnectionState, Coordinator, CoordinatorBuilder, LifecycleEvent, WalletState};
pub use gas::GasPriceInfo;
pub use lifecycle::Shutdown;
