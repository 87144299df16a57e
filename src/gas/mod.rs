//! Gas price monitoring.
//!
//! # Data Flow
//! ```text
//! Coordinator enters Connected → GasPriceMonitor::start(adapter)
//!     → poll loop (immediate, then every interval) → adapter.fetch_gas_price()
//!     → GasPriceInfo published on a watch channel
//! Coordinator leaves Connected → GasPriceMonitor::stop() → quote reset
//! ```
//!
//! # Design Decisions
//! - Fetch failures stay local: they populate `error` and the loop continues
//! - A failed fetch keeps the last good quote; only success stamps `last_updated`
//! - Manual refreshes are debounced on the trailing edge

pub mod format;
pub mod monitor;
pub mod types;

pub use format::{format_gwei, format_timestamp, parse_gwei};
pub use monitor::GasPriceMonitor;
pub use types::GasPriceInfo;
