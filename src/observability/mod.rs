//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! coordinator, adapters, gas monitor, recovery
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (when enabled)
//! ```
//!
//! # Design Decisions
//! - Structured fields over interpolated messages
//! - Connect attempts carry a UUID so interleaved logs stay attributable
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
