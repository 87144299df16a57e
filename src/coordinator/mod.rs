//! Connection coordination.
//!
//! # Data Flow
//! ```text
//! connect(kind) → Connecting → adapter.connect() (bounded by the handshake timeout)
//!     success → SessionRegistry::install → EventRelay::attach → GasPriceMonitor::start → Connected
//!     failure → [stale: StaleSessionRecovery] → Disconnected + error
//!
//! adapter callback → EventRelay → mpsc → driver task → Coordinator
//!     empty accounts / provider disconnect → Disconnecting → Disconnected
//!     account or chain change → query_info → WalletInfo republished
//!     stale session → StaleSessionRecovery → Disconnected
//! ```
//!
//! # Design Decisions
//! - State lives in a `watch` channel; transitions are check-and-set via `send_if_modified`
//! - Teardown order: unsubscribe, cancel polling, release the adapter
//! - Notifications carry the session generation; older ones are dropped
//! - Every error path settles in `Connected` or `Disconnected`

#[allow(clippy::module_inception)]
pub mod coordinator;
pub mod events;
pub mod state;

pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use events::{EventRelay, SessionSignal, TaggedSignal};
pub use state::{
    ConnectionState, LifecycleEvent, WalletState, SESSION_ENDED_MESSAGE, STALE_CONNECT_MESSAGE,
};
