//! External wallet capabilities.
//!
//! # Data Flow
//! ```text
//! wallet (browser extension / remote wallet / local node)
//!     → Eip1193Provider or RelayTransport (request + event surface)
//!     → adapter (normalizes into WalletInfo and change callbacks)
//! ```
//!
//! # Design Decisions
//! - Transports are opaque trait objects; the adapters never see SDK types
//! - Events are pushed through `on`/`remove_listener` with explicit ids
//! - A transport may expose a direct node connection for reads (`node_rpc`)

pub mod emitter;
pub mod local;
pub mod relay;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

pub use emitter::EventEmitter;
pub use local::LocalNodeProvider;
pub use relay::{RelayInitOptions, RelayMetadata, RelaySession, RelayTransport, RelayTransportFactory};
pub use types::{EventName, Listener, ListenerId, ProviderEvent, RpcRequest, TransportError};

/// Anything that answers JSON-RPC requests.
#[async_trait]
pub trait JsonRpcProvider: Send + Sync {
    async fn request(&self, request: RpcRequest) -> Result<Value, TransportError>;
}

/// Anything that pushes notifications to registered listeners.
pub trait EventSource: Send + Sync {
    fn on(&self, event: EventName, listener: Listener) -> ListenerId;

    fn remove_listener(&self, event: EventName, id: ListenerId);
}

/// Locally injected wallet provider (EIP-1193 surface).
pub trait Eip1193Provider: JsonRpcProvider + EventSource {
    /// Direct node connection, preferred for read-only queries.
    fn node_rpc(&self) -> Option<crate::node::NodeClient> {
        None
    }
}
