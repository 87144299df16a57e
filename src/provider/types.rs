//! Wire-level types shared by every wallet transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// A JSON-RPC style request handed to a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Request with an empty parameter list.
    pub fn bare(method: impl Into<String>) -> Self {
        Self::new(method, Value::Array(Vec::new()))
    }
}

/// Names of the notifications a transport can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    AccountsChanged,
    ChainChanged,
    Connect,
    Disconnect,
    Error,
    DisplayUri,
    SessionUpdate,
    SessionDelete,
    SessionEvent,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::AccountsChanged => "accountsChanged",
            EventName::ChainChanged => "chainChanged",
            EventName::Connect => "connect",
            EventName::Disconnect => "disconnect",
            EventName::Error => "error",
            EventName::DisplayUri => "display_uri",
            EventName::SessionUpdate => "session_update",
            EventName::SessionDelete => "session_delete",
            EventName::SessionEvent => "session_event",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification delivered by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    /// Chain id as reported by the wallet, usually hex (`"0x1"`).
    ChainChanged(String),
    Connect { chain_id: String },
    Disconnect { code: i64, message: String },
    Error(TransportError),
    DisplayUri(String),
    SessionUpdate(Value),
    SessionDelete { topic: String },
    SessionEvent(Value),
}

impl ProviderEvent {
    pub fn name(&self) -> EventName {
        match self {
            ProviderEvent::AccountsChanged(_) => EventName::AccountsChanged,
            ProviderEvent::ChainChanged(_) => EventName::ChainChanged,
            ProviderEvent::Connect { .. } => EventName::Connect,
            ProviderEvent::Disconnect { .. } => EventName::Disconnect,
            ProviderEvent::Error(_) => EventName::Error,
            ProviderEvent::DisplayUri(_) => EventName::DisplayUri,
            ProviderEvent::SessionUpdate(_) => EventName::SessionUpdate,
            ProviderEvent::SessionDelete { .. } => EventName::SessionDelete,
            ProviderEvent::SessionEvent(_) => EventName::SessionEvent,
        }
    }
}

/// Callback registered with a transport.
pub type Listener = Arc<dyn Fn(&ProviderEvent) + Send + Sync>;

/// Handle returned by `on`, used to remove exactly that listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Error reported by a transport (EIP-1193 style code + message).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct TransportError {
    pub code: i64,
    pub message: String,
}

impl TransportError {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const DISCONNECTED: i64 = 4900;
    pub const INTERNAL: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::new(Self::USER_REJECTED, message)
    }

    pub fn unsupported(method: &str) -> Self {
        Self::new(Self::UNSUPPORTED_METHOD, format!("method {} is not supported", method))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL, message)
    }
}

impl From<crate::node::NodeError> for TransportError {
    fn from(err: crate::node::NodeError) -> Self {
        Self::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let event = ProviderEvent::AccountsChanged(vec!["0xabc".into()]);
        assert_eq!(event.name(), EventName::AccountsChanged);
        assert_eq!(EventName::SessionDelete.to_string(), "session_delete");
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::user_rejected("User rejected the request.");
        assert_eq!(err.to_string(), "User rejected the request. (code 4001)");
        assert_eq!(TransportError::unsupported("wallet_foo").code, 4200);
    }

    #[test]
    fn test_bare_request_has_empty_params() {
        let request = RpcRequest::bare("eth_gasPrice");
        assert_eq!(request.params, serde_json::json!([]));
    }
}
