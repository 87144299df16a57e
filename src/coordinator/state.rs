//! Coordinator state and lifecycle events.

use serde::Serialize;
use uuid::Uuid;

use crate::adapter::{ProviderKind, WalletError, WalletInfo};
use crate::session::RecoveryReport;

/// Shown after a handshake failed on a stale relay session.
pub const STALE_CONNECT_MESSAGE: &str = "Connection failed due to stale session. Please try connecting again.";

/// Shown after the relay dropped a session that was connected.
pub const SESSION_ENDED_MESSAGE: &str = "Session has been disconnected. Please reconnect your wallet.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl ConnectionState {
    /// Numeric code used for the state gauge.
    pub fn code(&self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Disconnecting => 3,
        }
    }

    /// A connect or disconnect is in progress.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Disconnecting)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnecting => "disconnecting",
        };
        f.write_str(s)
    }
}

/// Everything the presentation layer renders, except the gas quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletState {
    pub connection: ConnectionState,
    pub wallet: WalletInfo,
    /// User-facing message; dismissed with `clear_error`.
    pub error: Option<String>,
}

impl WalletState {
    pub fn is_connecting(&self) -> bool {
        self.connection == ConnectionState::Connecting
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Drop to `Disconnected` with an empty wallet.
    pub(crate) fn reset(&mut self, error: Option<String>) {
        self.connection = ConnectionState::Disconnected;
        self.wallet = WalletInfo::default();
        self.error = error;
    }
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            wallet: WalletInfo::default(),
            error: None,
        }
    }
}

/// Broadcast to observers of the coordinator.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    Connecting { kind: ProviderKind, attempt: Uuid },
    Connected { kind: ProviderKind, info: WalletInfo },
    ConnectFailed { kind: ProviderKind, error: WalletError },
    WalletUpdated(WalletInfo),
    Disconnected { kind: Option<ProviderKind>, reason: String },
    RecoveryCompleted(RecoveryReport),
}
