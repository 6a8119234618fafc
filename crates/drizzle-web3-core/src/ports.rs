use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// EIP-1193 `4001`: the user rejected the request.
pub const USER_REJECTED_REQUEST: i64 = 4001;
/// `-32002`: a permission request for this origin is already pending.
pub const REQUEST_ALREADY_PENDING: i64 = -32002;
/// EIP-1193 `4200`: the provider does not support the method.
pub const UNSUPPORTED_METHOD: i64 = 4200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("provider error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{0}")]
    Config(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

impl PortError {
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code() == Some(USER_REJECTED_REQUEST)
    }

    pub fn is_request_pending(&self) -> bool {
        self.code() == Some(REQUEST_ALREADY_PENDING)
    }
}

/// Callback receiving the raw account strings of an `accountsChanged` notification.
pub type AccountsListener = Box<dyn Fn(Vec<String>) + Send + Sync>;

pub type WalletHandle = Arc<dyn WalletProvider>;
pub type ClientHandle = Arc<dyn Web3Client>;

/// An injected EIP-1193 wallet.
#[async_trait]
pub trait WalletProvider: fmt::Debug + Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError>;

    /// Registers a persistent `accountsChanged` listener. There is no way to remove it.
    fn on_accounts_changed(&self, listener: AccountsListener) -> Result<(), PortError>;
}

/// Network queries issued through a connected client handle.
#[async_trait]
pub trait Web3Client: fmt::Debug + Send + Sync {
    async fn net_version(&self) -> Result<u64, PortError>;
    async fn chain_id(&self) -> Result<u64, PortError>;
    async fn node_info(&self) -> Result<String, PortError>;
}

pub trait ClientFactory: Send + Sync {
    /// Client bound to an injected wallet. Never performs I/O.
    fn injected(&self, wallet: WalletHandle) -> ClientHandle;

    /// Client for a websocket endpoint. Connecting is deferred to the first query.
    fn websocket(&self, url: &str) -> Result<ClientHandle, PortError>;
}
