use alloy::primitives::Address;
use serde::{Deserialize, Serialize, Serializer};

use crate::ports::{ClientHandle, PortError};

pub const FALLBACK_WS: &str = "ws";

/// Accounts as reported by the wallet, in wallet order. The first entry is the
/// active account.
///
/// The only constructor is [`AccountList::canonicalize`], so every list that
/// reaches the bus has been through checksum normalization exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountList(Vec<Address>);

impl AccountList {
    pub fn canonicalize<S: AsRef<str>>(raw: &[S]) -> Result<Self, PortError> {
        let mut accounts = Vec::with_capacity(raw.len());
        for item in raw {
            let item = item.as_ref().trim();
            let parsed: Address = item
                .parse()
                .map_err(|e| PortError::Validation(format!("invalid account {item}: {e}")))?;
            accounts.push(parsed);
        }
        Ok(Self(accounts))
    }

    pub fn active(&self) -> Option<Address> {
        self.0.first().copied()
    }

    pub fn as_slice(&self) -> &[Address] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// EIP-55 rendering of every account.
    pub fn to_checksummed(&self) -> Vec<String> {
        self.0.iter().map(|a| a.to_checksum(None)).collect()
    }
}

impl Serialize for AccountList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_checksummed().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub network_id: u64,
    pub chain_id: u64,
    pub node_info: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

impl FallbackConfig {
    pub fn websocket(url: impl Into<String>) -> Self {
        Self {
            kind: FALLBACK_WS.to_owned(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Web3Options {
    #[serde(skip)]
    pub custom_provider: Option<ClientHandle>,
    #[serde(default)]
    pub fallback: Option<FallbackConfig>,
    #[serde(default)]
    pub retry_permission_dialog: bool,
}
