use std::sync::Arc;

use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use alloy::transports::TransportError;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use drizzle_web3_core::{ClientFactory, ClientHandle, PortError, WalletHandle, Web3Client};

use crate::eip1193::json_quantity;

/// Web3 client backed either by the wallet's own JSON-RPC channel or by a
/// remote node. Remote connections are opened on first use and shared.
#[derive(Debug)]
pub struct RpcClient {
    transport: Transport,
}

#[derive(Debug)]
enum Transport {
    Injected(WalletHandle),
    Remote {
        endpoint: Endpoint,
        provider: OnceCell<DynProvider>,
    },
}

#[derive(Debug, Clone)]
enum Endpoint {
    Ws(String),
    Http(Url),
}

impl RpcClient {
    pub fn injected(wallet: WalletHandle) -> Self {
        Self {
            transport: Transport::Injected(wallet),
        }
    }

    pub fn websocket(url: &str) -> Result<Self, PortError> {
        let parsed = parse_url(url, &["ws", "wss"])?;
        Ok(Self::remote(Endpoint::Ws(parsed.to_string())))
    }

    pub fn http(url: &str) -> Result<Self, PortError> {
        let parsed = parse_url(url, &["http", "https"])?;
        Ok(Self::remote(Endpoint::Http(parsed)))
    }

    fn remote(endpoint: Endpoint) -> Self {
        Self {
            transport: Transport::Remote {
                endpoint,
                provider: OnceCell::new(),
            },
        }
    }

    pub fn transport_kind(&self) -> &'static str {
        match &self.transport {
            Transport::Injected(_) => "injected",
            Transport::Remote {
                endpoint: Endpoint::Ws(_),
                ..
            } => "ws",
            Transport::Remote {
                endpoint: Endpoint::Http(_),
                ..
            } => "http",
        }
    }

    async fn wallet_call(wallet: &WalletHandle, method: &str) -> Result<Value, PortError> {
        wallet.request(method, json!([])).await
    }

    async fn provider(&self) -> Result<&DynProvider, PortError> {
        match &self.transport {
            Transport::Remote { endpoint, provider } => {
                provider.get_or_try_init(|| connect(endpoint.clone())).await
            }
            Transport::Injected(_) => Err(PortError::NotImplemented(
                "injected client has no remote provider",
            )),
        }
    }
}

#[async_trait]
impl Web3Client for RpcClient {
    async fn net_version(&self) -> Result<u64, PortError> {
        if let Transport::Injected(wallet) = &self.transport {
            return json_quantity(&Self::wallet_call(wallet, "net_version").await?);
        }
        self.provider()
            .await?
            .get_net_version()
            .await
            .map_err(transport_error)
    }

    async fn chain_id(&self) -> Result<u64, PortError> {
        if let Transport::Injected(wallet) = &self.transport {
            return json_quantity(&Self::wallet_call(wallet, "eth_chainId").await?);
        }
        self.provider()
            .await?
            .get_chain_id()
            .await
            .map_err(transport_error)
    }

    async fn node_info(&self) -> Result<String, PortError> {
        if let Transport::Injected(wallet) = &self.transport {
            let value = Self::wallet_call(wallet, "web3_clientVersion").await?;
            return value.as_str().map(str::to_owned).ok_or_else(|| {
                PortError::Validation("web3_clientVersion: string expected".to_owned())
            });
        }
        self.provider()
            .await?
            .get_client_version()
            .await
            .map_err(transport_error)
    }
}

async fn connect(endpoint: Endpoint) -> Result<DynProvider, PortError> {
    match endpoint {
        Endpoint::Ws(url) => {
            tracing::debug!(%url, "connecting websocket provider");
            let provider = ProviderBuilder::new()
                .connect_ws(WsConnect::new(url))
                .await
                .map_err(|e| PortError::Transport(format!("websocket connect failed: {e}")))?;
            Ok(provider.erased())
        }
        Endpoint::Http(url) => {
            tracing::debug!(%url, "using http provider");
            Ok(ProviderBuilder::new().connect_http(url).erased())
        }
    }
}

fn parse_url(raw: &str, schemes: &[&str]) -> Result<Url, PortError> {
    let url = Url::parse(raw).map_err(|e| PortError::Config(format!("invalid url {raw}: {e}")))?;
    if !schemes.contains(&url.scheme()) {
        return Err(PortError::Config(format!(
            "unsupported scheme {} for {raw}; expected one of {}",
            url.scheme(),
            schemes.join(", ")
        )));
    }
    Ok(url)
}

fn transport_error(err: TransportError) -> PortError {
    match err.as_error_resp() {
        Some(payload) => PortError::rpc(payload.code, payload.message.to_string()),
        None => PortError::Transport(err.to_string()),
    }
}

/// Builds `RpcClient`s for the initializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlloyClientFactory;

impl AlloyClientFactory {
    pub fn http(&self, url: &str) -> Result<ClientHandle, PortError> {
        Ok(Arc::new(RpcClient::http(url)?))
    }
}

impl ClientFactory for AlloyClientFactory {
    fn injected(&self, wallet: WalletHandle) -> ClientHandle {
        Arc::new(RpcClient::injected(wallet))
    }

    fn websocket(&self, url: &str) -> Result<ClientHandle, PortError> {
        Ok(Arc::new(RpcClient::websocket(url)?))
    }
}
