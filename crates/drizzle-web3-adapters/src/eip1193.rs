use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::MissedTickBehavior;

use drizzle_web3_core::{AccountsListener, PortError, WalletProvider, UNSUPPORTED_METHOD};

type SharedListener = Arc<dyn Fn(Vec<String>) + Send + Sync>;

/// EIP-1193 wallet reachable from a native process.
///
/// `Deterministic` answers from in-memory state and is what tests and local
/// runs use. `Proxy` forwards every request to a JSON-RPC wallet bridge and
/// polls `eth_accounts` to synthesize `accountsChanged` notifications.
#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Deterministic,
    Proxy(ProxyRuntime),
}

#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
    poll_interval: Duration,
}

struct ProviderState {
    accounts: Vec<String>,
    chain_id: u64,
    network_id: u64,
    client_version: String,
    permission_outcomes: VecDeque<PortError>,
    requests: Vec<String>,
    listeners: Vec<SharedListener>,
    poller_started: bool,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            accounts: vec!["0x1000000000000000000000000000000000000001".to_owned()],
            chain_id: 1,
            network_id: 1,
            client_version: "drizzle-web3/deterministic".to_owned(),
            permission_outcomes: VecDeque::new(),
            requests: Vec::new(),
            listeners: Vec::new(),
            poller_started: false,
        }
    }
}

impl fmt::Debug for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderState")
            .field("accounts", &self.accounts)
            .field("chain_id", &self.chain_id)
            .field("network_id", &self.network_id)
            .field("client_version", &self.client_version)
            .field("pending_outcomes", &self.permission_outcomes.len())
            .field("requests", &self.requests.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Eip1193Adapter {
    pub fn deterministic() -> Self {
        Self {
            mode: ProviderMode::Deterministic,
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    pub fn proxy(
        base_url: impl Into<String>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Config(format!("failed to build eip1193 proxy client: {e}")))?;
        Ok(Self {
            mode: ProviderMode::Proxy(ProxyRuntime {
                base_url: base_url.into(),
                client,
                poll_interval,
            }),
            state: Arc::new(Mutex::new(ProviderState::default())),
        })
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.mode, ProviderMode::Proxy(_))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    /// Queues a failure for the next `eth_requestAccounts`. Outcomes are
    /// consumed in order; once exhausted the request is granted.
    pub fn debug_script_permission(&self, outcome: PortError) -> Result<(), PortError> {
        self.lock()?.permission_outcomes.push_back(outcome);
        Ok(())
    }

    pub fn debug_inject_accounts_changed(&self, accounts: Vec<String>) -> Result<(), PortError> {
        let listeners = {
            let mut g = self.lock()?;
            g.accounts = accounts.clone();
            g.listeners.clone()
        };
        for listener in listeners {
            listener(accounts.clone());
        }
        Ok(())
    }

    pub fn debug_inject_chain_changed(&self, chain_id: u64) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.chain_id = chain_id;
        g.network_id = chain_id;
        Ok(())
    }

    /// Methods requested so far, oldest first.
    pub fn requests(&self) -> Result<Vec<String>, PortError> {
        Ok(self.lock()?.requests.clone())
    }

    pub fn listener_count(&self) -> Result<usize, PortError> {
        Ok(self.lock()?.listeners.len())
    }

    fn deterministic_request(&self, method: &str) -> Result<Value, PortError> {
        let mut g = self.lock()?;
        match method {
            "eth_requestAccounts" => match g.permission_outcomes.pop_front() {
                Some(error) => Err(error),
                None => Ok(json!(g.accounts)),
            },
            "eth_accounts" => Ok(json!(g.accounts)),
            "eth_chainId" => Ok(Value::String(format!("{:#x}", g.chain_id))),
            "net_version" => Ok(Value::String(g.network_id.to_string())),
            "web3_clientVersion" => Ok(Value::String(g.client_version.clone())),
            other => Err(PortError::rpc(
                UNSUPPORTED_METHOD,
                format!("The provider does not support the requested method: {other}"),
            )),
        }
    }

    fn spawn_accounts_poller(&self, proxy: ProxyRuntime) -> Result<(), PortError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            PortError::Transport(format!("accounts poller requires a tokio runtime: {e}"))
        })?;
        let state = Arc::clone(&self.state);
        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(proxy.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let accounts = match proxy
                    .call("eth_accounts", json!([]))
                    .await
                    .and_then(|value| parse_accounts(&value))
                {
                    Ok(accounts) => accounts,
                    Err(error) => {
                        tracing::debug!(%error, "eth_accounts poll failed");
                        continue;
                    }
                };
                let listeners = {
                    let Ok(mut g) = state.lock() else {
                        tracing::warn!("provider lock poisoned; stopping accounts poller");
                        break;
                    };
                    if g.accounts == accounts {
                        continue;
                    }
                    g.accounts = accounts.clone();
                    g.listeners.clone()
                };
                tracing::debug!(count = accounts.len(), "wallet accounts changed");
                for listener in listeners {
                    listener(accounts.clone());
                }
            }
        });
        Ok(())
    }
}

impl ProxyRuntime {
    async fn call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy json decode failed: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(rpc_error(err));
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "eip1193 proxy status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("eip1193 proxy missing result".to_owned()))
    }
}

#[async_trait]
impl WalletProvider for Eip1193Adapter {
    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        self.lock()?.requests.push(method.to_owned());
        match &self.mode {
            ProviderMode::Deterministic => self.deterministic_request(method),
            ProviderMode::Proxy(proxy) => {
                let result = proxy.call(method, params).await?;
                if method == "eth_requestAccounts" {
                    let accounts = parse_accounts(&result)?;
                    self.lock()?.accounts = accounts;
                }
                Ok(result)
            }
        }
    }

    fn on_accounts_changed(&self, listener: AccountsListener) -> Result<(), PortError> {
        let start_poller = {
            let mut g = self.lock()?;
            g.listeners.push(Arc::from(listener));
            self.is_proxy() && !std::mem::replace(&mut g.poller_started, true)
        };
        if let (true, ProviderMode::Proxy(proxy)) = (start_poller, &self.mode) {
            self.spawn_accounts_poller(proxy.clone())?;
        }
        Ok(())
    }
}

fn rpc_error(err: &Value) -> PortError {
    match err.get("code").and_then(Value::as_i64) {
        Some(code) => PortError::rpc(
            code,
            err.get("message")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        ),
        None => PortError::Transport(format!("eip1193 proxy returned error: {err}")),
    }
}

fn parse_accounts(value: &Value) -> Result<Vec<String>, PortError> {
    let arr = value
        .as_array()
        .ok_or_else(|| PortError::Transport("accounts: array expected".to_owned()))?;
    arr.iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| PortError::Transport("accounts: string expected".to_owned()))
        })
        .collect()
}

/// Reads a JSON-RPC quantity that wallets return either as a number, a
/// decimal string (`net_version`) or a hex string (`eth_chainId`).
pub(crate) fn json_quantity(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation("quantity must be string or number".to_owned()))?;
    parse_quantity_str(s)
}

fn parse_quantity_str(raw: &str) -> Result<u64, PortError> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16)
            .map_err(|e| PortError::Validation(format!("invalid hex quantity {raw}: {e}"))),
        None => raw
            .parse()
            .map_err(|e| PortError::Validation(format!("invalid quantity {raw}: {e}"))),
    }
}
