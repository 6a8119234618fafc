#![allow(dead_code)]

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, Notify};

use drizzle_web3_core::{
    AccountsListener, Action, ActionType, ClientFactory, ClientHandle, NetworkInfo, PortError,
    WalletHandle, WalletProvider, Web3Client,
};

pub const ACCOUNT_A_LOWER: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
pub const ACCOUNT_A: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const ACCOUNT_B_LOWER: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
pub const ACCOUNT_B: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

#[derive(Default)]
struct MockWalletState {
    permission: VecDeque<Result<Value, PortError>>,
    requests: Vec<String>,
    listeners: Vec<AccountsListener>,
}

#[derive(Default)]
pub struct MockWallet {
    inner: Mutex<MockWalletState>,
}

impl fmt::Debug for MockWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockWallet").finish_non_exhaustive()
    }
}

impl MockWallet {
    /// Permission outcomes consumed in order; once empty, requests succeed.
    pub fn scripted(outcomes: Vec<Result<Value, PortError>>) -> Arc<Self> {
        let wallet = Self::default();
        wallet.inner.lock().expect("wallet lock").permission = outcomes.into();
        Arc::new(wallet)
    }

    pub fn handle(self: &Arc<Self>) -> WalletHandle {
        Arc::clone(self) as WalletHandle
    }

    pub fn requests(&self) -> Vec<String> {
        self.inner.lock().expect("wallet lock").requests.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().expect("wallet lock").listeners.len()
    }

    pub fn emit_accounts(&self, accounts: &[&str]) {
        let g = self.inner.lock().expect("wallet lock");
        for listener in &g.listeners {
            listener(accounts.iter().map(|a| (*a).to_owned()).collect());
        }
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request(&self, method: &str, _params: Value) -> Result<Value, PortError> {
        let mut g = self.inner.lock().expect("wallet lock");
        g.requests.push(method.to_owned());
        match method {
            "eth_requestAccounts" => g
                .permission
                .pop_front()
                .unwrap_or_else(|| Ok(serde_json::json!([ACCOUNT_A_LOWER]))),
            _ => Err(PortError::rpc(4200, format!("unsupported: {method}"))),
        }
    }

    fn on_accounts_changed(&self, listener: AccountsListener) -> Result<(), PortError> {
        self.inner
            .lock()
            .expect("wallet lock")
            .listeners
            .push(listener);
        Ok(())
    }
}

/// Wallet whose permission request stays pending until [`GatedWallet::release`].
#[derive(Debug, Default)]
pub struct GatedWallet {
    gate: Notify,
}

impl GatedWallet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn handle(self: &Arc<Self>) -> WalletHandle {
        Arc::clone(self) as WalletHandle
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl WalletProvider for GatedWallet {
    async fn request(&self, method: &str, _params: Value) -> Result<Value, PortError> {
        match method {
            "eth_requestAccounts" => {
                self.gate.notified().await;
                Ok(serde_json::json!([ACCOUNT_A_LOWER]))
            }
            _ => Err(PortError::rpc(4200, format!("unsupported: {method}"))),
        }
    }

    fn on_accounts_changed(&self, _listener: AccountsListener) -> Result<(), PortError> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockClient {
    pub info: NetworkInfo,
    gate: Option<Arc<Notify>>,
    fail_chain_id: bool,
}

impl MockClient {
    pub fn new(network_id: u64, node_info: &str) -> Self {
        Self {
            info: NetworkInfo {
                network_id,
                chain_id: network_id,
                node_info: node_info.to_owned(),
            },
            gate: None,
            fail_chain_id: false,
        }
    }

    /// `net_version` blocks until the returned gate is notified.
    pub fn gated(network_id: u64, node_info: &str) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mut client = Self::new(network_id, node_info);
        client.gate = Some(Arc::clone(&gate));
        (client, gate)
    }

    pub fn failing_chain_id(mut self) -> Self {
        self.fail_chain_id = true;
        self
    }

    pub fn handle(self) -> ClientHandle {
        Arc::new(self)
    }
}

#[async_trait]
impl Web3Client for MockClient {
    async fn net_version(&self) -> Result<u64, PortError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.info.network_id)
    }

    async fn chain_id(&self) -> Result<u64, PortError> {
        if self.fail_chain_id {
            return Err(PortError::Transport("eth_chainId unavailable".to_owned()));
        }
        Ok(self.info.chain_id)
    }

    async fn node_info(&self) -> Result<String, PortError> {
        Ok(self.info.node_info.clone())
    }
}

#[derive(Debug, Default)]
pub struct MockFactory {
    pub injected_calls: AtomicUsize,
    pub websocket_calls: AtomicUsize,
}

impl MockFactory {
    pub fn injected_calls(&self) -> usize {
        self.injected_calls.load(Ordering::SeqCst)
    }

    pub fn websocket_calls(&self) -> usize {
        self.websocket_calls.load(Ordering::SeqCst)
    }
}

impl ClientFactory for MockFactory {
    fn injected(&self, _wallet: WalletHandle) -> ClientHandle {
        self.injected_calls.fetch_add(1, Ordering::SeqCst);
        MockClient::new(1, "injected/v1").handle()
    }

    fn websocket(&self, url: &str) -> Result<ClientHandle, PortError> {
        self.websocket_calls.fetch_add(1, Ordering::SeqCst);
        Ok(MockClient::new(1337, url).handle())
    }
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<Action>) -> Vec<Action> {
    let mut out = Vec::new();
    while let Ok(action) = rx.try_recv() {
        out.push(action);
    }
    out
}

pub fn delivered(rx: &mut broadcast::Receiver<Action>) -> Vec<Action> {
    let mut out = Vec::new();
    while let Ok(action) = rx.try_recv() {
        out.push(action);
    }
    out
}

pub fn types(actions: &[Action]) -> Vec<ActionType> {
    actions.iter().map(Action::action_type).collect()
}
