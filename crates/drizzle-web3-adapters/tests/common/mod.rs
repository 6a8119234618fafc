#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};
use tokio::sync::broadcast;

use drizzle_web3_core::{Action, ActionType};

pub const ACCOUNT_A_LOWER: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
pub const ACCOUNT_A: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const ACCOUNT_B_LOWER: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
pub const ACCOUNT_B: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

/// What the mock wallet bridge answers with.
#[derive(Debug, Default)]
pub struct BridgeState {
    pub accounts: Vec<String>,
    pub reject_next_permission: bool,
    pub chain_id: u64,
    pub calls: Vec<String>,
}

impl BridgeState {
    pub fn with_accounts(accounts: &[&str]) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            accounts: accounts.iter().map(|a| (*a).to_owned()).collect(),
            chain_id: 11_155_111,
            ..Self::default()
        }))
    }
}

/// Serves JSON-RPC on a loopback port until it sees no request for a few
/// seconds.
pub fn spawn_wallet_bridge(state: Arc<Mutex<BridgeState>>) -> (String, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());

    let join = thread::spawn(move || {
        while let Ok(Some(mut req)) = server.recv_timeout(Duration::from_secs(3)) {
            let mut body = String::new();
            if req.as_reader().read_to_string(&mut body).is_err() {
                continue;
            }
            let request: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            let method = request["method"].as_str().unwrap_or_default().to_owned();
            let id = request["id"].clone();

            let payload = {
                let Ok(mut g) = state.lock() else { break };
                g.calls.push(method.clone());
                match method.as_str() {
                    "eth_requestAccounts" if g.reject_next_permission => {
                        g.reject_next_permission = false;
                        json!({
                            "jsonrpc": "2.0",
                            "id": id,
                            "error": { "code": 4001, "message": "User rejected the request." }
                        })
                    }
                    "eth_requestAccounts" | "eth_accounts" => {
                        json!({ "jsonrpc": "2.0", "id": id, "result": g.accounts })
                    }
                    "eth_chainId" => json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "result": format!("{:#x}", g.chain_id)
                    }),
                    "net_version" => json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "result": g.chain_id.to_string()
                    }),
                    "web3_clientVersion" => {
                        json!({ "jsonrpc": "2.0", "id": id, "result": "bridge/v0.1" })
                    }
                    _ => json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": { "code": 4200, "message": "unsupported" }
                    }),
                }
            };
            let response = Response::from_string(payload.to_string()).with_status_code(StatusCode(200));
            let _ = req.respond(response);
        }
    });

    (addr, join)
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
