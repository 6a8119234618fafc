use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::accounts::AccountsMiddleware;
use crate::actions::Action;
use crate::domain::Web3Options;
use crate::drizzle::DrizzleMiddleware;
use crate::network::Web3Saga;
use crate::ports::{ClientFactory, ClientHandle, WalletHandle};
use crate::store::{Dispatcher, Store, DEFAULT_BUS_CAPACITY};
use crate::web3::Web3Initializer;

/// Store, middleware chain and sagas wired together.
pub struct DrizzleRuntime {
    store: Store,
    initializer: Web3Initializer,
    sagas: Vec<JoinHandle<()>>,
}

impl DrizzleRuntime {
    pub fn new(wallet: Option<WalletHandle>, factory: Arc<dyn ClientFactory>) -> Self {
        let store = Store::new(DEFAULT_BUS_CAPACITY)
            .with_middleware(AccountsMiddleware::new(wallet.clone()))
            .with_middleware(DrizzleMiddleware::new());
        let initializer = Web3Initializer::new(wallet, factory, store.dispatcher());
        Self {
            store,
            initializer,
            sagas: Vec::new(),
        }
    }

    /// Starts the network watcher. Must be called inside a tokio runtime.
    pub fn start_sagas(&mut self) {
        if !self.sagas.is_empty() {
            return;
        }
        let saga = Web3Saga::new(self.store.dispatcher());
        let actions = self.store.watch();
        self.sagas.push(saga.spawn(actions));
    }

    /// Runs the initializer while the store keeps processing, so
    /// `WEB3_INITIALIZING` and unrelated actions are delivered while the
    /// wallet's permission request is pending.
    pub async fn initialize(&mut self, options: &Web3Options) -> Option<ClientHandle> {
        let initializing = self.initializer.initialize(options);
        tokio::pin!(initializing);
        let web3 = loop {
            tokio::select! {
                biased;
                web3 = &mut initializing => break web3,
                _ = self.store.process_next() => {}
            }
        };
        self.store.pump();
        web3
    }

    pub fn dispatch(&mut self, action: Action) -> usize {
        self.store.dispatch(action)
    }

    pub fn pump(&mut self) -> usize {
        self.store.pump()
    }

    pub async fn process_next(&mut self) -> usize {
        self.store.process_next().await
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.store.dispatcher()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Action> {
        self.store.subscribe()
    }
}

impl Drop for DrizzleRuntime {
    fn drop(&mut self) {
        for saga in &self.sagas {
            saga.abort();
        }
    }
}
