use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::actions::Action;
use crate::domain::NetworkInfo;
use crate::ports::{ClientHandle, PortError, Web3Client};
use crate::store::Dispatcher;

/// Fetches network id, chain id and node info with latest-wins semantics.
///
/// Every request takes a ticket when it is issued. A result is published only
/// if its ticket is still the newest one when the queries finish; superseded
/// queries run to completion and their result is dropped.
#[derive(Debug, Clone)]
pub struct NetworkFetcher {
    dispatcher: Dispatcher,
    latest: Arc<AtomicU64>,
}

impl NetworkFetcher {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The ticket is taken here, before the returned future is first polled.
    pub fn fetch(
        &self,
        web3: ClientHandle,
    ) -> impl Future<Output = Option<NetworkInfo>> + Send + 'static {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let this = self.clone();
        async move { this.complete(ticket, web3).await }
    }

    async fn complete(&self, ticket: u64, web3: ClientHandle) -> Option<NetworkInfo> {
        let result = query_network_info(web3.as_ref()).await;

        let latest = self.latest.load(Ordering::SeqCst);
        if latest != ticket {
            tracing::debug!(ticket, latest, "discarding superseded network fetch");
            return None;
        }

        match result {
            Ok(network_info) => {
                self.dispatcher.dispatch(Action::Web3NetworkFetched {
                    network_info: network_info.clone(),
                });
                Some(network_info)
            }
            Err(error) => {
                tracing::error!(%error, "error fetching network information");
                self.dispatcher.dispatch(Action::Web3NetworkFailed { error });
                None
            }
        }
    }
}

async fn query_network_info(web3: &dyn Web3Client) -> Result<NetworkInfo, PortError> {
    let network_id = web3.net_version().await?;
    let chain_id = web3.chain_id().await?;
    let node_info = web3.node_info().await?;
    Ok(NetworkInfo {
        network_id,
        chain_id,
        node_info,
    })
}

/// Watches the bus for `WEB3_NETWORK_FETCHING` and starts a fetch for each.
#[derive(Debug, Clone)]
pub struct Web3Saga {
    fetcher: NetworkFetcher,
}

impl Web3Saga {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            fetcher: NetworkFetcher::new(dispatcher),
        }
    }

    /// Runs until the store feeding `actions` is dropped. Pass a receiver
    /// from [`Store::watch`](crate::Store::watch) so no request is skipped.
    pub fn spawn(self, mut actions: mpsc::UnboundedReceiver<Action>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(action) = actions.recv().await {
                if let Action::Web3NetworkFetching { web3 } = action {
                    tokio::spawn(self.fetcher.fetch(web3));
                }
            }
            tracing::debug!("action bus closed, web3 saga stopping");
        })
    }
}
