use std::sync::Arc;

use crate::actions::Action;
use crate::domain::{Web3Options, FALLBACK_WS};
use crate::ports::{ClientFactory, ClientHandle, PortError, WalletHandle};
use crate::store::Dispatcher;

const INVALID_FALLBACK: &str = "Invalid web3 fallback provided.";
const NO_PROVIDER: &str = "Cannot find injected web3 or valid fallback.";

enum AttemptFailure {
    Retry,
    Failed(PortError),
}

/// Produces the client handle the rest of the bus works with.
///
/// Priority per attempt: injected wallet (with permission request), custom
/// provider, websocket fallback. Every outcome is reported as an action; the
/// caller only learns whether a handle was produced.
pub struct Web3Initializer {
    wallet: Option<WalletHandle>,
    factory: Arc<dyn ClientFactory>,
    dispatcher: Dispatcher,
}

impl Web3Initializer {
    pub fn new(
        wallet: Option<WalletHandle>,
        factory: Arc<dyn ClientFactory>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            wallet,
            factory,
            dispatcher,
        }
    }

    pub async fn initialize(&self, options: &Web3Options) -> Option<ClientHandle> {
        loop {
            self.dispatcher.dispatch(Action::Web3Initializing);
            match self.attempt(options).await {
                Ok(web3) => {
                    tracing::info!("web3 initialized");
                    self.dispatcher.dispatch(Action::Web3Initialized {
                        web3: Arc::clone(&web3),
                    });
                    return Some(web3);
                }
                Err(AttemptFailure::Retry) => {
                    tracing::info!("retrying wallet permission request");
                }
                Err(AttemptFailure::Failed(error)) => {
                    tracing::error!(%error, "error initializing web3");
                    self.dispatcher.dispatch(Action::Web3Failed { error });
                    return None;
                }
            }
        }
    }

    async fn attempt(&self, options: &Web3Options) -> Result<ClientHandle, AttemptFailure> {
        if let Some(wallet) = &self.wallet {
            let web3 = options
                .custom_provider
                .clone()
                .unwrap_or_else(|| self.factory.injected(Arc::clone(wallet)));
            return match wallet
                .request("eth_requestAccounts", serde_json::json!([]))
                .await
            {
                Ok(_) => Ok(web3),
                Err(error) if error.is_user_rejection() => {
                    tracing::warn!("user rejected wallet permission request");
                    self.dispatcher.dispatch(Action::Web3UserDenied);
                    if options.retry_permission_dialog {
                        Err(AttemptFailure::Retry)
                    } else {
                        Err(AttemptFailure::Failed(error))
                    }
                }
                Err(error) => {
                    if error.is_request_pending() {
                        tracing::warn!("please accept the pending wallet permission request");
                    }
                    Err(AttemptFailure::Failed(error))
                }
            };
        }

        if let Some(custom) = &options.custom_provider {
            return Ok(Arc::clone(custom));
        }

        if let Some(fallback) = &options.fallback {
            return match fallback.kind.as_str() {
                FALLBACK_WS => self
                    .factory
                    .websocket(&fallback.url)
                    .map_err(AttemptFailure::Failed),
                other => {
                    tracing::debug!(kind = other, "unsupported fallback type");
                    Err(AttemptFailure::Failed(PortError::Config(
                        INVALID_FALLBACK.to_owned(),
                    )))
                }
            };
        }

        Err(AttemptFailure::Failed(PortError::Config(
            NO_PROVIDER.to_owned(),
        )))
    }
}
