use crate::actions::Action;
use crate::domain::AccountList;
use crate::ports::{AccountsListener, WalletHandle};
use crate::store::{Dispatcher, Middleware, MiddlewareOutcome};

/// Subscribes to the wallet's `accountsChanged` notifications once a client
/// handle exists and republishes them as `ACCOUNTS_FETCHED`.
///
/// This is the only place addresses are checksummed.
#[derive(Debug)]
pub struct AccountsMiddleware {
    wallet: Option<WalletHandle>,
    warned: bool,
}

impl AccountsMiddleware {
    pub fn new(wallet: Option<WalletHandle>) -> Self {
        Self {
            wallet,
            warned: false,
        }
    }

    fn subscribe(&self, wallet: &WalletHandle, dispatcher: &Dispatcher) {
        let dispatcher = dispatcher.clone();
        let listener: AccountsListener =
            Box::new(
                move |raw: Vec<String>| match AccountList::canonicalize(&raw) {
                    Ok(accounts) => {
                        dispatcher.dispatch(Action::AccountsFetched { accounts });
                    }
                    Err(error) => {
                        tracing::warn!(%error, "dropping accountsChanged notification");
                    }
                },
            );
        if let Err(error) = wallet.on_accounts_changed(listener) {
            tracing::warn!(%error, "failed to subscribe to account changes");
        }
    }
}

impl Middleware for AccountsMiddleware {
    fn name(&self) -> &'static str {
        "accounts"
    }

    fn handle(&mut self, action: &Action, dispatcher: &Dispatcher) -> MiddlewareOutcome {
        if !matches!(action, Action::Web3Initialized { .. }) {
            return MiddlewareOutcome::next();
        }

        let Some(wallet) = &self.wallet else {
            if !self.warned {
                tracing::warn!("no wallet detected, not subscribed to account changes");
                self.warned = true;
            }
            return MiddlewareOutcome::next();
        };

        self.subscribe(wallet, dispatcher);
        MiddlewareOutcome::next().emit(Action::AccountsListening)
    }
}
