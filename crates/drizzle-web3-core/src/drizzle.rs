use std::sync::Arc;

use crate::actions::Action;
use crate::domain::AccountList;
use crate::ports::PortError;
use crate::registry::{ContractRegistry, RegistryHandle};
use crate::store::{Dispatcher, Middleware, MiddlewareOutcome};

/// Keeps the contract registry aligned with the active account and turns
/// rejected registrations into `ERROR_ADD_CONTRACT`.
#[derive(Debug, Default)]
pub struct DrizzleMiddleware {
    registry: Option<RegistryHandle>,
}

impl DrizzleMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> Option<&RegistryHandle> {
        self.registry.as_ref()
    }

    fn add_contract(registry: &ContractRegistry, action: &Action) -> MiddlewareOutcome {
        let Action::AddContract {
            contract_config,
            events,
        } = action
        else {
            return MiddlewareOutcome::next();
        };

        match registry.add_contract(contract_config.clone(), events.clone()) {
            Ok(_) => MiddlewareOutcome::next(),
            Err(error) => {
                tracing::error!(
                    %error,
                    contract = %contract_config.contract_name,
                    "attempt to add a duplicate contract"
                );
                MiddlewareOutcome::suppress().emit(Action::ErrorAddContract {
                    error,
                    attempted_action: Box::new(action.clone()),
                })
            }
        }
    }
}

/// Assigns the active account to every registration's `from` when it differs
/// from the first registration's. Returns how many registrations were touched.
pub fn sync_active_account(
    registry: &ContractRegistry,
    accounts: &AccountList,
) -> Result<usize, PortError> {
    let contracts = registry.contract_list()?;
    let Some(first) = contracts.first() else {
        return Ok(0);
    };

    let new_account = accounts.active();
    if first.handle.from()? == new_account {
        return Ok(0);
    }

    for contract in &contracts {
        contract.handle.set_from(new_account)?;
    }
    Ok(contracts.len())
}

impl Middleware for DrizzleMiddleware {
    fn name(&self) -> &'static str {
        "drizzle"
    }

    fn handle(&mut self, action: &Action, _dispatcher: &Dispatcher) -> MiddlewareOutcome {
        match action {
            Action::DrizzleInitializing { drizzle, .. } => {
                self.registry = Some(Arc::clone(drizzle));
                MiddlewareOutcome::next()
            }
            Action::NetworkIdChanged { network_id } => match &self.registry {
                Some(registry) => {
                    tracing::info!(network_id, "network changed, re-initializing registry");
                    MiddlewareOutcome::next().emit(Action::DrizzleInitializing {
                        drizzle: Arc::clone(registry),
                        options: registry.options().clone(),
                    })
                }
                None => MiddlewareOutcome::next(),
            },
            Action::AccountsFetched { accounts } => {
                if let Some(registry) = &self.registry {
                    match sync_active_account(registry, accounts) {
                        Ok(0) => {}
                        Ok(updated) => {
                            tracing::debug!(updated, "contract `from` fields updated");
                        }
                        Err(error) => {
                            tracing::error!(%error, "failed to update contract `from` fields");
                        }
                    }
                }
                MiddlewareOutcome::next()
            }
            Action::AddContract { .. } => match &self.registry {
                Some(registry) => Self::add_contract(registry, action),
                None => MiddlewareOutcome::next(),
            },
            _ => MiddlewareOutcome::next(),
        }
    }
}
