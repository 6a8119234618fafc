//! In-memory contract registry shared between the application and the
//! registry middleware.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::PortError;

pub type RegistryHandle = Arc<ContractRegistry>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractConfig {
    pub contract_name: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub abi: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSubscription {
    pub event_name: String,
    #[serde(default)]
    pub event_options: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContractOptions {
    pub from: Option<Address>,
}

/// Runtime side of a registration. Shared by reference; `from` is the only
/// mutable field and every assignment bumps `state_revision`.
#[derive(Debug)]
pub struct ContractHandle {
    options: RwLock<ContractOptions>,
    state_revision: AtomicU64,
}

impl ContractHandle {
    fn new(from: Option<Address>) -> Self {
        Self {
            options: RwLock::new(ContractOptions { from }),
            state_revision: AtomicU64::new(0),
        }
    }

    pub fn from(&self) -> Result<Option<Address>, PortError> {
        let g = self
            .options
            .read()
            .map_err(|e| PortError::Transport(format!("contract options lock poisoned: {e}")))?;
        Ok(g.from)
    }

    pub fn set_from(&self, from: Option<Address>) -> Result<(), PortError> {
        let mut g = self
            .options
            .write()
            .map_err(|e| PortError::Transport(format!("contract options lock poisoned: {e}")))?;
        g.from = from;
        self.state_revision.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn state_revision(&self) -> u64 {
        self.state_revision.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct ContractRegistration {
    pub config: ContractConfig,
    pub events: Vec<EventSubscription>,
    pub handle: Arc<ContractHandle>,
}

#[derive(Debug)]
pub struct ContractRegistry {
    options: Value,
    contracts: RwLock<Vec<ContractRegistration>>,
}

impl ContractRegistry {
    pub fn new(options: Value) -> Self {
        Self {
            options,
            contracts: RwLock::new(Vec::new()),
        }
    }

    pub fn options(&self) -> &Value {
        &self.options
    }

    /// Snapshot of the registrations. Handles are shared, so mutating a
    /// returned handle mutates the registry.
    pub fn contract_list(&self) -> Result<Vec<ContractRegistration>, PortError> {
        let g = self
            .contracts
            .read()
            .map_err(|e| PortError::Transport(format!("registry lock poisoned: {e}")))?;
        Ok(g.clone())
    }

    pub fn len(&self) -> Result<usize, PortError> {
        let g = self
            .contracts
            .read()
            .map_err(|e| PortError::Transport(format!("registry lock poisoned: {e}")))?;
        Ok(g.len())
    }

    pub fn is_empty(&self) -> Result<bool, PortError> {
        Ok(self.len()? == 0)
    }

    /// Registers a contract under its `contract_name`. A second registration
    /// under the same name is rejected with [`PortError::Conflict`].
    ///
    /// New registrations inherit `from` of the first existing registration.
    pub fn add_contract(
        &self,
        config: ContractConfig,
        events: Vec<EventSubscription>,
    ) -> Result<Arc<ContractHandle>, PortError> {
        let mut g = self
            .contracts
            .write()
            .map_err(|e| PortError::Transport(format!("registry lock poisoned: {e}")))?;
        if g
            .iter()
            .any(|c| c.config.contract_name == config.contract_name)
        {
            return Err(PortError::Conflict(format!(
                "contract already registered: {}",
                config.contract_name
            )));
        }
        let from = match g.first() {
            Some(first) => first.handle.from()?,
            None => None,
        };
        let handle = Arc::new(ContractHandle::new(from));
        g.push(ContractRegistration {
            config,
            events,
            handle: Arc::clone(&handle),
        });
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poisoned_registry_reports_transport_error() {
        let registry = Arc::new(ContractRegistry::new(Value::Null));
        let poisoner = Arc::clone(&registry);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.contracts.write().expect("registry lock");
            panic!("poison registry lock");
        })
        .join();

        assert!(matches!(registry.len(), Err(PortError::Transport(_))));
        assert!(matches!(registry.is_empty(), Err(PortError::Transport(_))));
        assert!(registry.contract_list().is_err());
    }

    #[test]
    fn len_counts_registrations() {
        let registry = ContractRegistry::new(Value::Null);
        assert!(registry.is_empty().expect("is_empty"));

        registry
            .add_contract(
                ContractConfig {
                    contract_name: "SimpleStorage".to_owned(),
                    address: None,
                    abi: Value::Array(Vec::new()),
                },
                Vec::new(),
            )
            .expect("add contract");

        assert_eq!(registry.len().expect("len"), 1);
    }
}
