use std::fmt;

use serde_json::{json, Value};

use crate::domain::{AccountList, NetworkInfo};
use crate::ports::{ClientHandle, PortError};
use crate::registry::{ContractConfig, EventSubscription, RegistryHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    Web3Initializing,
    Web3Initialized,
    Web3UserDenied,
    Web3Failed,
    Web3NetworkFetching,
    Web3NetworkFetched,
    Web3NetworkFailed,
    NetworkIdChanged,
    AccountsFetched,
    AccountsListening,
    DrizzleInitializing,
    AddContract,
    ErrorAddContract,
}

impl ActionType {
    pub const ALL: [ActionType; 13] = [
        ActionType::Web3Initializing,
        ActionType::Web3Initialized,
        ActionType::Web3UserDenied,
        ActionType::Web3Failed,
        ActionType::Web3NetworkFetching,
        ActionType::Web3NetworkFetched,
        ActionType::Web3NetworkFailed,
        ActionType::NetworkIdChanged,
        ActionType::AccountsFetched,
        ActionType::AccountsListening,
        ActionType::DrizzleInitializing,
        ActionType::AddContract,
        ActionType::ErrorAddContract,
    ];

    /// Wire name of the action `type`.
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionType::Web3Initializing => "WEB3_INITIALIZING",
            ActionType::Web3Initialized => "WEB3_INITIALIZED",
            ActionType::Web3UserDenied => "WEB3_USER_DENIED",
            ActionType::Web3Failed => "WEB3_FAILED",
            ActionType::Web3NetworkFetching => "WEB3_NETWORK_FETCHING",
            ActionType::Web3NetworkFetched => "WEB3_NETWORK_FETCHED",
            ActionType::Web3NetworkFailed => "WEB3_NETWORK_FAILED",
            ActionType::NetworkIdChanged => "NETWORK_ID_CHANGED",
            ActionType::AccountsFetched => "ACCOUNTS_FETCHED",
            ActionType::AccountsListening => "ACCOUNTS_LISTENING",
            ActionType::DrizzleInitializing => "DRIZZLE_INITIALIZING",
            ActionType::AddContract => "ADD_CONTRACT",
            ActionType::ErrorAddContract => "ERROR_ADD_CONTRACT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    Web3Initializing,
    Web3Initialized {
        web3: ClientHandle,
    },
    Web3UserDenied,
    Web3Failed {
        error: PortError,
    },
    Web3NetworkFetching {
        web3: ClientHandle,
    },
    Web3NetworkFetched {
        network_info: NetworkInfo,
    },
    Web3NetworkFailed {
        error: PortError,
    },
    NetworkIdChanged {
        network_id: u64,
    },
    AccountsFetched {
        accounts: AccountList,
    },
    AccountsListening,
    DrizzleInitializing {
        drizzle: RegistryHandle,
        options: Value,
    },
    AddContract {
        contract_config: ContractConfig,
        events: Vec<EventSubscription>,
    },
    ErrorAddContract {
        error: PortError,
        attempted_action: Box<Action>,
    },
}

impl Action {
    pub fn action_type(&self) -> ActionType {
        match self {
            Action::Web3Initializing => ActionType::Web3Initializing,
            Action::Web3Initialized { .. } => ActionType::Web3Initialized,
            Action::Web3UserDenied => ActionType::Web3UserDenied,
            Action::Web3Failed { .. } => ActionType::Web3Failed,
            Action::Web3NetworkFetching { .. } => ActionType::Web3NetworkFetching,
            Action::Web3NetworkFetched { .. } => ActionType::Web3NetworkFetched,
            Action::Web3NetworkFailed { .. } => ActionType::Web3NetworkFailed,
            Action::NetworkIdChanged { .. } => ActionType::NetworkIdChanged,
            Action::AccountsFetched { .. } => ActionType::AccountsFetched,
            Action::AccountsListening => ActionType::AccountsListening,
            Action::DrizzleInitializing { .. } => ActionType::DrizzleInitializing,
            Action::AddContract { .. } => ActionType::AddContract,
            Action::ErrorAddContract { .. } => ActionType::ErrorAddContract,
        }
    }

    /// JSON shape of the action as a store would see it. Client and registry
    /// handles are opaque and render as placeholders.
    pub fn to_json(&self) -> Value {
        let ty = self.action_type().as_str();
        match self {
            Action::Web3Initializing | Action::Web3UserDenied | Action::AccountsListening => {
                json!({ "type": ty })
            }
            Action::Web3Initialized { .. } | Action::Web3NetworkFetching { .. } => {
                json!({ "type": ty, "web3": "[client]" })
            }
            Action::Web3Failed { error } | Action::Web3NetworkFailed { error } => {
                json!({ "type": ty, "error": error_json(error) })
            }
            Action::Web3NetworkFetched { network_info } => {
                json!({ "type": ty, "networkInfo": network_info })
            }
            Action::NetworkIdChanged { network_id } => {
                json!({ "type": ty, "networkId": network_id })
            }
            Action::AccountsFetched { accounts } => json!({ "type": ty, "accounts": accounts }),
            Action::DrizzleInitializing { options, .. } => {
                json!({ "type": ty, "drizzle": "[registry]", "options": options })
            }
            Action::AddContract {
                contract_config,
                events,
            } => json!({ "type": ty, "contractConfig": contract_config, "events": events }),
            Action::ErrorAddContract {
                error,
                attempted_action,
            } => json!({
                "type": ty,
                "error": error_json(error),
                "attemptedAction": attempted_action.to_json(),
            }),
        }
    }
}

fn error_json(error: &PortError) -> Value {
    json!({
        "code": error.code(),
        "message": error.to_string(),
    })
}
