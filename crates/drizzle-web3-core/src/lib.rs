pub mod accounts;
pub mod actions;
pub mod domain;
pub mod drizzle;
pub mod network;
pub mod ports;
pub mod registry;
pub mod runtime;
pub mod store;
pub mod web3;

pub use accounts::AccountsMiddleware;
pub use actions::{Action, ActionType};
pub use domain::{AccountList, FallbackConfig, NetworkInfo, Web3Options, FALLBACK_WS};
pub use drizzle::{sync_active_account, DrizzleMiddleware};
pub use network::{NetworkFetcher, Web3Saga};
pub use ports::{
    AccountsListener, ClientFactory, ClientHandle, PortError, WalletHandle, WalletProvider,
    Web3Client, REQUEST_ALREADY_PENDING, UNSUPPORTED_METHOD, USER_REJECTED_REQUEST,
};
pub use registry::{
    ContractConfig, ContractHandle, ContractOptions, ContractRegistration, ContractRegistry,
    EventSubscription, RegistryHandle,
};
pub use runtime::DrizzleRuntime;
pub use store::{Dispatcher, Middleware, MiddlewareOutcome, Store, DEFAULT_BUS_CAPACITY};
pub use web3::Web3Initializer;
