pub mod client;
pub mod config;
pub mod eip1193;

pub use client::{AlloyClientFactory, RpcClient};
pub use config::AdapterConfig;
pub use eip1193::Eip1193Adapter;
