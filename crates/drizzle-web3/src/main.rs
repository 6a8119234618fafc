//! drizzle-web3: connects to a wallet, follows its accounts and reports the
//! network it is on.

use std::sync::Arc;

use eyre::WrapErr;
use tokio::sync::broadcast::error::RecvError;

use drizzle_web3_adapters::{AdapterConfig, AlloyClientFactory};
use drizzle_web3_core::{Action, ContractRegistry, DrizzleRuntime};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting drizzle-web3");

    let config = AdapterConfig::from_env().wrap_err("invalid DRIZZLE_* configuration")?;
    let factory = AlloyClientFactory;
    let options = config.web3_options(&factory)?;
    let wallet = config.wallet()?;

    let mut runtime = DrizzleRuntime::new(wallet, Arc::new(factory));
    let mut actions = runtime.subscribe();
    tokio::spawn(async move {
        loop {
            match actions.recv().await {
                Ok(action) => tracing::info!(action = %action.to_json(), "{}", action.action_type()),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "action log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
    runtime.start_sagas();

    let Some(web3) = runtime.initialize(&options).await else {
        eyre::bail!("web3 initialization failed");
    };

    let registry = Arc::new(ContractRegistry::new(serde_json::json!({})));
    runtime.dispatch(Action::DrizzleInitializing {
        options: registry.options().clone(),
        drizzle: registry,
    });
    runtime.dispatch(Action::Web3NetworkFetching { web3 });

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.wrap_err("failed to listen for ctrl-c")?;
                tracing::info!("Shutting down");
                break;
            }
            _ = runtime.process_next() => {}
        }
    }
    Ok(())
}
