//! Stakeward daemon entry point.
//!
//! Wires configuration, logging and the chain gateway together, then runs
//! the two operator entry points on ten-minute cadences until interrupted.

mod config;
mod logging;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Mutex;
use tracing::{error, info};

use stakeward_chain::{ChainGateway, NearGateway, OperatorKey};
use stakeward_operator::StakePoolOperator;

use crate::config::Config;

/// Off-chain operator for the liquid-staking pool: keeps the pool's
/// recorded epoch in step with the network and distributes deposited funds
/// across its validators.
#[derive(Parser)]
#[command(name = "stakeward", version, about)]
struct Cli {}

const TICK_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // All timestamps are UTC regardless of host configuration.
    std::env::set_var("TZ", "UTC");
    let _cli = Cli::parse();

    let config = Config::load().context("loading configuration")?;
    logging::init(&config.log_level);

    let key = OperatorKey::from_base58(&config.key_pair).context("parsing KEY_PAIR")?;
    let gateway = NearGateway::new(
        &config.node,
        config.stake_pool.clone(),
        config.key_pair_account_id.clone(),
        key,
    )
    .context("building chain gateway")?;
    let operator = Arc::new(StakePoolOperator::new(
        Arc::new(gateway) as Arc<dyn ChainGateway>,
        config.key_pair_account_id.clone(),
    ));

    info!(node = %config.node, pool = %config.stake_pool, "stakeward starting");

    // One lock across both entry points: ticks never overlap.
    let tick_lock = Arc::new(Mutex::new(()));
    let pool_update = tokio::spawn(tick_loop(
        Arc::clone(&operator),
        Arc::clone(&tick_lock),
        Entry::PoolUpdate,
    ));
    let increase_stake = tokio::spawn(tick_loop(operator, tick_lock, Entry::IncreaseStake));

    wait_for_shutdown().await?;
    info!("shutting down");
    pool_update.abort();
    increase_stake.abort();
    Ok(())
}

#[derive(Clone, Copy)]
enum Entry {
    PoolUpdate,
    IncreaseStake,
}

impl Entry {
    fn name(self) -> &'static str {
        match self {
            Self::PoolUpdate => "pool_update",
            Self::IncreaseStake => "increase_stake",
        }
    }
}

/// Run one entry point forever. A failed tick is logged and dropped; the
/// next tick re-reads on-chain state and retries from there.
async fn tick_loop(operator: Arc<StakePoolOperator>, lock: Arc<Mutex<()>>, entry: Entry) {
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    loop {
        ticker.tick().await;
        let _serialized = lock.lock().await;
        let result = match entry {
            Entry::PoolUpdate => operator.pool_update().await,
            Entry::IncreaseStake => operator.increase_stake().await,
        };
        if let Err(err) = result {
            error!(entry = entry.name(), error = %err, "tick failed");
        }
    }
}

async fn wait_for_shutdown() -> anyhow::Result<()> {
    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("waiting for SIGINT")?,
        _ = sigterm.recv() => {}
    }
    Ok(())
}
