mod api;
mod chain;
mod config;
mod ledger;
mod mining;
mod wallet;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{error, info};
use std::io;

use api::AppState;
use chain::{ChainClock, HostEntropy};
use config::{Deployment, MiningConfig, NodeConfig};
use ledger::{AgentRegistry, TokenLedger};
use mining::AgentMiner;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let node = NodeConfig::from_env();
    let clock = ChainClock::starting_now(node.block_time_secs);

    let miner = AgentMiner::new(
        MiningConfig::from_env(),
        Deployment::from_env(),
        AgentRegistry::new(),
        TokenLedger::new(),
        HostEntropy::new(),
        clock.current_block(),
    )
    .map_err(|e| {
        error!("cannot start mining engine: {e}");
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!(
        "round {} open, difficulty {}, reward {}",
        miner.current_round(),
        miner.difficulty(),
        miner.current_reward()
    );
    println!(
        "⛏️ Starting agent-pow node at http://{}:{}",
        node.host, node.port
    );

    let state = web::Data::new(AppState::new(miner, clock));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((node.host.as_str(), node.port))?
    .run()
    .await
}
