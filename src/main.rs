mod config;
mod console;
mod desk;
mod domain;
mod form;
mod monitoring;
mod pumpportal;
mod session;
mod status;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::desk::TradingDesk;
use crate::pumpportal::PumpPortalClient;
use crate::session::Session;

#[tokio::main]
async fn main() -> Result<()> {
    // Load local .env if present
    let _ = dotenvy::dotenv();

    monitoring::init_tracing();

    let cfg = config::Config::from_env()?;
    info!(?cfg, "boot");

    let api = PumpPortalClient::new(cfg.trade_url.clone(), cfg.api_key.clone());
    let desk = TradingDesk::new(cfg.form_defaults(), cfg.overlap_policy());
    let session = Session::new(desk, Arc::new(api), cfg.explorer_tx_url.clone());

    console::run(session).await?;

    info!("shutdown");
    Ok(())
}
