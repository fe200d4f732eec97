mod antiplagiat;
mod app;
mod config;
mod domain;
mod infrastructure;
mod messaging;
mod tasks;
mod telegram;
#[cfg(test)]
mod testing;

use anyhow::Result;
use infrastructure::{
    directories, logging,
    shutdown::{self, Shutdown},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let shutdown = Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::RelayApp::initialize(config, paths, shutdown).await?;
    app.run().await
}
