use anyhow::Context;
use bridge::{config::DEFAULT_CONFIG_PATH, Bridge, Config};
use serverctl::ServerProcess;
use tgbot::ChatBot;
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
    let config = Config::load(&path)?;
    info!(%path, "configuration loaded");

    let (server_to_main, main_from_server) = mpsc::channel(100);
    let (bot_to_main, main_from_bot) = mpsc::unbounded_channel();

    let mut chat = ChatBot::connect(config.bot, bot_to_main).await.context("could not connect to telegram")?;

    let log_lines = config.server.log_lines;
    let mut server = ServerProcess::new(config.server, server_to_main);
    server.start().context("could not start the server")?;

    chat.start();

    let mut bridge = Bridge::new(server, chat, main_from_server, main_from_bot, log_lines);
    bridge.run().await;
    Ok(())
}
