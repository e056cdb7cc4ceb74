use std::sync::Arc;

use quizpoller::{
    bot::BotManager, config::Config, database::Connection, logging, service::QuizService,
    telegram::{self, TelegramSource}, Poller,
};
use teloxide::prelude::Requester;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(&config.log_level)?;

    let connection = Arc::new(Connection::connect(&config.database_url).await?);
    connection.perform_migrations().await?;

    let bot = telegram::polling_bot(
        &config.bot_token,
        config.poll_timeout,
        config.api_url.clone(),
    )?;

    let bot_username = match config.bot_username.clone() {
        Some(username) => username,
        None => bot.get_me().await?.username().to_owned(),
    };
    info!("Starting bot @{bot_username}...");

    let source = TelegramSource::new(bot.clone(), config.poll_timeout);
    let handler = BotManager::new(QuizService::new(connection), bot, bot_username);
    let poller = Poller::new(source, handler, config.poller.clone());

    poller.start();
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    poller.shutdown().await;

    Ok(())
}
