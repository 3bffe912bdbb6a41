use std::sync::Arc;

use anyhow::Error;
use teloxide::dptree;
use teloxide::prelude::*;

use crate::commands::Command;
use crate::database::DatabasePool;
use crate::handlers::{command_handler, media_handler, membership_handler, text_handler};
use crate::registry::ChannelRegistry;
use crate::session::SessionManager;

mod broadcast;
mod commands;
mod config;
mod database;
mod errors;
mod export;
mod handlers;
mod leave;
mod logging;
mod registry;
mod session;
mod transport;

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init()?;

    log::info!("Starting channel broadcast bot...");
    let start_time = std::time::Instant::now();

    let config = match config::load_environment() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            log::error!("Failed to load environment: {}", e);
            return Err(e);
        }
    };

    if let Err(e) = database::init_schema(&config.database_path) {
        log::error!("Failed to initialize the database: {}", e);
        return Err(e.into());
    }
    log::info!("Database initialized at {:?}", config.database_path);

    // Maximum 3 simultaneous database connections.
    let pool = Arc::new(DatabasePool::new(config.database_path.clone(), 3));
    let registry = Arc::new(ChannelRegistry::new(pool));
    let sessions = Arc::new(SessionManager::new());

    let bot = Bot::from_env();

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.video().is_some() || msg.photo().is_some())
                .endpoint(media_handler),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().is_some())
                .endpoint(text_handler),
        )
        .branch(Update::filter_my_chat_member().endpoint(membership_handler));

    log::info!("Bot initialization completed in {:.2?}", start_time.elapsed());
    log::info!("Starting to dispatch updates...");

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![registry, sessions, config])
        .enable_ctrlc_handler()
        .build();

    tokio::select! {
        _ = dispatcher.dispatch() => {},
        _ = tokio::signal::ctrl_c() => {
            log::info!("Received Ctrl+C, shutting down...");
        }
    }

    log::info!("Bot shutdown complete");
    Ok(())
}
