use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Runtime configuration, read once at startup and injected into the
/// dispatcher via `dptree::deps!`.
#[derive(Clone, Debug)]
pub struct Config {
    /// Secret an operator must supply before any privileged command works.
    pub access_password: String,
    /// Second secret required to confirm the mass-leave action.
    pub leave_password: String,
    /// Chats below this member count are left immediately instead of being
    /// registered.
    pub min_chat_members: u32,
    pub database_path: PathBuf,
}

pub fn load_environment() -> Result<Config> {
    // Missing .env is fine; real deployments use process env.
    dotenv::dotenv().ok();

    let access_password =
        env::var("ACCESS_PASSWORD").context("ACCESS_PASSWORD must be set")?;
    let leave_password =
        env::var("LEAVE_PASSWORD").context("LEAVE_PASSWORD must be set")?;

    let min_chat_members = match env::var("MIN_CHAT_MEMBERS") {
        Ok(raw) => raw
            .trim()
            .parse()
            .context("MIN_CHAT_MEMBERS must be a non-negative integer")?,
        Err(_) => 50,
    };

    let database_path = env::var("DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("channels.db"));

    Ok(Config {
        access_password,
        leave_password,
        min_chat_members,
        database_path,
    })
}
