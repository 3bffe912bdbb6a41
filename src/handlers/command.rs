use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::commands::Command;
use crate::errors::HandlerResult;
use crate::handlers::ui;
use crate::session::SessionManager;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    sessions: Arc<SessionManager>,
) -> HandlerResult {
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    match cmd {
        Command::Start => {
            if sessions.is_authenticated(user.id) {
                bot.send_message(msg.chat.id, "✅ Welcome back!")
                    .reply_markup(ui::main_menu())
                    .await?;
            } else {
                sessions.begin_login(user.id);
                bot.send_message(msg.chat.id, "🔐 Enter the access password:")
                    .await?;
            }
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
    }
    Ok(())
}
