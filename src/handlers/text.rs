use std::fmt::Write as _;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::InputFile;

use crate::broadcast::{self, BroadcastPayload};
use crate::config::Config;
use crate::errors::HandlerResult;
use crate::export;
use crate::handlers::ui;
use crate::leave;
use crate::registry::ChannelRegistry;
use crate::session::{AccessOutcome, ConfirmOutcome, LeaveAuthOutcome, Pending, SessionManager};

/// Routing rule for operator text: a pending password/confirmation answer is
/// consumed first; then menu buttons; only then is free text treated as a
/// broadcast payload. Unauthenticated operators get nothing but a prompt.
pub async fn text_handler(
    bot: Bot,
    msg: Message,
    sessions: Arc<SessionManager>,
    registry: Arc<ChannelRegistry>,
    config: Arc<Config>,
) -> HandlerResult {
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let operator = user.id;
    let text = text.trim();

    match sessions.pending(operator) {
        Pending::AccessPassword => {
            match sessions.submit_access_password(operator, text, &config.access_password) {
                AccessOutcome::Granted => {
                    bot.send_message(msg.chat.id, "✅ Access granted!")
                        .reply_markup(ui::main_menu())
                        .await?;
                }
                AccessOutcome::AlreadyAuthenticated => {
                    bot.send_message(msg.chat.id, "✅ Welcome back!")
                        .reply_markup(ui::main_menu())
                        .await?;
                }
                AccessOutcome::Denied => {
                    bot.send_message(msg.chat.id, "❌ Wrong password. Try again:")
                        .await?;
                }
            }
            return Ok(());
        }
        Pending::LeaveConfirmation => {
            match sessions.submit_leave_confirmation(operator, text == ui::BTN_YES) {
                ConfirmOutcome::PasswordRequested => {
                    bot.send_message(msg.chat.id, "Enter the leave password:")
                        .await?;
                }
                ConfirmOutcome::Cancelled => {
                    bot.send_message(msg.chat.id, "❎ Cancelled.")
                        .reply_markup(ui::main_menu())
                        .await?;
                }
            }
            return Ok(());
        }
        Pending::LeavePassword => {
            match sessions.submit_leave_password(operator, text, &config.leave_password) {
                LeaveAuthOutcome::Approved => match leave::leave_all(&bot, &registry).await {
                    Ok(left) => {
                        bot.send_message(msg.chat.id, format!("🚪 Left {left} chats."))
                            .reply_markup(ui::main_menu())
                            .await?;
                    }
                    Err(e) => {
                        log::error!("mass-leave aborted: {}", e);
                        bot.send_message(msg.chat.id, "❌ Database error, nothing was left.")
                            .reply_markup(ui::main_menu())
                            .await?;
                    }
                },
                LeaveAuthOutcome::Denied => {
                    bot.send_message(msg.chat.id, "❌ Wrong password.")
                        .reply_markup(ui::main_menu())
                        .await?;
                }
            }
            return Ok(());
        }
        Pending::None => {}
    }

    if !sessions.is_authenticated(operator) {
        bot.send_message(msg.chat.id, "⛔️ No access. Send /start.")
            .await?;
        return Ok(());
    }

    match text {
        ui::BTN_SEND => {
            bot.send_message(msg.chat.id, "📤 Send a video, photo or text.")
                .await?;
        }
        ui::BTN_STATS => {
            bot.send_message(msg.chat.id, "♻️ Refreshing data...").await?;
            show_stats(&bot, &msg, &registry).await?;
        }
        ui::BTN_EXPORT => {
            bot.send_message(msg.chat.id, "📦 Building the export...")
                .await?;
            send_export(&bot, &msg, &registry).await?;
        }
        ui::BTN_LEAVE => {
            sessions.begin_leave(operator);
            bot.send_message(msg.chat.id, "Leave all chats?")
                .reply_markup(ui::confirm_menu())
                .await?;
        }
        _ => {
            // Plain text from an authenticated operator is a broadcast.
            let payload = BroadcastPayload::Text { text: text.to_string() };
            match broadcast::run(&bot, &registry, &payload).await {
                Ok(report) => {
                    bot.send_message(
                        msg.chat.id,
                        format!(
                            "✅ Delivered to {} of {} chats.\n👥 Members reached: {}",
                            report.delivered, report.attempted, report.reach
                        ),
                    )
                    .await?;
                }
                Err(e) => {
                    log::error!("broadcast aborted: {}", e);
                    bot.send_message(msg.chat.id, "❌ Database error.").await?;
                }
            }
        }
    }

    Ok(())
}

async fn show_stats(bot: &Bot, msg: &Message, registry: &ChannelRegistry) -> HandlerResult {
    if let Err(e) = export::refresh_all(bot, registry).await {
        log::error!("refresh failed: {}", e);
        bot.send_message(msg.chat.id, "❌ Database error.").await?;
        return Ok(());
    }

    let chats = match registry.list().await {
        Ok(chats) => chats,
        Err(e) => {
            log::error!("stats query failed: {}", e);
            bot.send_message(msg.chat.id, "❌ Database error.").await?;
            return Ok(());
        }
    };

    if chats.is_empty() {
        bot.send_message(msg.chat.id, "⚠️ No connected chats.").await?;
        return Ok(());
    }

    let stats = export::compute_stats(&chats);
    let mut reply = format!(
        "📊 Statistics:\n• Chats: {}\n• Members: {}",
        stats.chats, stats.members
    );
    for (chat_type, count) in &stats.by_type {
        let _ = write!(reply, "\n• {chat_type}: {count}");
    }
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

async fn send_export(bot: &Bot, msg: &Message, registry: &ChannelRegistry) -> HandlerResult {
    if let Err(e) = export::refresh_all(bot, registry).await {
        log::error!("refresh failed: {}", e);
        bot.send_message(msg.chat.id, "❌ Database error.").await?;
        return Ok(());
    }

    let chats = match registry.list().await {
        Ok(chats) => chats,
        Err(e) => {
            log::error!("export query failed: {}", e);
            bot.send_message(msg.chat.id, "❌ Database error.").await?;
            return Ok(());
        }
    };

    match export::export_snapshot(&chats) {
        Ok(Some(bytes)) => {
            let document = InputFile::memory(bytes).file_name("channels.xlsx");
            bot.send_document(msg.chat.id, document).await?;
        }
        Ok(None) => {
            bot.send_message(msg.chat.id, "⚠️ No data.").await?;
        }
        Err(e) => {
            log::error!("could not build the workbook: {}", e);
            bot.send_message(msg.chat.id, "❌ Export failed.").await?;
        }
    }
    Ok(())
}
