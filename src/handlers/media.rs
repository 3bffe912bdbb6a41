use std::sync::Arc;

use teloxide::prelude::*;

use crate::broadcast::{self, BroadcastPayload};
use crate::errors::HandlerResult;
use crate::registry::ChannelRegistry;
use crate::session::{Pending, SessionManager};

/// Photo/video from an operator becomes a broadcast; video outranks photo
/// and any text rides along as the caption.
pub async fn media_handler(
    bot: Bot,
    msg: Message,
    sessions: Arc<SessionManager>,
    registry: Arc<ChannelRegistry>,
) -> HandlerResult {
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    if !sessions.is_authenticated(user.id) {
        bot.send_message(msg.chat.id, "⛔️ No access. Send /start.")
            .await?;
        return Ok(());
    }
    if sessions.pending(user.id) != Pending::None {
        bot.send_message(msg.chat.id, "Answer the pending question first.")
            .await?;
        return Ok(());
    }

    let caption = msg.caption().unwrap_or_default().to_string();
    let payload = if let Some(video) = msg.video() {
        BroadcastPayload::Video { file: video.file.id.clone(), caption }
    } else if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        BroadcastPayload::Photo { file: photo.file.id.clone(), caption }
    } else {
        return Ok(());
    };

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
    Ok(())
}
