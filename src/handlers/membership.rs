use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ChatMemberKind, ChatMemberUpdated};

use crate::config::Config;
use crate::errors::HandlerResult;
use crate::registry::{ChannelRegistry, ChatPatch};

fn membership_tag(kind: &ChatMemberKind) -> &'static str {
    if kind.is_owner() {
        "owner"
    } else if kind.is_administrator() {
        "administrator"
    } else if kind.is_restricted() {
        "restricted"
    } else if kind.is_member() {
        "member"
    } else if kind.is_banned() {
        "kicked"
    } else {
        "left"
    }
}

fn chat_type_tag(chat: &teloxide::types::Chat) -> &'static str {
    if chat.is_channel() {
        "channel"
    } else if chat.is_supergroup() {
        "supergroup"
    } else if chat.is_group() {
        "group"
    } else {
        "unknown"
    }
}

/// Keeps the registry in sync with the bot's own membership. Joining a chat
/// big enough registers it; joining a chat below the member floor makes the
/// bot leave on the spot; being removed marks the record, never deletes it.
pub async fn membership_handler(
    bot: Bot,
    upd: ChatMemberUpdated,
    registry: Arc<ChannelRegistry>,
    config: Arc<Config>,
) -> HandlerResult {
    if upd.chat.is_private() {
        return Ok(());
    }

    let chat_id = upd.chat.id;
    let kind = &upd.new_chat_member.kind;

    if !kind.is_present() {
        let tag = membership_tag(kind);
        log::info!("removed from {} ({})", chat_id, tag);
        if let Err(e) = registry
            .update_fields(chat_id.0, ChatPatch::membership(tag))
            .await
        {
            log::warn!("could not mark {} as {}: {}", chat_id, tag, e);
        }
        return Ok(());
    }

    let members = match bot.get_chat_member_count(chat_id).await {
        Ok(count) => i64::from(count),
        Err(e) => {
            log::warn!("member count probe failed for {}: {}", chat_id, e);
            0
        }
    };

    if members > 0 && members < i64::from(config.min_chat_members) {
        log::info!(
            "{} has only {} members, leaving (floor is {})",
            chat_id,
            members,
            config.min_chat_members
        );
        if let Err(e) = bot.leave_chat(chat_id).await {
            log::warn!("could not leave small chat {}: {}", chat_id, e);
        }
        if let Err(e) = registry
            .update_fields(chat_id.0, ChatPatch::membership("left"))
            .await
        {
            log::warn!("could not mark small chat {}: {}", chat_id, e);
        }
        return Ok(());
    }

    let title = upd.chat.title().unwrap_or("Untitled").to_string();
    let link = upd
        .chat
        .username()
        .map(|u| format!("https://t.me/{u}"))
        .unwrap_or_default();

    log::info!("registering {} (\"{}\", {} members)", chat_id, title, members);
    if let Err(e) = registry
        .upsert(
            chat_id.0,
            title,
            members,
            membership_tag(kind).to_string(),
            chat_type_tag(&upd.chat).to_string(),
            link,
        )
        .await
    {
        log::error!("could not register {}: {}", chat_id, e);
    }

    Ok(())
}
