use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, InputFile};

use crate::errors::DeliveryError;

/// What a membership probe returns for a registered chat.
#[derive(Clone, Debug)]
pub struct ChatProbe {
    pub title: String,
    pub members: i64,
    /// Public username, if the chat has one.
    pub username: Option<String>,
}

/// Port over the messaging platform. The broadcast, refresh and mass-leave
/// loops only see this trait, so tests drive them with a mock instead of a
/// live bot.
#[async_trait]
pub trait Transport {
    async fn deliver_text(&self, chat: ChatId, text: &str) -> Result<(), DeliveryError>;
    async fn deliver_photo(
        &self,
        chat: ChatId,
        file: &FileId,
        caption: &str,
    ) -> Result<(), DeliveryError>;
    async fn deliver_video(
        &self,
        chat: ChatId,
        file: &FileId,
        caption: &str,
    ) -> Result<(), DeliveryError>;
    async fn probe_chat(&self, chat: ChatId) -> Result<ChatProbe, DeliveryError>;
    async fn depart_chat(&self, chat: ChatId) -> Result<(), DeliveryError>;
}

#[async_trait]
impl Transport for Bot {
    async fn deliver_text(&self, chat: ChatId, text: &str) -> Result<(), DeliveryError> {
        self.send_message(chat, text)
            .await
            .map_err(|source| DeliveryError { chat, source })?;
        Ok(())
    }

    async fn deliver_photo(
        &self,
        chat: ChatId,
        file: &FileId,
        caption: &str,
    ) -> Result<(), DeliveryError> {
        let mut request = self.send_photo(chat, InputFile::file_id(file.clone()));
        if !caption.is_empty() {
            request = request.caption(caption.to_string());
        }
        request
            .await
            .map_err(|source| DeliveryError { chat, source })?;
        Ok(())
    }

    async fn deliver_video(
        &self,
        chat: ChatId,
        file: &FileId,
        caption: &str,
    ) -> Result<(), DeliveryError> {
        let mut request = self.send_video(chat, InputFile::file_id(file.clone()));
        if !caption.is_empty() {
            request = request.caption(caption.to_string());
        }
        request
            .await
            .map_err(|source| DeliveryError { chat, source })?;
        Ok(())
    }

    async fn probe_chat(&self, chat: ChatId) -> Result<ChatProbe, DeliveryError> {
        let info = self
            .get_chat(chat)
            .await
            .map_err(|source| DeliveryError { chat, source })?;
        let members = self
            .get_chat_member_count(chat)
            .await
            .map_err(|source| DeliveryError { chat, source })?;

        Ok(ChatProbe {
            title: info.title().unwrap_or_default().to_string(),
            members: members as i64,
            username: info.username().map(str::to_string),
        })
    }

    async fn depart_chat(&self, chat: ChatId) -> Result<(), DeliveryError> {
        self.leave_chat(chat)
            .await
            .map_err(|source| DeliveryError { chat, source })?;
        Ok(())
    }
}
