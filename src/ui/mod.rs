pub mod embeds;

use anyhow::Result;
use async_trait::async_trait;
use serenity::{builder::CreateMessage, http::Http, model::id::ChannelId};
use std::sync::Arc;

/// Destino de los anuncios de reproducción.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_message(&self, channel_id: ChannelId, text: &str) -> Result<()>;

    async fn send_embed(&self, channel_id: ChannelId, title: &str, description: &str) -> Result<()>;
}

/// ChatSink sobre la API HTTP de Discord.
pub struct SerenityChat {
    http: Arc<Http>,
}

impl SerenityChat {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatSink for SerenityChat {
    async fn send_message(&self, channel_id: ChannelId, text: &str) -> Result<()> {
        channel_id.say(&self.http, text).await?;
        Ok(())
    }

    async fn send_embed(&self, channel_id: ChannelId, title: &str, description: &str) -> Result<()> {
        let message = CreateMessage::new().embed(embeds::announcement(title, description));
        channel_id.send_message(&*self.http, message).await?;
        Ok(())
    }
}
