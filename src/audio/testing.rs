//! Fakes de los colaboradores de la reproducción.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId};
use std::{collections::HashMap, collections::HashSet, time::Duration};

use super::{
    events::{CompletionKind, CompletionNotifier},
    transport::VoiceTransport,
};
use crate::{error::PlaybackError, sources::Track, ui::ChatSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect(ChannelId),
    Move(ChannelId),
    Play(String),
    Pause,
    Resume,
    StopSource,
    Disconnect,
}

/// Registra cada llamada. `stop_source` dispara el notifier actual como lo
/// hace un transporte real al detener un source.
#[derive(Default)]
pub struct FakeTransport {
    calls: Mutex<Vec<(GuildId, TransportCall)>>,
    current: Mutex<HashMap<GuildId, CompletionNotifier>>,
    channels: Mutex<HashMap<GuildId, ChannelId>>,
    failing_urls: Mutex<HashSet<String>>,
    refuse_connect: Mutex<bool>,
}

impl FakeTransport {
    pub fn fail_url(&self, url: &str) {
        self.failing_urls.lock().insert(url.to_string());
    }

    pub fn refuse_connections(&self) {
        *self.refuse_connect.lock() = true;
    }

    pub fn calls(&self, guild_id: GuildId) -> Vec<TransportCall> {
        self.calls
            .lock()
            .iter()
            .filter(|(guild, _)| *guild == guild_id)
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn count(&self, guild_id: GuildId, call: &TransportCall) -> usize {
        self.calls(guild_id).iter().filter(|c| *c == call).count()
    }

    pub fn plays(&self, guild_id: GuildId) -> Vec<String> {
        self.calls(guild_id)
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Play(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    /// Notifier del source activo en `guild_id`.
    pub fn current_notifier(&self, guild_id: GuildId) -> Option<CompletionNotifier> {
        self.current.lock().get(&guild_id).cloned()
    }

    /// Simula el fin natural del source actual.
    pub fn finish_current(&self, guild_id: GuildId) {
        if let Some(notifier) = self.current_notifier(guild_id) {
            notifier.notify(CompletionKind::Finished);
        }
    }

    /// Simula que alguien desconectó al bot del canal de voz.
    pub fn drop_connection(&self, guild_id: GuildId) {
        self.channels.lock().remove(&guild_id);
    }

    fn record(&self, guild_id: GuildId, call: TransportCall) {
        self.calls.lock().push((guild_id, call));
    }
}

#[async_trait]
impl VoiceTransport for FakeTransport {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), PlaybackError> {
        self.record(guild_id, TransportCall::Connect(channel_id));
        if *self.refuse_connect.lock() {
            return Err(PlaybackError::Connection("missing permissions".into()));
        }
        self.channels.lock().insert(guild_id, channel_id);
        Ok(())
    }

    async fn move_to(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), PlaybackError> {
        self.record(guild_id, TransportCall::Move(channel_id));
        self.channels.lock().insert(guild_id, channel_id);
        Ok(())
    }

    async fn play(
        &self,
        guild_id: GuildId,
        stream_url: &str,
        on_complete: CompletionNotifier,
    ) -> Result<(), PlaybackError> {
        self.record(guild_id, TransportCall::Play(stream_url.to_string()));
        if self.failing_urls.lock().contains(stream_url) {
            return Err(PlaybackError::PlaybackStart("unsupported codec".into()));
        }
        self.current.lock().insert(guild_id, on_complete);
        Ok(())
    }

    async fn pause(&self, guild_id: GuildId) -> Result<(), PlaybackError> {
        self.record(guild_id, TransportCall::Pause);
        Ok(())
    }

    async fn resume(&self, guild_id: GuildId) -> Result<(), PlaybackError> {
        self.record(guild_id, TransportCall::Resume);
        Ok(())
    }

    async fn stop_source(&self, guild_id: GuildId) {
        self.record(guild_id, TransportCall::StopSource);
        let stopped = self.current.lock().remove(&guild_id);
        if let Some(notifier) = stopped {
            notifier.notify(CompletionKind::Finished);
        }
    }

    async fn disconnect(&self, guild_id: GuildId) {
        self.record(guild_id, TransportCall::Disconnect);
        self.current.lock().remove(&guild_id);
        self.channels.lock().remove(&guild_id);
    }

    async fn current_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.channels.lock().get(&guild_id).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Message(ChannelId, String),
    Embed(ChannelId, String, String),
}

#[derive(Default)]
pub struct RecordingChat {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingChat {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    /// Títulos anunciados con embeds de "now playing", en orden.
    pub fn now_playing(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|sent| match sent {
                Sent::Embed(_, _, description) => Some(description.clone()),
                Sent::Message(..) => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatSink for RecordingChat {
    async fn send_message(&self, channel_id: ChannelId, text: &str) -> Result<()> {
        self.sent.lock().push(Sent::Message(channel_id, text.to_string()));
        Ok(())
    }

    async fn send_embed(&self, channel_id: ChannelId, title: &str, description: &str) -> Result<()> {
        self.sent.lock().push(Sent::Embed(
            channel_id,
            title.to_string(),
            description.to_string(),
        ));
        Ok(())
    }
}

pub fn track(title: &str) -> Track {
    Track::new(title, format!("https://cdn.example/{}", title.replace(' ', "-")))
}

/// Deja correr al listener de fines de track y las tareas que lanza.
pub async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}
