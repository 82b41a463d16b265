use async_trait::async_trait;
use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    input::{HttpRequest, Input},
    tracks::TrackHandle,
    Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::events::{CompletionKind, CompletionNotifier};
use crate::error::PlaybackError;

/// Conexión de audio por guild, manejada por una [`GuildSession`].
///
/// `stop_source` termina el source actual, y el transporte dispara su
/// [`CompletionNotifier`] igual que en un fin natural.
///
/// [`GuildSession`]: super::session::GuildSession
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), PlaybackError>;

    async fn move_to(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), PlaybackError>;

    async fn play(
        &self,
        guild_id: GuildId,
        stream_url: &str,
        on_complete: CompletionNotifier,
    ) -> Result<(), PlaybackError>;

    async fn pause(&self, guild_id: GuildId) -> Result<(), PlaybackError>;

    async fn resume(&self, guild_id: GuildId) -> Result<(), PlaybackError>;

    async fn stop_source(&self, guild_id: GuildId);

    async fn disconnect(&self, guild_id: GuildId);

    /// Canal de voz de la llamada activa, `None` si no hay llamada.
    async fn current_channel(&self, guild_id: GuildId) -> Option<ChannelId>;
}

/// Transporte de voz sobre songbird.
pub struct SongbirdTransport {
    manager: Arc<Songbird>,
    http_client: reqwest::Client,
    current_tracks: DashMap<GuildId, TrackHandle>,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self {
            manager,
            http_client: reqwest::Client::new(),
            current_tracks: DashMap::new(),
        }
    }

    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), PlaybackError> {
        let call = self.manager.join(guild_id, channel_id).await.map_err(|e| {
            error!("Error al conectar al canal de voz: {:?}", e);
            PlaybackError::Connection(e.to_string())
        })?;

        let mut call = call.lock().await;
        if !call.is_deaf() {
            if let Err(e) = call.deafen(true).await {
                warn!("No se pudo ensordecer en guild {}: {:?}", guild_id, e);
            }
        }

        info!("🔊 Conectado al canal {} en guild {}", channel_id, guild_id);
        Ok(())
    }
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), PlaybackError> {
        self.join(guild_id, channel_id).await
    }

    async fn move_to(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), PlaybackError> {
        // join sobre una llamada existente mueve el bot de canal
        self.join(guild_id, channel_id).await
    }

    async fn play(
        &self,
        guild_id: GuildId,
        stream_url: &str,
        on_complete: CompletionNotifier,
    ) -> Result<(), PlaybackError> {
        let call = self
            .manager
            .get(guild_id)
            .ok_or_else(|| PlaybackError::PlaybackStart("not connected to voice".into()))?;

        let input = Input::from(HttpRequest::new(
            self.http_client.clone(),
            stream_url.to_string(),
        ));

        let track_handle = {
            let mut call = call.lock().await;
            call.play_input(input)
        };

        for (event, kind) in [
            (TrackEvent::End, CompletionKind::Finished),
            (TrackEvent::Error, CompletionKind::Failed),
        ] {
            let handler = TrackEndHandler {
                notifier: on_complete.clone(),
                kind,
            };
            if let Err(e) = track_handle.add_event(Event::Track(event), handler) {
                let _ = track_handle.stop();
                return Err(PlaybackError::PlaybackStart(e.to_string()));
            }
        }

        self.current_tracks.insert(guild_id, track_handle);
        Ok(())
    }

    async fn pause(&self, guild_id: GuildId) -> Result<(), PlaybackError> {
        let track = self
            .current_tracks
            .get(&guild_id)
            .ok_or(PlaybackError::NothingToPause)?;
        track
            .pause()
            .map_err(|e| PlaybackError::Connection(e.to_string()))
    }

    async fn resume(&self, guild_id: GuildId) -> Result<(), PlaybackError> {
        let track = self
            .current_tracks
            .get(&guild_id)
            .ok_or(PlaybackError::NotPaused)?;
        track
            .play()
            .map_err(|e| PlaybackError::Connection(e.to_string()))
    }

    async fn stop_source(&self, guild_id: GuildId) {
        if let Some((_, track)) = self.current_tracks.remove(&guild_id) {
            if let Err(e) = track.stop() {
                debug!("El track ya estaba detenido en guild {}: {:?}", guild_id, e);
            }
        }
    }

    async fn disconnect(&self, guild_id: GuildId) {
        self.stop_source(guild_id).await;

        if self.manager.get(guild_id).is_some() {
            if let Err(e) = self.manager.remove(guild_id).await {
                warn!("Error al desconectar en guild {}: {:?}", guild_id, e);
            }
        }

        info!("👋 Desconectado del canal de voz en guild {}", guild_id);
    }

    async fn current_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        let call = self.manager.get(guild_id)?;
        let call = call.lock().await;
        call.current_channel()
            .map(|channel| ChannelId::new(channel.0.get()))
    }
}

/// Handler de songbird para el fin (o error) de un track
struct TrackEndHandler {
    notifier: CompletionNotifier,
    kind: CompletionKind,
}

#[async_trait]
impl VoiceEventHandler for TrackEndHandler {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        self.notifier.notify(self.kind);
        None
    }
}
