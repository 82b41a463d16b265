use serenity::model::id::{ChannelId, GuildId};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::{
    events::{CompletionKind, CompletionNotifier, TrackCompletion},
    queue::{MusicQueue, QueueEntry},
    transport::VoiceTransport,
};
use crate::{error::PlaybackError, sources::Track, ui::ChatSink};

const NOW_PLAYING_TITLE: &str = "🎵 Now playing:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

/// Qué disparó un avance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceTrigger {
    /// Se encoló un track en una cola vacía e inactiva.
    Enqueued,
    /// El source actual terminó (solo o por skip).
    Finished,
    /// El transporte avisó que el source actual no pudo reproducirse.
    Failed,
}

impl From<CompletionKind> for AdvanceTrigger {
    fn from(kind: CompletionKind) -> Self {
        match kind {
            CompletionKind::Finished => Self::Finished,
            CompletionKind::Failed => Self::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Started(Track),
    Exhausted,
}

/// Lo que un GuildSession necesita del mundo exterior.
#[derive(Clone)]
pub struct SessionIo {
    pub transport: Arc<dyn VoiceTransport>,
    pub chat: Arc<dyn ChatSink>,
    pub completions: UnboundedSender<TrackCompletion>,
    /// Contador compartido por todas las sesiones: una sesión nueva nunca
    /// repite la generación de una sesión anterior del mismo guild.
    pub generations: Arc<AtomicU64>,
}

impl SessionIo {
    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Vista de solo lectura de una sesión, tomada con su lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub connection: ConnectionState,
    pub playback: PlaybackState,
    pub loop_enabled: bool,
    pub entries: Vec<QueueEntry>,
}

/// Máquina de estados de reproducción de un guild.
///
/// Todos los métodos asumen que quien llama tiene el mutex de la sesión, así
/// que las operaciones de un mismo guild nunca se intercalan. Cada source
/// entregado al transporte lleva una generación nueva del contador compartido
/// en [`SessionIo`]; un fin de track solo se acepta si su generación sigue
/// siendo la actual. El avance corre a lo sumo una vez por source iniciado,
/// aunque `skip` y un fin natural compitan o la sesión haya sido reemplazada.
pub struct GuildSession {
    guild_id: GuildId,
    queue: MusicQueue,
    connection: ConnectionState,
    voice_channel: Option<ChannelId>,
    playback: PlaybackState,
    text_channel: ChannelId,
    current: Option<u64>,
    closed: bool,
}

impl GuildSession {
    pub fn new(guild_id: GuildId, text_channel: ChannelId, max_queue_size: usize) -> Self {
        Self {
            guild_id,
            queue: MusicQueue::new(max_queue_size),
            connection: ConnectionState::Disconnected,
            voice_channel: None,
            playback: PlaybackState::Idle,
            text_channel,
            current: None,
            closed: false,
        }
    }

    /// Una sesión cerrada ya salió de la tabla; una tarea que esperaba su
    /// lock tiene que volver a buscar el guild.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            connection: self.connection,
            playback: self.playback,
            loop_enabled: self.queue.loop_enabled(),
            entries: self.queue.entries(),
        }
    }

    /// Conecta o mueve el bot al canal de voz pedido.
    ///
    /// Si falla la primera conexión la sesión se cierra. Si falla un cambio de
    /// canal, la conexión existente (y lo que esté sonando) queda intacta.
    pub async fn ensure_connected(
        &mut self,
        channel_id: ChannelId,
        io: &SessionIo,
    ) -> Result<(), PlaybackError> {
        match self.connection {
            ConnectionState::Connected if self.voice_channel == Some(channel_id) => Ok(()),
            ConnectionState::Connected => {
                info!("🔀 Moviendo guild {} al canal {}", self.guild_id, channel_id);
                io.transport.move_to(self.guild_id, channel_id).await?;
                self.voice_channel = Some(channel_id);
                Ok(())
            }
            ConnectionState::Disconnected | ConnectionState::Connecting => {
                self.connection = ConnectionState::Connecting;
                match io.transport.connect(self.guild_id, channel_id).await {
                    Ok(()) => {
                        self.connection = ConnectionState::Connected;
                        self.voice_channel = Some(channel_id);
                        Ok(())
                    }
                    Err(e) => {
                        warn!("❌ Conexión fallida en guild {}: {}", self.guild_id, e);
                        self.teardown(io).await;
                        Err(e)
                    }
                }
            }
        }
    }

    /// Agrega un track y arranca la reproducción si quedó como head de una
    /// cola inactiva. Devuelve la posición del track (desde 1).
    pub async fn enqueue(
        &mut self,
        track: Track,
        text_channel: ChannelId,
        io: &SessionIo,
    ) -> Result<usize, PlaybackError> {
        let position = self.queue.push(track)?;

        if position == 1 && self.playback == PlaybackState::Idle {
            self.text_channel = text_channel;
            if self.advance(AdvanceTrigger::Enqueued, io).await == AdvanceOutcome::Exhausted {
                return Err(PlaybackError::PlaybackStart(
                    "the stream could not be played".into(),
                ));
            }
        }

        Ok(position)
    }

    /// Acepta un fin de track si pertenece al source que está sonando.
    /// Devuelve `false` para los obsoletos, que se ignoran.
    pub async fn complete(&mut self, completion: TrackCompletion, io: &SessionIo) -> bool {
        if self.closed || self.current != Some(completion.generation) {
            debug!(
                "Completion obsoleta en guild {} (gen {}, actual {:?})",
                self.guild_id, completion.generation, self.current
            );
            return false;
        }

        self.current = None;
        self.advance(completion.kind.into(), io).await;
        true
    }

    /// Detiene el source actual y avanza igual que en un fin natural.
    pub async fn skip(&mut self, io: &SessionIo) -> Result<(), PlaybackError> {
        if self.playback != PlaybackState::Playing {
            return Err(PlaybackError::NothingToSkip);
        }

        // Consumir la generación antes de parar: el callback que dispare
        // stop_source llegará obsoleto.
        self.current = None;
        io.transport.stop_source(self.guild_id).await;
        info!("⏭️ Skip en guild {}", self.guild_id);

        self.advance(AdvanceTrigger::Finished, io).await;
        Ok(())
    }

    pub async fn pause(&mut self, io: &SessionIo) -> Result<(), PlaybackError> {
        if self.playback != PlaybackState::Playing {
            return Err(PlaybackError::NothingToPause);
        }

        io.transport.pause(self.guild_id).await?;
        self.playback = PlaybackState::Paused;
        info!("⏸️ Reproducción pausada en guild {}", self.guild_id);
        Ok(())
    }

    pub async fn resume(&mut self, io: &SessionIo) -> Result<(), PlaybackError> {
        if self.playback != PlaybackState::Paused {
            return Err(PlaybackError::NotPaused);
        }

        io.transport.resume(self.guild_id).await?;
        self.playback = PlaybackState::Playing;
        info!("▶️ Reproducción reanudada en guild {}", self.guild_id);
        Ok(())
    }

    /// Aplica en el próximo fin de track; el source actual sigue sonando.
    pub fn toggle_loop(&mut self) -> bool {
        self.queue.toggle_loop()
    }

    /// Protocolo de avance.
    ///
    /// Quita el head terminado (salvo en loop) y arranca el nuevo head. Un
    /// source que el transporte no puede iniciar se descarta y se prueba el
    /// siguiente; cada fallo achica la cola, así que es una sola pasada. Con
    /// la cola vacía la sesión se cierra.
    pub async fn advance(&mut self, trigger: AdvanceTrigger, io: &SessionIo) -> AdvanceOutcome {
        match trigger {
            AdvanceTrigger::Enqueued => {}
            AdvanceTrigger::Finished => self.queue.finish_head(),
            // un stream roto no se repite aunque el loop esté activo
            AdvanceTrigger::Failed => {
                if let Some(track) = self.queue.drop_head() {
                    self.report_failure(&track, "the stream could not be played", io).await;
                }
            }
        }

        while let Some(track) = self.queue.head().cloned() {
            let generation = io.next_generation();
            let notifier = CompletionNotifier::new(self.guild_id, generation, io.completions.clone());

            match io.transport.play(self.guild_id, &track.stream_url, notifier).await {
                Ok(()) => {
                    self.current = Some(generation);
                    self.playback = PlaybackState::Playing;
                    info!(
                        "🎵 Reproduciendo en guild {}: {} (gen {})",
                        self.guild_id, track.title, generation
                    );

                    if let Err(e) = io
                        .chat
                        .send_embed(self.text_channel, NOW_PLAYING_TITLE, &track.title)
                        .await
                    {
                        warn!("Error al anunciar now playing: {:?}", e);
                    }
                    return AdvanceOutcome::Started(track);
                }
                Err(e) => {
                    warn!("❌ No se pudo iniciar {} en guild {}: {}", track.title, self.guild_id, e);
                    self.queue.drop_head();
                    // con Enqueued el comando mismo responde el error
                    if trigger != AdvanceTrigger::Enqueued {
                        self.report_failure(&track, &e.to_string(), io).await;
                    }
                }
            }
        }

        info!("📭 Cola vacía en guild {}", self.guild_id);
        self.teardown(io).await;
        AdvanceOutcome::Exhausted
    }

    /// Vacía la cola, detiene el audio y suelta la conexión de voz.
    /// Idempotente.
    pub async fn teardown(&mut self, io: &SessionIo) {
        if self.closed {
            return;
        }

        self.current = None;
        if self.playback != PlaybackState::Idle {
            io.transport.stop_source(self.guild_id).await;
            self.playback = PlaybackState::Idle;
        }

        if !self.queue.is_empty() {
            self.queue.clear();
        }

        if self.connection != ConnectionState::Disconnected {
            io.transport.disconnect(self.guild_id).await;
            self.connection = ConnectionState::Disconnected;
            self.voice_channel = None;
        }

        self.closed = true;
        debug!("Sesión cerrada para guild {}", self.guild_id);
    }

    async fn report_failure(&self, track: &Track, reason: &str, io: &SessionIo) {
        let text = format!("Could not play {}: {}", track.title, reason);
        if let Err(e) = io.chat.send_message(self.text_channel, &text).await {
            warn!("Error al enviar mensaje: {:?}", e);
        }
    }
}
