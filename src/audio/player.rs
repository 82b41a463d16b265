use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::{atomic::AtomicU64, Arc};
use tokio::{
    sync::{mpsc, Mutex, OwnedMutexGuard},
    task::JoinHandle,
};
use tracing::{debug, info};

use super::{
    events::TrackCompletion,
    session::{GuildSession, SessionIo, SessionSnapshot},
    transport::VoiceTransport,
};
use crate::{error::PlaybackError, sources::Track, ui::ChatSink};

type SessionHandle = Arc<Mutex<GuildSession>>;

/// Se toma antes de que un `play` empiece a resolver. Un `stop` en el medio
/// lo invalida, así el track resuelto no puede revivir la sesión.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayTicket {
    guild_id: GuildId,
    epoch: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct PlayRequest {
    pub ticket: PlayTicket,
    pub voice_channel: ChannelId,
    pub text_channel: ChannelId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enqueued {
    pub title: String,
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotActive,
}

/// Tabla de sesiones por guild, una por proceso.
///
/// La tabla (un [`DashMap`]) protege la inserción y el borrado de la entrada
/// de cada guild; cada sesión está detrás de su propio [`Mutex`], así que las
/// operaciones de un guild se serializan y guilds distintos nunca comparten
/// lock. La sesión se inserta con el primer `play` y se quita apenas se cierra
/// (cola agotada, stop, conexión fallida, conexión de voz perdida).
pub struct AudioPlayer {
    sessions: DashMap<GuildId, SessionHandle>,
    // Una entrada por guild que alguna vez recibió `stop`; no se borra porque
    // un ticket emitido antes del stop puede seguir pendiente.
    stop_epochs: DashMap<GuildId, u64>,
    io: SessionIo,
    max_queue_size: usize,
}

impl AudioPlayer {
    /// Crea el player y lanza la tarea que recibe los fines de track.
    pub fn start(
        transport: Arc<dyn VoiceTransport>,
        chat: Arc<dyn ChatSink>,
        max_queue_size: usize,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let player = Arc::new(Self {
            sessions: DashMap::new(),
            stop_epochs: DashMap::new(),
            io: SessionIo {
                transport,
                chat,
                completions: tx,
                generations: Arc::new(AtomicU64::new(0)),
            },
            max_queue_size,
        });

        player.spawn_completion_listener(rx);
        player
    }

    fn spawn_completion_listener(
        self: &Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<TrackCompletion>,
    ) {
        // Referencia débil: el canal no debe mantener vivo al player
        let player = Arc::downgrade(self);
        let _listener: JoinHandle<()> = tokio::spawn(async move {
            while let Some(completion) = rx.recv().await {
                let Some(player) = player.upgrade() else {
                    break;
                };
                tokio::spawn(async move { player.handle_completion(completion).await });
            }
            debug!("Listener de completions terminado");
        });
    }

    pub fn ticket(&self, guild_id: GuildId) -> PlayTicket {
        PlayTicket {
            guild_id,
            epoch: self.stop_epoch(guild_id),
        }
    }

    pub fn is_active(&self, guild_id: GuildId) -> bool {
        self.sessions.contains_key(&guild_id)
    }

    /// Agrega un track resuelto, conectando (o moviendo) el bot al canal de
    /// voz de quien lo pidió. Arranca la reproducción si el track queda como
    /// head de una cola inactiva.
    pub async fn enqueue(&self, request: PlayRequest, track: Track) -> Result<Enqueued, PlaybackError> {
        let guild_id = request.ticket.guild_id;
        let title = track.title.clone();

        if self.stop_epoch(guild_id) != request.ticket.epoch {
            return Err(PlaybackError::Cancelled);
        }

        loop {
            let handle = self
                .sessions
                .entry(guild_id)
                .or_insert_with(|| {
                    info!("🆕 Nueva sesión para guild {}", guild_id);
                    Arc::new(Mutex::new(GuildSession::new(
                        guild_id,
                        request.text_channel,
                        self.max_queue_size,
                    )))
                })
                .clone();

            let mut session = handle.lock().await;
            if session.is_closed() {
                continue;
            }

            // stop sube el epoch antes de buscar la sesión: si no coincide, el
            // stop llegó mientras se resolvía el track
            if self.stop_epoch(guild_id) != request.ticket.epoch {
                info!("🛑 Play cancelado por stop en guild {}", guild_id);
                if session.queue_len() == 0 {
                    session.teardown(&self.io).await;
                }
                self.release_if_closed(guild_id, &handle, &session);
                return Err(PlaybackError::Cancelled);
            }

            if session.queue_len() >= self.max_queue_size {
                return Err(PlaybackError::QueueFull(self.max_queue_size));
            }

            let result = match session.ensure_connected(request.voice_channel, &self.io).await {
                Ok(()) => session.enqueue(track, request.text_channel, &self.io).await,
                Err(e) => Err(e),
            };
            self.release_if_closed(guild_id, &handle, &session);

            return result.map(|position| Enqueued { title, position });
        }
    }

    pub async fn skip(&self, guild_id: GuildId) -> Result<(), PlaybackError> {
        let (handle, mut session) = self.locked(guild_id, PlaybackError::NothingToSkip).await?;
        let result = session.skip(&self.io).await;
        self.release_if_closed(guild_id, &handle, &session);
        result
    }

    pub async fn pause(&self, guild_id: GuildId) -> Result<(), PlaybackError> {
        let (_, mut session) = self.locked(guild_id, PlaybackError::NothingToPause).await?;
        session.pause(&self.io).await
    }

    pub async fn resume(&self, guild_id: GuildId) -> Result<(), PlaybackError> {
        let (_, mut session) = self.locked(guild_id, PlaybackError::NotPaused).await?;
        session.resume(&self.io).await
    }

    /// Alterna el modo loop. Devuelve el valor nuevo.
    pub async fn toggle_loop(&self, guild_id: GuildId) -> Result<bool, PlaybackError> {
        let (_, mut session) = self.locked(guild_id, PlaybackError::NothingToLoop).await?;
        Ok(session.toggle_loop())
    }

    /// Vacía la cola, detiene el audio y sale de voz. Se puede llamar en
    /// cualquier estado, incluso con un `play` del guild todavía resolviendo.
    pub async fn stop(&self, guild_id: GuildId) -> StopOutcome {
        *self.stop_epochs.entry(guild_id).or_insert(0) += 1;
        self.close(guild_id).await
    }

    /// El bot salió de voz sin pasar por `stop` (lo echaron, borraron el canal).
    ///
    /// El evento del gateway puede llegar después de que un `play` nuevo ya
    /// conectó otra sesión. Si el transporte tiene una llamada activa, el
    /// evento es de la conexión anterior y se ignora.
    pub async fn voice_lost(&self, guild_id: GuildId) {
        let Some(handle) = self.session(guild_id) else {
            return;
        };

        let mut session = handle.lock().await;
        if session.is_closed() {
            return;
        }

        if let Some(channel_id) = self.io.transport.current_channel(guild_id).await {
            debug!(
                "Desconexión obsoleta en guild {}: sigue conectado a {}",
                guild_id, channel_id
            );
            return;
        }

        session.teardown(&self.io).await;
        self.release_if_closed(guild_id, &handle, &session);
        info!("🔌 Sesión de guild {} cerrada por desconexión externa", guild_id);
    }

    pub async fn snapshot(&self, guild_id: GuildId) -> Option<SessionSnapshot> {
        let handle = self.session(guild_id)?;
        let session = handle.lock().await;
        if session.is_closed() {
            return None;
        }
        Some(session.snapshot())
    }

    /// Entrada de los fines de track que devuelve el transporte de voz.
    pub async fn handle_completion(&self, completion: TrackCompletion) {
        let guild_id = completion.guild_id;
        let Some(handle) = self.session(guild_id) else {
            debug!("Completion para guild {} sin sesión", guild_id);
            return;
        };

        let mut session = handle.lock().await;
        if session.complete(completion, &self.io).await {
            self.release_if_closed(guild_id, &handle, &session);
        }
    }

    async fn close(&self, guild_id: GuildId) -> StopOutcome {
        let Some(handle) = self.session(guild_id) else {
            return StopOutcome::NotActive;
        };

        let mut session = handle.lock().await;
        if session.is_closed() {
            return StopOutcome::NotActive;
        }

        session.teardown(&self.io).await;
        self.release_if_closed(guild_id, &handle, &session);
        info!("⏹️ Reproducción detenida en guild {}", guild_id);
        StopOutcome::Stopped
    }

    /// Bloquea la sesión viva del guild, o falla con `absent`.
    async fn locked(
        &self,
        guild_id: GuildId,
        absent: PlaybackError,
    ) -> Result<(SessionHandle, OwnedMutexGuard<GuildSession>), PlaybackError> {
        let handle = self.session(guild_id).ok_or_else(|| absent.clone())?;
        let session = handle.clone().lock_owned().await;
        if session.is_closed() {
            return Err(absent);
        }
        Ok((handle, session))
    }

    fn session(&self, guild_id: GuildId) -> Option<SessionHandle> {
        self.sessions.get(&guild_id).map(|entry| entry.clone())
    }

    fn stop_epoch(&self, guild_id: GuildId) -> u64 {
        self.stop_epochs.get(&guild_id).map(|epoch| *epoch).unwrap_or(0)
    }

    /// Quita una sesión cerrada de la tabla. Se llama con el lock de la sesión
    /// tomado, así nadie ve una sesión cerrada todavía listada.
    fn release_if_closed(&self, guild_id: GuildId, handle: &SessionHandle, session: &GuildSession) {
        if session.is_closed()
            && self
                .sessions
                .remove_if(&guild_id, |_, current| Arc::ptr_eq(current, handle))
                .is_some()
        {
            debug!("Sesión de guild {} eliminada de la tabla", guild_id);
        }
    }
}
