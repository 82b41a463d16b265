use serenity::model::id::GuildId;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Cómo terminó un source de audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// Terminó solo o fue detenido.
    Finished,
    /// El transporte no pudo reproducir el stream.
    Failed,
}

/// Mensaje del lado de audio hacia el player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackCompletion {
    pub guild_id: GuildId,
    /// Identifica a qué source iniciado pertenece este fin.
    pub generation: u64,
    pub kind: CompletionKind,
}

/// Se entrega al transporte de voz junto con cada source que reproduce.
///
/// El transporte lo dispara desde su propio hilo cuando el source termina.
/// Dispararlo solo encola un [`TrackCompletion`]: el avance corre en el player
/// con el lock del guild, nunca en el hilo de audio.
#[derive(Debug, Clone)]
pub struct CompletionNotifier {
    guild_id: GuildId,
    generation: u64,
    tx: UnboundedSender<TrackCompletion>,
}

impl CompletionNotifier {
    pub fn new(guild_id: GuildId, generation: u64, tx: UnboundedSender<TrackCompletion>) -> Self {
        Self {
            guild_id,
            generation,
            tx,
        }
    }

    pub fn notify(&self, kind: CompletionKind) {
        let completion = TrackCompletion {
            guild_id: self.guild_id,
            generation: self.generation,
            kind,
        };

        if self.tx.send(completion).is_err() {
            debug!("Player cerrado, se descarta {:?}", completion);
        }
    }
}
