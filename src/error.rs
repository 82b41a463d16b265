use thiserror::Error;

/// Errores de las operaciones de reproducción.
///
/// El texto `Display` de cada variante es lo que se responde en el chat.
/// Ninguno es fatal: cada uno afecta solo al guild y al comando que lo produjo.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("You must be in a voice channel to play music!")]
    NotInVoiceChannel,

    #[error("Nothing is playing right now!")]
    NothingToPause,

    #[error("Music isn’t paused!")]
    NotPaused,

    #[error("No music is playing to skip!")]
    NothingToSkip,

    #[error("No music is playing to loop!")]
    NothingToLoop,

    #[error("Couldn't find anything to play: {0}")]
    ResolutionFailed(String),

    #[error("Couldn't join your voice channel: {0}")]
    Connection(String),

    #[error("Couldn't start playback: {0}")]
    PlaybackStart(String),

    #[error("The queue is full (max {0} songs)")]
    QueueFull(usize),

    #[error("Playback was stopped before the song could be queued.")]
    Cancelled,
}

impl PlaybackError {
    /// Se pidió algo que el estado actual no permite.
    pub fn is_user_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotInVoiceChannel
                | Self::NothingToPause
                | Self::NotPaused
                | Self::NothingToSkip
                | Self::NothingToLoop
                | Self::QueueFull(_)
        )
    }
}
