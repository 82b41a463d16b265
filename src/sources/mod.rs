pub mod ytdlp;

use async_trait::async_trait;

use crate::error::PlaybackError;

pub use ytdlp::YtDlpResolver;

/// Una pista ya resuelta y lista para reproducir.
///
/// Inmutable una vez resuelta. No tiene identidad más allá de su posición en la cola.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub stream_url: String,
}

impl Track {
    pub fn new(title: impl Into<String>, stream_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            stream_url: stream_url.into(),
        }
    }
}

/// Convierte una búsqueda de texto libre en un [`Track`] reproducible.
///
/// Las implementaciones hacen trabajo de red bloqueante y no deben frenar el
/// hilo del runtime que llama. Un fallo o timeout se reporta como
/// [`PlaybackError::ResolutionFailed`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<Track, PlaybackError>;
}
