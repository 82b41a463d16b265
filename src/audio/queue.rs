use std::collections::VecDeque;
use tracing::{debug, info};

use crate::{error::PlaybackError, sources::Track};

/// Una entrada del listado de la cola (posición 1 = reproduciendo).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub position: usize,
    pub title: String,
}

/// Cola FIFO de un guild.
///
/// Mientras hay reproducción, el head de la cola *es* el track que suena: se
/// quita recién cuando termina. El modo loop lo repite simplemente no
/// quitándolo, y el listado muestra el track activo como ítem 1.
#[derive(Debug)]
pub struct MusicQueue {
    items: VecDeque<Track>,
    loop_enabled: bool,
    max_size: usize,
}

impl MusicQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            loop_enabled: false,
            max_size,
        }
    }

    /// Agrega un track al final y devuelve su posición (1-based)
    pub fn push(&mut self, track: Track) -> Result<usize, PlaybackError> {
        if self.is_full() {
            return Err(PlaybackError::QueueFull(self.max_size));
        }

        info!("➕ Agregado a la cola: {}", track.title);
        self.items.push_back(track);
        Ok(self.items.len())
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max_size
    }

    pub fn head(&self) -> Option<&Track> {
        self.items.front()
    }

    /// El head terminó: se quita salvo que el modo loop lo conserve.
    pub fn finish_head(&mut self) {
        if self.loop_enabled {
            if let Some(head) = self.items.front() {
                info!("🔂 Repitiendo track: {}", head.title);
            }
        } else {
            self.drop_head();
        }
    }

    /// Quita el head sin importar el modo loop
    pub fn drop_head(&mut self) -> Option<Track> {
        let removed = self.items.pop_front();
        if let Some(track) = &removed {
            debug!("⏭️ Quitado de la cola: {}", track.title);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
        info!("🗑️ Cola limpiada");
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.loop_enabled = !self.loop_enabled;
        if self.loop_enabled {
            info!("🔁 Loop activado");
        } else {
            info!("➡️ Loop desactivado");
        }
        self.loop_enabled
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn entries(&self) -> Vec<QueueEntry> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, track)| QueueEntry {
                position: index + 1,
                title: track.title.clone(),
            })
            .collect()
    }
}
