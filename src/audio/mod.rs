//! # Módulo Audio
//!
//! Orquestación de la reproducción por guild.
//!
//! ## Arquitectura
//!
//! ### [`player`] - Tabla de sesiones
//! - Un [`player::AudioPlayer`] por proceso, de guild a sesión
//! - Crea la sesión con el primer `play` y la quita cuando se cierra
//! - Recibe los fines de track del transporte por un canal y los entrega a
//!   la sesión dueña
//!
//! ### [`session`] - Máquina de estados de reproducción
//! - Cola, modo loop, estado de conexión y de reproducción de un guild
//! - El protocolo de avance (siguiente track, repetir en loop, saltar streams
//!   rotos, cerrar con la cola vacía)
//!
//! ### [`queue`] - Cola
//! - FIFO cuyo head es el track que está sonando
//!
//! ### [`transport`] - Transporte de voz
//! - Lo que una sesión maneja (conectar, reproducir, pausar, detener, ...)
//! - Implementación sobre songbird
//!
//! ## Concurrencia
//!
//! El mutex de la sesión serializa comandos y fines de track del mismo guild.
//! Los fines de track nunca corren en el hilo de eventos de songbird: el
//! transporte solo envía un [`events::TrackCompletion`] y el player lo procesa
//! con la sesión bloqueada. Las generaciones salen de un contador global, así
//! que un fin de track de un source ya saltado, detenido o de una sesión
//! anterior nunca coincide con la generación actual y se descarta.

pub mod events;
pub mod player;
pub mod queue;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
