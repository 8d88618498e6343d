//! Frontera con el nodo de audio remoto.
//!
//! El núcleo no maneja la conexión del nodo: le habla por [`AudioGateway`]
//! y consume los [`NodeEvent`] que el nodo emite. Siempre hay exactamente
//! una conexión de nodo por proceso.

use async_trait::async_trait;
use std::time::Duration;

use crate::player::track::Track;
use crate::player::ContextId;

pub mod memory;

pub use memory::MemoryNode;

/// Por qué terminó una canción, según el protocolo del nodo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEndReason {
    /// Terminó de forma natural.
    Finished,
    /// No se pudo cargar/reproducir.
    LoadFailed,
    /// Se detuvo con un comando de stop.
    Stopped,
    /// Otra canción la reemplazó (skip / play encima).
    Replaced,
}

impl TrackEndReason {
    /// Si este fin habilita arrancar la siguiente canción. `Stopped` y
    /// `Replaced` no: quien emitió el comando ya decidió qué sigue.
    pub fn may_start_next(self) -> bool {
        matches!(self, Self::Finished | Self::LoadFailed)
    }
}

/// Eventos externos que consume el reactor, uno por variante con
/// exactamente el payload que necesita.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// El nodo quedó listo. Informativo, no muta sesiones.
    Ready { resumed: bool },
    /// Terminó la canción `track` en un contexto.
    TrackEnd {
        context: ContextId,
        track: Track,
        reason: TrackEndReason,
    },
    /// El reproductor de un contexto estuvo inactivo demasiado tiempo.
    InactivityTimeout {
        context: ContextId,
        elapsed: Duration,
    },
    /// Cambió la membresía del canal de voz; `bot_left` marca que el bot
    /// salió (o lo sacaron).
    VoiceMembershipChanged { context: ContextId, bot_left: bool },
}

/// Comandos que el núcleo le manda al nodo de audio.
///
/// Las fallas son transitorias de infraestructura: el que llama las
/// reporta como `ConnectionFailed` y deja el estado como estaba.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioGateway: Send + Sync {
    /// Une el bot al canal de voz del contexto.
    async fn connect(&self, context: ContextId) -> anyhow::Result<()>;

    /// Reproduce `track`, reemplazando lo que estuviera sonando.
    async fn play(&self, context: ContextId, track: &Track) -> anyhow::Result<()>;

    /// Pausa o reanuda la canción actual.
    async fn set_paused(&self, context: ContextId, paused: bool) -> anyhow::Result<()>;

    /// Detiene la canción actual sin desconectar.
    async fn stop(&self, context: ContextId) -> anyhow::Result<()>;

    /// Desconecta el bot del canal de voz (forzado, siempre limpia).
    async fn disconnect(&self, context: ContextId) -> anyhow::Result<()>;
}
