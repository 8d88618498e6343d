//! # Playback Session Manager
//!
//! El corazón del bot: la cola por contexto, la máquina de estados de
//! reproducción, el registro de sesiones y el reactor de eventos del nodo.
//!
//! ## Arquitectura
//!
//! - [`queue::TrackQueue`]: cola FIFO mutable con posiciones públicas 1-based
//! - [`session::PlaybackSession`]: estado por contexto (Idle/Playing/Paused)
//! - [`registry::SessionRegistry`]: mapa contexto → sesión, single-flight
//! - [`service::PlayerService`]: la superficie de comandos
//! - [`reactor::LifecycleReactor`]: consume los eventos del nodo/voz
//!
//! Todas las operaciones de un contexto se serializan con el `Mutex` de su
//! sesión; el estado queda consistente antes de cada `await` hacia el nodo.

use serde::{Deserialize, Serialize};

pub mod queue;
pub mod reactor;
pub mod registry;
pub mod response;
pub mod service;
pub mod session;
pub mod track;

/// Identificador opaco del contexto de voz (el equivalente a un guild).
/// Puede existir a lo sumo una sesión activa por contexto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(pub u64);

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctx:{}", self.0)
    }
}

/// Identificador opaco del canal al que van los mensajes de estado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SinkId(pub u64);

impl std::fmt::Display for SinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
