//! Frontera de salida hacia el chat.
//!
//! El núcleo nunca redacta embeds: entrega una [`Notification`] semántica
//! y el borde de plataforma la pinta. Las fallas de entrega se loguean y
//! jamás tumban la sesión.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::player::track::Track;
use crate::player::SinkId;

/// Avisos asíncronos del reproductor (no son respuestas a comandos).
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Arrancó a sonar una canción.
    NowPlaying { track: Track },
    /// Se agotó la cola.
    QueueEmpty,
    /// El bot se va por inactividad.
    InactivityDisconnect { elapsed: Duration },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn notify(&self, sink: SinkId, notification: Notification) -> anyhow::Result<()>;
}

/// Sink que solo escribe al log; lo usa el binario de demo.
pub struct TraceSink;

#[async_trait]
impl OutputSink for TraceSink {
    async fn notify(&self, sink: SinkId, notification: Notification) -> anyhow::Result<()> {
        match notification {
            Notification::NowPlaying { track } => {
                info!(
                    "🎵 [{sink}] Now Playing: {} (pedida por {})",
                    track, track.requested_by
                );
            }
            Notification::QueueEmpty => {
                info!("📭 [{sink}] La cola está vacía, ¡agregá más canciones!");
            }
            Notification::InactivityDisconnect { elapsed } => {
                info!(
                    "👋 [{sink}] Reproductor inactivo por {}. ¡Chau!",
                    humantime::format_duration(elapsed)
                );
            }
        }
        Ok(())
    }
}

/// Sink en memoria que acumula los avisos, para asserts en tests.
#[derive(Clone, Default)]
pub struct MemorySink {
    notes: Arc<Mutex<Vec<(SinkId, Notification)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<(SinkId, Notification)> {
        self.notes.lock().clone()
    }

    pub fn clear(&self) {
        self.notes.lock().clear();
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn notify(&self, sink: SinkId, notification: Notification) -> anyhow::Result<()> {
        self.notes.lock().push((sink, notification));
        Ok(())
    }
}

/// Loguea la notificación que no se pudo entregar; nunca propaga la falla.
pub(crate) fn report_delivery_failure(sink: SinkId, error: &anyhow::Error) {
    warn!("📨 No se pudo notificar al canal {sink}: {error:#}");
}
