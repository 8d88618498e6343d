use chrono::{DateTime, Utc};
use tracing::{debug, error};

use super::queue::TrackQueue;
use super::track::Track;
use super::{ContextId, SinkId};

/// Estado de reproducción de una sesión. No existen más estados.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Paused,
}

/// Estado de reproducción de un contexto de voz: la cola, la canción
/// promovida y el destino de los mensajes de estado.
///
/// Invariante: `Playing`/`Paused` implican `current.is_some()`; `Idle`
/// implica `current.is_none()`. Toda transición pasa por los métodos de
/// acá para que [`PlaybackSession::check_invariant`] lo vigile.
///
/// La sesión se muta siempre bajo su `tokio::sync::Mutex` (ver
/// [`SessionRegistry`](super::registry::SessionRegistry)), y cada
/// operación deja el estado consistente antes de cualquier `await`.
#[derive(Debug)]
pub struct PlaybackSession {
    context: ContextId,
    queue: TrackQueue,
    current: Option<Track>,
    status: PlaybackStatus,
    sink: SinkId,
    last_activity: DateTime<Utc>,
    detached: bool,
}

impl PlaybackSession {
    pub fn new(context: ContextId, sink: SinkId, max_queue_size: usize) -> Self {
        Self {
            context,
            queue: TrackQueue::new(max_queue_size),
            current: None,
            status: PlaybackStatus::Idle,
            sink,
            last_activity: Utc::now(),
            detached: false,
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn sink(&self) -> SinkId {
        self.sink
    }

    /// Actualiza el destino de mensajes; cada comando trae el canal desde
    /// donde se invocó.
    pub fn set_sink(&mut self, sink: SinkId) {
        self.sink = sink;
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Una sesión desprendida ya salió del registro; cualquier handler
    /// rezagado que la alcance debe tratarla como no-op.
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn queue(&self) -> &TrackQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut TrackQueue {
        &mut self.queue
    }

    /// Promueve la siguiente canción de la cola. Devuelve la canción a
    /// reproducir, o `None` si la cola se agotó y la sesión quedó `Idle`.
    ///
    /// El estado queda consistente al retornar: quien llama recién después
    /// hace el `await` del comando de reproducción al nodo.
    pub fn promote_next(&mut self) -> Option<Track> {
        self.current = None;
        match self.queue.pop_next() {
            Some(track) => {
                self.current = Some(track.clone());
                self.status = PlaybackStatus::Playing;
                self.touch();
                self.check_invariant();
                Some(track)
            }
            None => {
                self.status = PlaybackStatus::Idle;
                self.check_invariant();
                None
            }
        }
    }

    /// Deshace una promoción cuyo play al nodo falló: la canción vuelve al
    /// frente de la cola y la sesión queda como antes del intento.
    pub fn rollback_promotion(&mut self, track: Track) {
        self.current = None;
        self.status = PlaybackStatus::Idle;
        // recién salió de la cola, hay lugar garantizado
        let _ = self.queue.push_front(track);
        self.check_invariant();
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.status = if paused {
            PlaybackStatus::Paused
        } else {
            PlaybackStatus::Playing
        };
        self.touch();
        self.check_invariant();
    }

    /// Vuelve a `Idle` limpiando cola y canción actual. Devuelve cuántas
    /// canciones había encoladas.
    pub fn reset(&mut self) -> usize {
        let cleared = self.queue.clear();
        self.current = None;
        self.status = PlaybackStatus::Idle;
        self.check_invariant();
        cleared
    }

    /// Desprende la sesión al destruirla: limpia todo y marca `detached`
    /// para que los eventos tardíos no la resuciten.
    pub fn detach(&mut self) {
        self.reset();
        self.detached = true;
        debug!("Sesión {} desprendida", self.context);
    }

    /// Vigila el invariante estado/canción: panic en debug, log y reset
    /// forzado en release.
    fn check_invariant(&mut self) {
        let broken = match self.status {
            PlaybackStatus::Idle => self.current.is_some(),
            PlaybackStatus::Playing | PlaybackStatus::Paused => self.current.is_none(),
        };
        debug_assert!(
            !broken,
            "invariante roto en {}: status {:?} con current {:?}",
            self.context, self.status, self.current
        );
        if broken {
            error!(
                "❌ Invariante roto en {}: status {:?} sin canción coherente; reseteando sesión",
                self.context, self.status
            );
            self.queue.clear();
            self.current = None;
            self.status = PlaybackStatus::Idle;
        }
    }
}
