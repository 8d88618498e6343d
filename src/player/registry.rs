use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::session::PlaybackSession;
use super::{ContextId, SinkId};

/// Mapa proceso-global de contexto → sesión.
///
/// La creación es single-flight: el entry de `DashMap` serializa por clave,
/// así dos `get_or_create` concurrentes para el mismo contexto convergen en
/// la misma sesión. La sesión en sí se muta bajo su propio `Mutex`, que
/// además serializa todas las operaciones de un contexto.
pub struct SessionRegistry {
    sessions: DashMap<ContextId, Arc<Mutex<PlaybackSession>>>,
    max_queue_size: usize,
}

impl SessionRegistry {
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_queue_size,
        }
    }

    /// Devuelve la sesión del contexto, creándola si no existe. El bool
    /// marca si esta llamada la creó: con llamadas concurrentes para el
    /// mismo contexto exactamente una lo ve en `true`.
    pub fn get_or_create(
        &self,
        context: ContextId,
        sink: SinkId,
    ) -> (Arc<Mutex<PlaybackSession>>, bool) {
        let mut created = false;
        let session = self
            .sessions
            .entry(context)
            .or_insert_with(|| {
                created = true;
                info!("🆕 Sesión creada para {}", context);
                Arc::new(Mutex::new(PlaybackSession::new(
                    context,
                    sink,
                    self.max_queue_size,
                )))
            })
            .clone();
        (session, created)
    }

    /// Solo busca, nunca crea.
    pub fn get(&self, context: ContextId) -> Option<Arc<Mutex<PlaybackSession>>> {
        self.sessions.get(&context).map(|entry| entry.clone())
    }

    /// Saca la sesión del mapa. Seguro de llamar cuando no existe; quien
    /// llama se encarga de desprender la sesión devuelta.
    pub fn remove(&self, context: ContextId) -> Option<Arc<Mutex<PlaybackSession>>> {
        let removed = self.sessions.remove(&context).map(|(_, session)| session);
        if removed.is_some() {
            info!("🗑️ Sesión de {} quitada del registro", context);
        } else {
            debug!("Sesión de {} ya no estaba registrada", context);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
