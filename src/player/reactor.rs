use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::node::NodeEvent;

use super::service::PlayerService;

/// Traduce cada evento externo (nodo de audio, membresía de voz) en
/// exactamente una transición de sesión. Toda la reacción a eventos pasa
/// por [`LifecycleReactor::dispatch`]; no hay callbacks sueltos.
pub struct LifecycleReactor {
    service: Arc<PlayerService>,
}

impl LifecycleReactor {
    pub fn new(service: Arc<PlayerService>) -> Self {
        Self { service }
    }

    pub async fn dispatch(&self, event: NodeEvent) {
        debug!("📬 Evento del nodo: {event:?}");
        match event {
            NodeEvent::Ready { resumed } => {
                // informativo, no muta ninguna sesión
                info!("✅ Nodo de audio listo (resumed: {resumed})");
            }
            NodeEvent::TrackEnd {
                context,
                track,
                reason,
            } => {
                self.service.on_track_finished(context, &track, reason).await;
            }
            NodeEvent::InactivityTimeout { context, elapsed } => {
                self.service.on_inactivity_timeout(context, elapsed).await;
            }
            NodeEvent::VoiceMembershipChanged { context, bot_left } => {
                self.service.on_voice_membership(context, bot_left).await;
            }
        }
    }

    /// Drena el canal de eventos hasta que el emisor se cierre.
    pub async fn run(self, mut events: UnboundedReceiver<NodeEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event).await;
        }
        info!("📪 Canal de eventos del nodo cerrado; reactor terminado");
    }
}
