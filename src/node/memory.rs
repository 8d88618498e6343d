//! Nodo de audio en memoria.
//!
//! Reemplaza al nodo remoto en el binario de demostración y en los tests
//! de integración: registra los comandos que recibe y emite los mismos
//! eventos que emitiría un nodo real.

use anyhow::bail;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::{AudioGateway, NodeEvent, TrackEndReason};
use crate::player::track::Track;
use crate::player::ContextId;

#[derive(Debug, Default)]
struct Channel {
    current: Option<Track>,
    paused: bool,
    /// Crece con cada play/stop; las tareas de auto-fin comparan contra
    /// esto para no reportar el fin de una canción ya reemplazada.
    seq: u64,
}

struct Inner {
    channels: Mutex<HashMap<ContextId, Channel>>,
    calls: Mutex<Vec<String>>,
    events: UnboundedSender<NodeEvent>,
    fail_next_connect: AtomicBool,
    /// Si está presente, cada canción "termina" sola después de este tiempo.
    track_length: Option<Duration>,
}

/// Nodo falso con la misma superficie observable que el real.
#[derive(Clone)]
pub struct MemoryNode {
    inner: Arc<Inner>,
}

impl MemoryNode {
    pub fn new(events: UnboundedSender<NodeEvent>) -> Self {
        Self::build(events, None)
    }

    /// Las canciones terminan solas después de `length` (para la demo).
    pub fn with_track_length(events: UnboundedSender<NodeEvent>, length: Duration) -> Self {
        Self::build(events, Some(length))
    }

    fn build(events: UnboundedSender<NodeEvent>, track_length: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Inner {
                channels: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                events,
                fail_next_connect: AtomicBool::new(false),
                track_length,
            }),
        }
    }

    fn log(&self, call: String) {
        self.inner.calls.lock().push(call);
    }

    fn emit(&self, event: NodeEvent) {
        // el receptor puede haberse cerrado al apagar; no es una falla
        let _ = self.inner.events.send(event);
    }

    /// Historial de comandos recibidos, para asserts en tests.
    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().clone()
    }

    pub fn is_connected(&self, context: ContextId) -> bool {
        self.inner.channels.lock().contains_key(&context)
    }

    pub fn is_paused(&self, context: ContextId) -> bool {
        self.inner
            .channels
            .lock()
            .get(&context)
            .map(|c| c.paused)
            .unwrap_or(false)
    }

    pub fn current(&self, context: ContextId) -> Option<Track> {
        self.inner
            .channels
            .lock()
            .get(&context)
            .and_then(|c| c.current.clone())
    }

    /// El próximo `connect` falla, para probar el rollback de conexión.
    pub fn fail_next_connect(&self) {
        self.inner.fail_next_connect.store(true, Ordering::SeqCst);
    }

    /// Termina la canción actual de forma natural y emite el evento.
    pub fn finish_current(&self, context: ContextId) -> bool {
        let ended = {
            let mut channels = self.inner.channels.lock();
            match channels.get_mut(&context) {
                Some(channel) => {
                    channel.seq += 1;
                    channel.current.take()
                }
                None => None,
            }
        };
        match ended {
            Some(track) => {
                self.emit(NodeEvent::TrackEnd {
                    context,
                    track,
                    reason: TrackEndReason::Finished,
                });
                true
            }
            None => false,
        }
    }

    pub fn emit_ready(&self, resumed: bool) {
        self.emit(NodeEvent::Ready { resumed });
    }

    pub fn emit_inactivity(&self, context: ContextId, elapsed: Duration) {
        self.emit(NodeEvent::InactivityTimeout { context, elapsed });
    }

    pub fn emit_bot_left(&self, context: ContextId) {
        self.emit(NodeEvent::VoiceMembershipChanged {
            context,
            bot_left: true,
        });
    }
}

#[async_trait::async_trait]
impl AudioGateway for MemoryNode {
    async fn connect(&self, context: ContextId) -> anyhow::Result<()> {
        if self.inner.fail_next_connect.swap(false, Ordering::SeqCst) {
            bail!("el nodo rechazó la conexión de voz");
        }
        self.inner.channels.lock().entry(context).or_default();
        self.log(format!("connect {context}"));
        Ok(())
    }

    async fn play(&self, context: ContextId, track: &Track) -> anyhow::Result<()> {
        let (replaced, seq) = {
            let mut channels = self.inner.channels.lock();
            let channel = channels.entry(context).or_default();
            let replaced = channel.current.replace(track.clone());
            channel.paused = false;
            channel.seq += 1;
            (replaced, channel.seq)
        };
        self.log(format!("play {context} {}", track.uri()));

        if let Some(old) = replaced {
            self.emit(NodeEvent::TrackEnd {
                context,
                track: old,
                reason: TrackEndReason::Replaced,
            });
        }

        if let Some(length) = self.inner.track_length {
            let node = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(length).await;
                let still_current = node
                    .inner
                    .channels
                    .lock()
                    .get(&context)
                    .map(|c| c.seq == seq)
                    .unwrap_or(false);
                if still_current {
                    debug!("⏱️ Fin natural programado en {context}");
                    node.finish_current(context);
                }
            });
        }
        Ok(())
    }

    async fn set_paused(&self, context: ContextId, paused: bool) -> anyhow::Result<()> {
        if let Some(channel) = self.inner.channels.lock().get_mut(&context) {
            channel.paused = paused;
        }
        self.log(format!("set_paused {context} {paused}"));
        Ok(())
    }

    async fn stop(&self, context: ContextId) -> anyhow::Result<()> {
        let stopped = {
            let mut channels = self.inner.channels.lock();
            match channels.get_mut(&context) {
                Some(channel) => {
                    channel.seq += 1;
                    channel.current.take()
                }
                None => None,
            }
        };
        self.log(format!("stop {context}"));
        if let Some(track) = stopped {
            self.emit(NodeEvent::TrackEnd {
                context,
                track,
                reason: TrackEndReason::Stopped,
            });
        }
        Ok(())
    }

    async fn disconnect(&self, context: ContextId) -> anyhow::Result<()> {
        self.inner.channels.lock().remove(&context);
        self.log(format!("disconnect {context}"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::track::{Requester, TrackInfo};
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    fn track(title: &str) -> Track {
        Track::new(
            TrackInfo::new(title, "artista", format!("https://tracks.test/{title}")),
            Requester::new(1, "tester"),
        )
    }

    #[tokio::test]
    async fn play_over_play_emits_replaced() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let node = MemoryNode::new(tx);
        let ctx = ContextId(1);

        node.connect(ctx).await.unwrap();
        node.play(ctx, &track("a")).await.unwrap();
        node.play(ctx, &track("b")).await.unwrap();

        let event = rx.recv().await.unwrap();
        match event {
            NodeEvent::TrackEnd { track, reason, .. } => {
                assert_eq!(track.title(), "a");
                assert_eq!(reason, TrackEndReason::Replaced);
            }
            other => panic!("evento inesperado: {other:?}"),
        }
        assert_eq!(node.current(ctx).unwrap().title(), "b");
    }

    #[tokio::test]
    async fn stop_emits_stopped_and_clears_current() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let node = MemoryNode::new(tx);
        let ctx = ContextId(1);

        node.connect(ctx).await.unwrap();
        node.play(ctx, &track("a")).await.unwrap();
        node.stop(ctx).await.unwrap();

        match rx.recv().await.unwrap() {
            NodeEvent::TrackEnd { reason, .. } => assert_eq!(reason, TrackEndReason::Stopped),
            other => panic!("evento inesperado: {other:?}"),
        }
        assert_eq!(node.current(ctx), None);
    }

    #[tokio::test]
    async fn finish_current_is_noop_without_track() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let node = MemoryNode::new(tx);
        assert!(!node.finish_current(ContextId(9)));
    }

    #[tokio::test]
    async fn failed_connect_only_fails_once() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let node = MemoryNode::new(tx);
        node.fail_next_connect();

        assert!(node.connect(ContextId(1)).await.is_err());
        assert!(node.connect(ContextId(1)).await.is_ok());
    }
}
