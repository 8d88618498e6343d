use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info, warn};

use crate::node::{AudioGateway, TrackEndReason};
use crate::sources::{Resolved, TrackResolver};
use crate::ui::{Notification, OutputSink};

use super::queue::QueueError;
use super::registry::SessionRegistry;
use super::response::PlayerResponse;
use super::session::{PlaybackSession, PlaybackStatus};
use super::track::{Requester, Track};
use super::{ContextId, SinkId};

/// La superficie de comandos del reproductor.
///
/// Cada método toma el contexto de voz, serializa contra el `Mutex` de la
/// sesión y devuelve un [`PlayerResponse`] semántico; el borde de chat lo
/// convierte en texto. Acá no se redacta nada para el usuario.
pub struct PlayerService {
    registry: Arc<SessionRegistry>,
    resolver: Arc<dyn TrackResolver>,
    gateway: Arc<dyn AudioGateway>,
    sink: Arc<dyn OutputSink>,
}

/// Resultado interno de promover la siguiente canción.
enum Advanced {
    Started(Track),
    Exhausted,
    Failed,
}

impl PlayerService {
    pub fn new(
        registry: Arc<SessionRegistry>,
        resolver: Arc<dyn TrackResolver>,
        gateway: Arc<dyn AudioGateway>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            registry,
            resolver,
            gateway,
            sink,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Busca `query` y la encola (o la arranca si no suena nada).
    /// `play_next = true` pide el frente de la cola; para playlists eso se
    /// rechaza y caen al final con un aviso.
    pub async fn play(
        &self,
        context: ContextId,
        sink: SinkId,
        requester: Requester,
        query: &str,
        play_next: bool,
    ) -> PlayerResponse {
        let resolved = match self.resolver.resolve(query).await {
            Ok(Resolved::None) => {
                warn!("🔍 Sin resultados para '{query}'");
                return PlayerResponse::NoMatches {
                    query: query.to_string(),
                };
            }
            Ok(resolved) => resolved,
            Err(e) => {
                // falla de resolución == cero resultados: se reporta y no
                // cambia ningún estado
                warn!("🔍 Falló la búsqueda de '{query}': {e:#}");
                return PlayerResponse::NoMatches {
                    query: query.to_string(),
                };
            }
        };

        let (mut session, created) = loop {
            let (session, created) = self.registry.get_or_create(context, sink);
            let guard = session.lock_owned().await;
            if !guard.is_detached() {
                break (guard, created);
            }
            // un stop concurrente la desprendió mientras esperábamos el
            // lock; el registro ya no la tiene, reintentar crea una nueva
        };

        if created {
            if let Err(e) = self.gateway.connect(context).await {
                error!("🔌 No se pudo unir a la voz en {context}: {e:#}");
                // rollback al estado pre-intento: sin sesión registrada
                self.registry.remove(context);
                session.detach();
                return PlayerResponse::ConnectionFailed;
            }
        }

        session.set_sink(sink);
        session.touch();

        match resolved {
            Resolved::Track(info) => {
                self.enqueue_track(&mut session, Track::new(info, requester), play_next)
                    .await
            }
            Resolved::Playlist { name, tracks } => {
                let tracks = tracks
                    .into_iter()
                    .map(|info| Track::new(info, requester.clone()))
                    .collect();
                self.enqueue_playlist(&mut session, name, tracks, play_next)
                    .await
            }
            // ya devuelto arriba al resolver la búsqueda
            Resolved::None => unreachable!("Resolved::None se maneja antes de crear la sesión"),
        }
    }

    pub async fn pause(&self, context: ContextId) -> PlayerResponse {
        let Some(mut session) = self.session_guard(context).await else {
            return PlayerResponse::NotConnected;
        };
        match session.status() {
            PlaybackStatus::Idle => PlayerResponse::NothingPlaying,
            PlaybackStatus::Paused => PlayerResponse::AlreadyPaused,
            PlaybackStatus::Playing => {
                let Some(track) = session.current().cloned() else {
                    return PlayerResponse::NothingPlaying;
                };
                // estado consistente antes del await al nodo
                session.set_paused(true);
                if let Err(e) = self.gateway.set_paused(context, true).await {
                    error!("⏸️ No se pudo pausar en {context}: {e:#}");
                    session.set_paused(false);
                    return PlayerResponse::ConnectionFailed;
                }
                info!("⏸️ Pausado en {context}: {track}");
                PlayerResponse::Paused { track }
            }
        }
    }

    pub async fn resume(&self, context: ContextId) -> PlayerResponse {
        let Some(mut session) = self.session_guard(context).await else {
            return PlayerResponse::NotConnected;
        };
        match session.status() {
            PlaybackStatus::Idle => PlayerResponse::NothingPlaying,
            PlaybackStatus::Playing => PlayerResponse::NotPaused,
            PlaybackStatus::Paused => {
                let Some(track) = session.current().cloned() else {
                    return PlayerResponse::NothingPlaying;
                };
                session.set_paused(false);
                if let Err(e) = self.gateway.set_paused(context, false).await {
                    error!("▶️ No se pudo reanudar en {context}: {e:#}");
                    session.set_paused(true);
                    return PlayerResponse::ConnectionFailed;
                }
                info!("▶️ Reanudado en {context}: {track}");
                PlayerResponse::Resumed { track }
            }
        }
    }

    /// Corta la canción actual y encadena la siguiente; misma ruta de
    /// avance que el fin natural.
    pub async fn skip(&self, context: ContextId) -> PlayerResponse {
        let Some(mut session) = self.session_guard(context).await else {
            return PlayerResponse::NotConnected;
        };
        let Some(skipped) = session.current().cloned() else {
            return PlayerResponse::NothingPlaying;
        };
        info!("⏭️ Saltando en {context}: {skipped}");
        session.touch();

        match self.advance(&mut session).await {
            Advanced::Started(next) => {
                self.notify(
                    session.sink(),
                    Notification::NowPlaying {
                        track: next.clone(),
                    },
                )
                .await;
                PlayerResponse::Skipped {
                    skipped,
                    next: Some(next),
                }
            }
            Advanced::Exhausted => {
                if let Err(e) = self.gateway.stop(context).await {
                    warn!("⏹️ stop tras el salto falló en {context}: {e:#}");
                }
                self.notify(session.sink(), Notification::QueueEmpty).await;
                PlayerResponse::Skipped {
                    skipped,
                    next: None,
                }
            }
            Advanced::Failed => PlayerResponse::ConnectionFailed,
        }
    }

    /// Detiene todo: limpia la cola, corta el nodo y cierra la sesión.
    pub async fn stop(&self, context: ContextId) -> PlayerResponse {
        let Some(mut session) = self.session_guard(context).await else {
            return PlayerResponse::NotConnected;
        };
        if session.status() == PlaybackStatus::Idle {
            return PlayerResponse::NothingPlaying;
        }

        // primero fuera del registro: cualquier evento que llegue ahora ve
        // la sesión desaparecida y se descarta como no-op
        self.registry.remove(context);
        let cleared = session.queue().len();
        session.detach();

        if let Err(e) = self.gateway.stop(context).await {
            warn!("⏹️ stop al nodo falló en {context}: {e:#}");
        }
        if let Err(e) = self.gateway.disconnect(context).await {
            warn!("🔌 disconnect falló en {context}: {e:#}");
        }
        info!("⏹️ Detenido y desconectado de {context} ({cleared} canciones descartadas)");
        PlayerResponse::Stopped { cleared }
    }

    /// Vista paginable de la cola; no muta nada.
    pub async fn queue_view(&self, context: ContextId) -> PlayerResponse {
        let Some(session) = self.session_guard(context).await else {
            return PlayerResponse::NotConnected;
        };
        let snapshot = session.queue().snapshot();
        if snapshot.is_empty() {
            PlayerResponse::QueueEmpty
        } else {
            PlayerResponse::Queue { snapshot }
        }
    }

    pub async fn move_track(&self, context: ContextId, from: usize, to: usize) -> PlayerResponse {
        let Some(mut session) = self.session_guard(context).await else {
            return PlayerResponse::NotConnected;
        };
        if session.queue().is_empty() {
            return PlayerResponse::QueueEmpty;
        }
        session.touch();
        match session.queue_mut().move_track(from, to) {
            Ok(track) => PlayerResponse::Moved { track, from, to },
            Err(err) => Self::queue_rejected(err),
        }
    }

    pub async fn remove_track(&self, context: ContextId, position: usize) -> PlayerResponse {
        let Some(mut session) = self.session_guard(context).await else {
            return PlayerResponse::NotConnected;
        };
        if session.queue().is_empty() {
            return PlayerResponse::QueueEmpty;
        }
        session.touch();
        match session.queue_mut().remove_at(position) {
            Ok(track) => PlayerResponse::Removed { track, position },
            Err(err) => Self::queue_rejected(err),
        }
    }

    pub async fn shuffle(&self, context: ContextId) -> PlayerResponse {
        let Some(mut session) = self.session_guard(context).await else {
            return PlayerResponse::NotConnected;
        };
        if session.queue().is_empty() {
            return PlayerResponse::QueueEmpty;
        }
        session.touch();
        session.queue_mut().shuffle();
        PlayerResponse::Shuffled {
            snapshot: session.queue().snapshot(),
        }
    }

    pub async fn clear(&self, context: ContextId) -> PlayerResponse {
        let Some(mut session) = self.session_guard(context).await else {
            return PlayerResponse::NotConnected;
        };
        if session.queue().is_empty() {
            return PlayerResponse::AlreadyEmpty;
        }
        session.touch();
        let count = session.queue_mut().clear();
        PlayerResponse::Cleared { count }
    }

    // ---- reacciones a eventos externos ----

    /// Terminó `ended` en el nodo. Solo los fines que habilitan encadenar
    /// avanzan la cola; `Stopped`/`Replaced` significan que otro comando ya
    /// decidió qué sigue.
    pub async fn on_track_finished(
        &self,
        context: ContextId,
        ended: &Track,
        reason: TrackEndReason,
    ) {
        if !reason.may_start_next() {
            debug!("Fin de {ended} en {context} por {reason:?}; sin avance");
            return;
        }
        let Some(session) = self.registry.get(context) else {
            debug!("Fin de canción para {context} sin sesión (desconexión forzada); ignorado");
            return;
        };
        let mut session = session.lock_owned().await;
        if session.is_detached() {
            debug!("Fin de canción sobre sesión desprendida de {context}; ignorado");
            return;
        }
        // gana el primero: si un skip concurrente ya reemplazó la canción,
        // este fin llega tarde y no avanza nada
        match session.current() {
            Some(current) if current.uri() == ended.uri() => {}
            _ => {
                debug!("Fin rezagado de {ended} en {context}; no-op");
                return;
            }
        }

        match self.advance(&mut session).await {
            Advanced::Started(track) => {
                self.notify(session.sink(), Notification::NowPlaying { track })
                    .await;
            }
            Advanced::Exhausted => {
                info!("📭 Cola agotada en {context}");
                self.notify(session.sink(), Notification::QueueEmpty).await;
            }
            Advanced::Failed => {
                error!("❌ No se pudo encadenar la siguiente canción en {context}");
            }
        }
    }

    /// El nodo reportó un reproductor inactivo: avisar y desconectar.
    /// Idempotente frente a eventos rezagados para sesiones ya cerradas.
    pub async fn on_inactivity_timeout(&self, context: ContextId, elapsed: Duration) {
        let Some(session) = self.registry.remove(context) else {
            debug!("⏲️ Timeout de inactividad para {context} ya sin sesión; ignorado");
            return;
        };
        let mut session = session.lock_owned().await;
        let sink = session.sink();
        session.detach();

        self.notify(sink, Notification::InactivityDisconnect { elapsed })
            .await;
        if let Err(e) = self.gateway.disconnect(context).await {
            warn!("🔌 disconnect por inactividad falló en {context}: {e:#}");
        }
        info!(
            "👋 Desconectado de {context} por inactividad ({})",
            humantime::format_duration(elapsed)
        );
    }

    /// El bot salió (o lo sacaron) del canal de voz: limpieza forzada.
    pub async fn on_voice_membership(&self, context: ContextId, bot_left: bool) {
        if !bot_left {
            return;
        }
        info!("🔌 El bot salió del canal de voz en {context}");
        let Some(session) = self.registry.remove(context) else {
            debug!("Salida de voz en {context} sin sesión registrada; nada que limpiar");
            return;
        };
        let mut session = session.lock_owned().await;
        session.detach();
        if let Err(e) = self.gateway.disconnect(context).await {
            warn!("🔌 Limpieza de voz falló en {context}: {e:#}");
        }
    }

    // ---- internos ----

    /// Sesión viva del contexto, o `None` si no hay (o ya se desprendió).
    async fn session_guard(&self, context: ContextId) -> Option<OwnedMutexGuard<PlaybackSession>> {
        let session = self.registry.get(context)?;
        let guard = session.lock_owned().await;
        if guard.is_detached() {
            return None;
        }
        Some(guard)
    }

    async fn enqueue_track(
        &self,
        session: &mut PlaybackSession,
        track: Track,
        play_next: bool,
    ) -> PlayerResponse {
        if session.status() == PlaybackStatus::Idle {
            // nada suena: entra a la cola y se promueve de inmediato
            if let Err(err) = session.queue_mut().push(track) {
                return Self::queue_rejected(err);
            }
            return match self.advance(session).await {
                Advanced::Started(track) => {
                    self.notify(
                        session.sink(),
                        Notification::NowPlaying {
                            track: track.clone(),
                        },
                    )
                    .await;
                    PlayerResponse::NowPlaying { track }
                }
                Advanced::Exhausted => PlayerResponse::QueueEmpty,
                Advanced::Failed => PlayerResponse::ConnectionFailed,
            };
        }

        if play_next {
            match session.queue_mut().push_front(track.clone()) {
                Ok(()) => PlayerResponse::EnqueuedNext { track },
                Err(err) => Self::queue_rejected(err),
            }
        } else {
            match session.queue_mut().push(track.clone()) {
                Ok(position) => PlayerResponse::Enqueued { track, position },
                Err(err) => Self::queue_rejected(err),
            }
        }
    }

    async fn enqueue_playlist(
        &self,
        session: &mut PlaybackSession,
        name: String,
        tracks: Vec<Track>,
        play_next: bool,
    ) -> PlayerResponse {
        let mut front_rejected = false;
        let attempt = if play_next {
            match session.queue_mut().push_playlist(tracks.clone(), true) {
                Err(QueueError::PlaylistAtFront) => {
                    warn!("⚠️ Playlist '{name}' pedida al frente; va al final de la cola");
                    front_rejected = true;
                    session.queue_mut().push_playlist(tracks, false)
                }
                other => other,
            }
        } else {
            session.queue_mut().push_playlist(tracks, false)
        };

        let count = match attempt {
            Ok(count) => count,
            Err(err) => return Self::queue_rejected(err),
        };

        if session.status() == PlaybackStatus::Idle {
            match self.advance(session).await {
                Advanced::Started(track) => {
                    self.notify(session.sink(), Notification::NowPlaying { track })
                        .await;
                }
                Advanced::Exhausted => {}
                Advanced::Failed => return PlayerResponse::ConnectionFailed,
            }
        }

        PlayerResponse::PlaylistEnqueued {
            name,
            count,
            front_rejected,
        }
    }

    /// Promueve la siguiente canción y manda el play al nodo. El estado de
    /// la sesión ya quedó consistente cuando arranca el `await`; si el nodo
    /// rechaza el play, la promoción se deshace.
    async fn advance(&self, session: &mut PlaybackSession) -> Advanced {
        match session.promote_next() {
            Some(track) => {
                if let Err(e) = self.gateway.play(session.context(), &track).await {
                    error!(
                        "❌ No se pudo mandar play de {track} en {}: {e:#}",
                        session.context()
                    );
                    session.rollback_promotion(track);
                    return Advanced::Failed;
                }
                Advanced::Started(track)
            }
            None => Advanced::Exhausted,
        }
    }

    async fn notify(&self, sink: SinkId, notification: Notification) {
        if let Err(e) = self.sink.notify(sink, notification).await {
            crate::ui::report_delivery_failure(sink, &e);
        }
    }

    fn queue_rejected(err: QueueError) -> PlayerResponse {
        match err {
            QueueError::OutOfRange { pos, len } => PlayerResponse::OutOfRange { pos, len },
            QueueError::Full { max } => PlayerResponse::QueueFull { max },
            QueueError::PlaylistAtFront => {
                // el fallback de playlist corre antes de llegar acá
                debug_assert!(false, "PlaylistAtFront sin fallback");
                PlayerResponse::QueueFull { max: 0 }
            }
        }
    }
}
