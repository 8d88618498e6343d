use super::queue::QueueSnapshot;
use super::track::Track;

/// Resultado semántico de un comando del reproductor.
///
/// El núcleo nunca redacta el texto final para el usuario: devuelve uno de
/// estos resultados y el borde de chat decide el embed. Los casos "de
/// error" (NotConnected, OutOfRange, etc.) son respuestas accionables por
/// el usuario, no fallas.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerResponse {
    /// Se promovió una canción y empezó a sonar.
    NowPlaying { track: Track },
    /// La canción entró a la cola en `position` (1-based).
    Enqueued { track: Track, position: usize },
    /// La canción entró al frente de la cola.
    EnqueuedNext { track: Track },
    /// Entró una playlist completa. `front_rejected` avisa que se pidió al
    /// frente y se cayó al final de la cola.
    PlaylistEnqueued {
        name: String,
        count: usize,
        front_rejected: bool,
    },
    /// Pausado correctamente.
    Paused { track: Track },
    /// Reanudado correctamente.
    Resumed { track: Track },
    /// Se saltó la canción; `next` es lo que empezó a sonar, si había algo.
    Skipped {
        skipped: Track,
        next: Option<Track>,
    },
    /// Reproducción detenida, cola limpiada y sesión cerrada.
    Stopped { cleared: usize },
    /// Vista inmutable de la cola para paginar.
    Queue { snapshot: QueueSnapshot },
    /// Canción movida de `from` a `to`.
    Moved {
        track: Track,
        from: usize,
        to: usize,
    },
    /// Canción quitada de la cola.
    Removed { track: Track, position: usize },
    /// Cola mezclada.
    Shuffled { snapshot: QueueSnapshot },
    /// Cola vaciada.
    Cleared { count: usize },

    // Respuestas accionables por el usuario
    /// El bot no está conectado en ese contexto.
    NotConnected,
    /// No hay canción sonando.
    NothingPlaying,
    /// Ya estaba en pausa.
    AlreadyPaused,
    /// No estaba en pausa.
    NotPaused,
    /// La cola está vacía.
    QueueEmpty,
    /// La cola ya estaba vacía.
    AlreadyEmpty,
    /// Posición fuera de rango (1-based) para una cola de `len` canciones.
    OutOfRange { pos: usize, len: usize },
    /// La cola llegó a su tamaño máximo.
    QueueFull { max: usize },
    /// La búsqueda no devolvió nada (o el resolvedor falló; se tratan igual).
    NoMatches { query: String },
    /// Falló la conexión de voz o el comando al nodo; el estado quedó como
    /// antes del intento.
    ConnectionFailed,
}
