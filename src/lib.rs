//! Núcleo de reproducción del bot de música Hibiscus.
//!
//! Maneja la cola por contexto de voz, la máquina de estados de
//! reproducción y el ciclo de vida de las sesiones frente a los eventos
//! del nodo de audio. La plataforma de chat y el nodo quedan detrás de los
//! traits [`ui::OutputSink`], [`sources::TrackResolver`] y
//! [`node::AudioGateway`].
//!
//! Todo el estado vive en memoria y se pierde al reiniciar el proceso, a
//! propósito: no hay nada que recuperar de una sesión de voz muerta.

pub mod config;
pub mod node;
pub mod player;
pub mod sources;
pub mod ui;

pub use config::Config;
pub use player::reactor::LifecycleReactor;
pub use player::registry::SessionRegistry;
pub use player::response::PlayerResponse;
pub use player::service::PlayerService;
pub use player::{ContextId, SinkId};
