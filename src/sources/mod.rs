//! Resolución de búsquedas a canciones.
//!
//! El núcleo no sabe buscar: le entrega el texto libre a un
//! [`TrackResolver`] y recibe cero, una o una playlist de canciones.
//! Cero resultados y errores del resolvedor se tratan igual aguas arriba:
//! se reporta al usuario y no cambia ningún estado.

use async_trait::async_trait;

use crate::player::track::TrackInfo;

/// Resultado de una búsqueda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Sin resultados.
    None,
    /// Un único match.
    Track(TrackInfo),
    /// Una playlist completa.
    Playlist { name: String, tracks: Vec<TrackInfo> },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> anyhow::Result<Resolved>;
}

/// Resolvedor con catálogo fijo, para la demo y los tests de integración.
///
/// Resuelve por substring del título; las consultas `playlist:<nombre>`
/// devuelven la playlist con ese nombre.
pub struct StaticResolver {
    catalog: Vec<TrackInfo>,
    playlists: Vec<(String, Vec<TrackInfo>)>,
}

impl StaticResolver {
    pub fn new(catalog: Vec<TrackInfo>) -> Self {
        Self {
            catalog,
            playlists: Vec::new(),
        }
    }

    pub fn with_playlist(mut self, name: impl Into<String>, tracks: Vec<TrackInfo>) -> Self {
        self.playlists.push((name.into(), tracks));
        self
    }

    /// Catálogo de muestra para el binario de demo.
    pub fn demo() -> Self {
        let catalog = vec![
            TrackInfo::new("Red Red Wine", "UB40", "https://tracks.test/red-red-wine"),
            TrackInfo::new("Kingston Town", "UB40", "https://tracks.test/kingston-town"),
            TrackInfo::new("Roxanne", "The Police", "https://tracks.test/roxanne"),
            TrackInfo::new(
                "Message in a Bottle",
                "The Police",
                "https://tracks.test/message-in-a-bottle",
            ),
            TrackInfo::new("Is This Love", "Bob Marley", "https://tracks.test/is-this-love"),
        ];
        let chill = vec![
            TrackInfo::new(
                "Three Little Birds",
                "Bob Marley",
                "https://tracks.test/three-little-birds",
            ),
            TrackInfo::new(
                "Buffalo Soldier",
                "Bob Marley",
                "https://tracks.test/buffalo-soldier",
            ),
            TrackInfo::new("Jamming", "Bob Marley", "https://tracks.test/jamming"),
        ];
        Self::new(catalog).with_playlist("chill", chill)
    }
}

#[async_trait]
impl TrackResolver for StaticResolver {
    async fn resolve(&self, query: &str) -> anyhow::Result<Resolved> {
        if let Some(name) = query.strip_prefix("playlist:") {
            let name = name.trim();
            return Ok(self
                .playlists
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(n, tracks)| Resolved::Playlist {
                    name: n.clone(),
                    tracks: tracks.clone(),
                })
                .unwrap_or(Resolved::None));
        }

        let query = query.to_lowercase();
        Ok(self
            .catalog
            .iter()
            .find(|info| info.title.to_lowercase().contains(&query))
            .map(|info| Resolved::Track(info.clone()))
            .unwrap_or(Resolved::None))
    }
}
