use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identidad del usuario que pidió una canción.
///
/// El avatar solo se usa para decorar los mensajes de "Now Playing",
/// nunca para la lógica de reproducción.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: u64,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl Requester {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar_url: None,
        }
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

impl std::fmt::Display for Requester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Metadatos de una canción tal como los devuelve el resolvedor.
///
/// Este registro nunca se muta después de resolverse; los datos del
/// solicitante viven en [`Track`], no aquí.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub title: String,
    pub author: String,
    pub uri: String,
}

impl TrackInfo {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            uri: uri.into(),
        }
    }
}

/// Una canción lista para entrar a la cola: el registro resuelto más la
/// identidad de quien la pidió.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub info: TrackInfo,
    pub requested_by: Requester,
    pub requested_at: DateTime<Utc>,
}

impl Track {
    pub fn new(info: TrackInfo, requested_by: Requester) -> Self {
        Self {
            info,
            requested_by,
            requested_at: Utc::now(),
        }
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn author(&self) -> &str {
        &self.info.author
    }

    pub fn uri(&self) -> &str {
        &self.info.uri
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} by {}", self.info.title, self.info.author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn track_keeps_resolved_info_intact() {
        let info = TrackInfo::new("Kingston Town", "UB40", "https://tracks.test/ub40");
        let track = Track::new(info.clone(), Requester::new(42, "mel"));

        assert_eq!(track.info, info);
        assert_eq!(track.title(), "Kingston Town");
        assert_eq!(track.requested_by.name, "mel");
    }

    #[test]
    fn display_formats_title_and_author() {
        let track = Track::new(
            TrackInfo::new("Roxanne", "The Police", "https://tracks.test/roxanne"),
            Requester::new(7, "ana").with_avatar("https://cdn.test/ana.png"),
        );

        assert_eq!(track.to_string(), "Roxanne by The Police");
        assert_eq!(track.requested_by.to_string(), "ana");
    }
}
