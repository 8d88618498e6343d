use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Nodo de audio (hay exactamente una conexión por proceso)
    pub node_host: String,
    pub node_port: u16,
    pub node_password: String,
    pub node_identifier: String,

    // Reproductor
    pub inactivity_timeout_secs: u64,
    pub max_queue_size: usize,
    pub songs_per_page: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            // Nodo
            node_host: std::env::var("NODE_HOST").unwrap_or_else(|_| "localhost".to_string()),
            node_port: std::env::var("NODE_PORT")
                .unwrap_or_else(|_| "2333".to_string())
                .parse()?,
            node_password: std::env::var("NODE_PASSWORD")
                .unwrap_or_else(|_| "youshallnotpass".to_string()),
            node_identifier: std::env::var("NODE_IDENTIFIER")
                .unwrap_or_else(|_| "hibiscus".to_string()),

            // Reproductor
            inactivity_timeout_secs: std::env::var("INACTIVITY_TIMEOUT")
                .unwrap_or_else(|_| "180".to_string())
                .parse()?,
            max_queue_size: std::env::var("MAX_QUEUE_SIZE")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
            songs_per_page: std::env::var("SONGS_PER_PAGE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Chequeos de sanidad sobre los valores cargados.
    pub fn validate(&self) -> Result<()> {
        if self.inactivity_timeout_secs == 0 {
            anyhow::bail!("El timeout de inactividad debe ser mayor a 0");
        }
        if self.max_queue_size == 0 {
            anyhow::bail!("El tamaño máximo de cola debe ser mayor a 0");
        }
        if self.songs_per_page == 0 {
            anyhow::bail!("Las canciones por página deben ser más de 0");
        }
        if self.node_host.is_empty() {
            anyhow::bail!("El host del nodo no puede estar vacío");
        }
        Ok(())
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }

    /// Resumen para el log de arranque, sin secretos.
    pub fn summary(&self) -> String {
        format!(
            "Config: nodo {}@{}:{} | timeout {}s | cola máx {} | {} por página",
            self.node_identifier,
            self.node_host,
            self.node_port,
            self.inactivity_timeout_secs,
            self.max_queue_size,
            self.songs_per_page
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_host: "localhost".into(),
            node_port: 2333,
            node_password: "youshallnotpass".into(),
            node_identifier: "hibiscus".into(),
            inactivity_timeout_secs: 180,
            max_queue_size: 1000,
            songs_per_page: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.inactivity_timeout(), Duration::from_secs(180));
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let mut config = Config::default();
        config.max_queue_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.inactivity_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.songs_per_page = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn summary_hides_the_password() {
        let config = Config::default();
        assert!(!config.summary().contains("youshallnotpass"));
    }
}
