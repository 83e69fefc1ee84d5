use once_cell::sync::Lazy;
use serde::Deserialize;

/// Application configuration, read once from `config.toml` in the working
/// directory. A missing or unreadable file falls back to defaults so the
/// service can start in a clean checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub uploads: UploadsConfig,
    pub duplicate_check: DuplicateCheckConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
    /// Scratch directory for uploaded files. Files here never outlive the
    /// request that created them.
    pub dir: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DuplicateCheckConfig {
    pub lookback_days: i64,
    pub name_similarity_threshold: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "target/db/app.db".to_string(),
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: "target/uploads".to_string(),
        }
    }
}

impl Default for DuplicateCheckConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            name_similarity_threshold: 0.80,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            uploads: UploadsConfig::default(),
            duplicate_check: DuplicateCheckConfig::default(),
        }
    }
}

pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| match std::fs::read_to_string("config.toml") {
    Ok(text) => match toml::from_str(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("config.toml is invalid ({}), using defaults", e);
            AppConfig::default()
        }
    },
    Err(_) => AppConfig::default(),
});

pub fn get() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.duplicate_check.lookback_days, 30);
        assert!(cfg.duplicate_check.name_similarity_threshold > 0.5);
    }

    #[test]
    fn partial_toml_fills_missing_sections() {
        let cfg: AppConfig = toml::from_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.database.path, "target/db/app.db");
    }
}
