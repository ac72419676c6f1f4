use std::{collections::HashMap, fs};

#[derive(Debug)]
pub struct Settings {
    /// Which backend owns the city log: "document" or "rest".
    pub backend: String,
    pub rest_url: String,
    pub database_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: "document".into(),
            rest_url: cities_core::DEFAULT_REST_BASE_URL.into(),
            database_url: "sqlite://./data/cities.db".into(),
        }
    }
}

/// Defaults, overridden by `cities.toml` in the working directory,
/// overridden by environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("cities.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("backend") {
                settings.backend = v.clone();
            }
            if let Some(v) = file_cfg.get("rest_url") {
                settings.rest_url = v.clone();
            }
            if let Some(v) = file_cfg.get("database_url") {
                settings.database_url = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("CITIES_BACKEND") {
        settings.backend = v;
    }
    if let Ok(v) = std::env::var("CITIES_REST_URL") {
        settings.rest_url = v;
    }
    if let Ok(v) = std::env::var("CITIES_DATABASE_URL") {
        settings.database_url = v;
    }

    settings
}

/// Accepts bare file paths and `sqlite:` shorthands alongside full URLs, so
/// `--database-url ./data/cities.db` just works.
pub fn prepare_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}
