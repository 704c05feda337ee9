use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Directory that holds database files selected by `DB_NAME`
pub const DATABASE_DIR: &str = "database";
pub const DEFAULT_DB_FILE: &str = "music_library.db";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub database: Database,
    pub http: HttpConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.to_string_lossy()))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }

    /// Loads the config file if one is given, then applies process environment overrides
    pub fn resolve(path: Option<&Path>) -> anyhow::Result<Config> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// `PORT`, `DB_NAME` and `DB_PATH` take precedence over the file.
    /// `DB_PATH` wins over `DB_NAME` when both are set.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(port) = lookup("PORT") {
            self.http.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{port}'"))?;
        }

        if let Some(name) = lookup("DB_NAME").filter(|n| !n.is_empty()) {
            self.database.path = Path::new(DATABASE_DIR).join(name);
        }

        if let Some(path) = lookup("DB_PATH").filter(|p| !p.is_empty()) {
            self.database.path = PathBuf::from(path);
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Database {
    pub in_memory: bool,
    pub path: PathBuf,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            in_memory: false,
            path: Path::new(DATABASE_DIR).join(DEFAULT_DB_FILE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, io::Write};

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_parse_config_toml() -> anyhow::Result<()> {
        let toml_str = r#"
[database]
in_memory = true

[http]
bind_addr = "127.0.0.1"
port = 8080
"#;

        let cfg: Config = toml::from_str(toml_str)?;

        assert!(cfg.database.in_memory);
        assert_eq!(cfg.http.bind_addr, "127.0.0.1");
        assert_eq!(cfg.http.port, 8080);

        Ok(())
    }

    #[test]
    fn test_parse_file_database_config() -> anyhow::Result<()> {
        let toml_str = r#"
[database]
path = "/tmp/tracks.db"
"#;

        let cfg: Config = toml::from_str(toml_str)?;

        assert!(!cfg.database.in_memory);
        assert_eq!(cfg.database.path, PathBuf::from("/tmp/tracks.db"));
        // untouched section keeps defaults
        assert_eq!(cfg.http.port, DEFAULT_PORT);

        Ok(())
    }

    #[test]
    fn test_defaults_without_file_or_env() -> anyhow::Result<()> {
        let mut cfg = Config::default();
        cfg.apply_env(env(&[]))?;

        assert_eq!(cfg.http.port, 3000);
        assert_eq!(cfg.database.path, PathBuf::from("database/music_library.db"));
        assert!(!cfg.database.in_memory);

        Ok(())
    }

    #[test]
    fn test_env_overrides_file() -> anyhow::Result<()> {
        let mut cfg: Config = toml::from_str("[http]\nport = 8080\n")?;
        cfg.apply_env(env(&[("PORT", "4000"), ("DB_NAME", "dev.db")]))?;

        assert_eq!(cfg.http.port, 4000);
        assert_eq!(cfg.database.path, PathBuf::from("database").join("dev.db"));

        Ok(())
    }

    #[test]
    fn test_db_path_wins_over_db_name() -> anyhow::Result<()> {
        let mut cfg = Config::default();
        cfg.apply_env(env(&[("DB_NAME", "dev.db"), ("DB_PATH", "/var/lib/tracks.db")]))?;

        assert_eq!(cfg.database.path, PathBuf::from("/var/lib/tracks.db"));

        Ok(())
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut cfg = Config::default();
        assert!(cfg.apply_env(env(&[("PORT", "not-a-port")])).is_err());
    }

    #[test]
    fn test_load_from_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[http]\nbind_addr = \"127.0.0.1\"")?;

        let cfg = Config::load(file.path())?;

        assert_eq!(cfg.http.bind_addr, "127.0.0.1");
        assert_eq!(cfg.http.port, DEFAULT_PORT);

        Ok(())
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(Config::load(Path::new("/nonexistent/tracklist.toml")).is_err());
    }
}
