use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides; `__` separates nesting levels.
pub const ENV_PREFIX: &str = "MAGNETKEEPER_";

fn env_overrides() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Defaults with environment variable overrides, for runs without a file
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    Figment::new()
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[rules]
location = "https://rules.example/rules.json"

[speed]
poll_interval_ms = 2000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.rules.location, "https://rules.example/rules.json");
        assert_eq!(config.rules.fetch_timeout_secs, 15);
        assert_eq!(config.speed.poll_interval_ms, 2000);
        assert_eq!(config.probe.timeout_ms, 4500);
    }

    #[test]
    fn test_load_config_from_str_wrong_type() {
        let toml = r#"
[probe]
timeout_ms = "fast"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/magnetkeeper.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[database]
path = "/tmp/bookmarks.db"

[probe]
timeout_ms = 1000
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.database.path.to_string_lossy(), "/tmp/bookmarks.db");
        assert_eq!(config.probe.timeout_ms, 1000);
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("magnetkeeper.toml", "[speed]\npoll_interval_ms = 2000\n")?;
            jail.set_env("MAGNETKEEPER_SPEED__POLL_INTERVAL_MS", "750");
            jail.set_env("MAGNETKEEPER_RULES__LOCATION", "./other.json");

            let config = load_config(Path::new("magnetkeeper.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.speed.poll_interval_ms, 750);
            assert_eq!(config.rules.location, "./other.json");

            let from_env = load_config_from_env().map_err(|e| e.to_string())?;
            assert_eq!(from_env.speed.poll_interval_ms, 750);
            Ok(())
        });
    }
}
