use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub frontend_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Exit at startup instead of serving an "unavailable" page when the
    /// model cannot be loaded.
    pub require_model: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let frontend_dir = if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
            format!("{}/../frontend/dist", manifest_dir)
        } else {
            "/usr/src/app/frontend/dist".to_string()
        };

        Self {
            model_path: PathBuf::from("malaria_detector_final.pt"),
            host: "0.0.0.0".to_string(),
            port: 8081,
            frontend_dir: PathBuf::from(frontend_dir),
            max_upload_bytes: 10 * 1024 * 1024,
            require_model: false,
        }
    }
}

impl Settings {
    /// Defaults, then the YAML file named by `APP_CONFIG` (or
    /// `config/app.yaml` when present), then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = env::var("APP_CONFIG").ok().map(PathBuf::from);
        let mut settings = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        settings.apply_overrides(|key| env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that hold whatever source a value came from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_upload_bytes",
                value: self.max_upload_bytes.to_string(),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "port",
                value: self.port.to_string(),
            });
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("MODEL_PATH") {
            self.model_path = PathBuf::from(path);
        }
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "PORT", value: port })?;
        }
        if let Some(dir) = lookup("FRONTEND_DIR") {
            self.frontend_dir = PathBuf::from(dir);
        }
        if let Some(limit) = lookup("MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = limit.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MAX_UPLOAD_BYTES",
                value: limit,
            })?;
        }
        if let Some(flag) = lookup("REQUIRE_MODEL") {
            self.require_model = match flag.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "REQUIRE_MODEL",
                        value: flag,
                    });
                }
            };
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let settings = Settings::from_yaml("model_path: models/cells.pt\nport: 9000\n").unwrap();
        assert_eq!(settings.model_path, PathBuf::from("models/cells.pt"));
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.max_upload_bytes, 10 * 1024 * 1024);
        assert!(!settings.require_model);
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(lookup_from(&[
                ("MODEL_PATH", "/srv/model.pt"),
                ("PORT", "8088"),
                ("REQUIRE_MODEL", "true"),
            ]))
            .unwrap();
        assert_eq!(settings.model_path, PathBuf::from("/srv/model.pt"));
        assert_eq!(settings.bind_address(), "0.0.0.0:8088");
        assert!(settings.require_model);
    }

    #[test]
    fn rejects_unparsable_overrides() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(lookup_from(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));

        let err = settings
            .apply_overrides(lookup_from(&[("MAX_UPLOAD_BYTES", "ten")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "MAX_UPLOAD_BYTES", .. }));
    }

    #[test]
    fn zero_upload_limit_is_rejected_from_file_and_env() {
        let from_file = Settings::from_yaml("max_upload_bytes: 0\n").unwrap();
        assert!(matches!(
            from_file.validate(),
            Err(ConfigError::InvalidValue { key: "max_upload_bytes", .. })
        ));

        let mut from_env = Settings::default();
        from_env
            .apply_overrides(lookup_from(&[("MAX_UPLOAD_BYTES", "0")]))
            .unwrap();
        assert!(matches!(
            from_env.validate(),
            Err(ConfigError::InvalidValue { key: "max_upload_bytes", .. })
        ));

        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn missing_config_file_is_an_io_error() {
        let err = Settings::from_file(Path::new("/nonexistent/app.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
