use anyhow::{Context, Result};
use house_worker_core::store::validate_segment;
use house_worker_core::HouseIdStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "HOUSE_WORKER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const AUTH_EMULATOR_HOST_ENV: &str = "FIREBASE_AUTH_EMULATOR_HOST";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub project_id: Option<String>,
    pub store: StoreConfig,
    pub auth: AuthMode,
    /// `host:port` of the Auth emulator; unsigned ID tokens are accepted when set.
    pub auth_emulator_host: Option<String>,
    /// `generated` or a literal house id.
    pub house_id: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_id: String,
    /// `host:port` of a Firestore emulator.
    pub emulator_host: Option<String>,
    /// Fixed bearer token; the metadata server is used when unset.
    pub access_token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Firestore,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Claims forwarded by an API gateway.
    Gateway,
    /// Bearer ID token, signature and claims checked locally.
    IdToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            project_id: None,
            store: StoreConfig::default(),
            auth: AuthMode::IdToken,
            auth_emulator_host: None,
            house_id: house_worker_core::DEFAULT_HOUSE_ID.to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Firestore,
            database_id: house_worker_store::firestore::DEFAULT_DATABASE_ID.to_string(),
            emulator_host: None,
            access_token: None,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Loads the YAML file (if any), applies environment overrides, validates.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Applies environment-style overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid PORT: {}", port))?;
        }
        if let Some(project) = lookup("GOOGLE_CLOUD_PROJECT").or_else(|| lookup("GCLOUD_PROJECT")) {
            self.project_id = Some(project);
        }
        if let Some(host) = lookup(house_worker_store::firestore::EMULATOR_HOST_ENV) {
            self.store.emulator_host = Some(host);
        }
        if let Some(host) = lookup(AUTH_EMULATOR_HOST_ENV) {
            self.auth_emulator_host = Some(host);
        }
        if let Some(backend) = lookup("HOUSE_WORKER_STORE") {
            self.store.backend = match backend.as_str() {
                "firestore" => StoreBackend::Firestore,
                "memory" => StoreBackend::Memory,
                other => anyhow::bail!("Invalid HOUSE_WORKER_STORE: {}", other),
            };
        }
        if let Some(mode) = lookup("HOUSE_WORKER_AUTH") {
            self.auth = match mode.as_str() {
                "gateway" => AuthMode::Gateway,
                "id_token" => AuthMode::IdToken,
                other => anyhow::bail!("Invalid HOUSE_WORKER_AUTH: {}", other),
            };
        }
        if let Some(house_id) = lookup("HOUSE_WORKER_HOUSE_ID") {
            self.house_id = house_id;
        }
        if let Some(format) = lookup("HOUSE_WORKER_LOG_FORMAT") {
            self.log_format = match format.as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                other => anyhow::bail!("Invalid HOUSE_WORKER_LOG_FORMAT: {}", other),
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let has_project = self.project_id.as_deref().is_some_and(|p| !p.is_empty());

        if self.store.backend == StoreBackend::Firestore && !has_project {
            anyhow::bail!("project_id is required for the firestore store");
        }
        if self.auth == AuthMode::IdToken && !has_project {
            anyhow::bail!("project_id is required for id_token auth");
        }
        if let HouseIdStrategy::Fixed(id) = self.house_id_strategy() {
            validate_segment(&id)
                .with_context(|| format!("Invalid house_id: {:?}", self.house_id))?;
        }
        if self.store.timeout_secs == 0 {
            anyhow::bail!("store.timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn house_id_strategy(&self) -> HouseIdStrategy {
        HouseIdStrategy::from_setting(&self.house_id)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
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
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.house_id_strategy(), HouseIdStrategy::default());
        assert_eq!(config.store.database_id, "(default)");
        assert_eq!(config.auth, AuthMode::IdToken);
        assert_eq!(config.auth_emulator_host, None);
        assert!(config.validate().is_err(), "firestore without project must fail");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("PORT", "9000"),
                ("GCLOUD_PROJECT", "house-worker-dev"),
                ("FIRESTORE_EMULATOR_HOST", "localhost:8081"),
                ("FIREBASE_AUTH_EMULATOR_HOST", "localhost:9099"),
                ("HOUSE_WORKER_AUTH", "gateway"),
                ("HOUSE_WORKER_HOUSE_ID", "generated"),
                ("HOUSE_WORKER_LOG_FORMAT", "json"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.project_id.as_deref(), Some("house-worker-dev"));
        assert_eq!(config.store.emulator_host.as_deref(), Some("localhost:8081"));
        assert_eq!(config.auth, AuthMode::Gateway);
        assert_eq!(config.auth_emulator_host.as_deref(), Some("localhost:9099"));
        assert_eq!(config.house_id_strategy(), HouseIdStrategy::Generated);
        assert_eq!(config.log_format, LogFormat::Json);
        config.validate().unwrap();
    }

    #[test]
    fn test_google_cloud_project_wins() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("GOOGLE_CLOUD_PROJECT", "primary"),
                ("GCLOUD_PROJECT", "legacy"),
            ]))
            .unwrap();
        assert_eq!(config.project_id.as_deref(), Some("primary"));
    }

    #[test]
    fn test_invalid_overrides() {
        let mut config = Config::default();
        assert!(config.apply_overrides(lookup_from(&[("PORT", "eighty")])).is_err());
        assert!(config
            .apply_overrides(lookup_from(&[("HOUSE_WORKER_STORE", "redis")]))
            .is_err());
    }

    #[test]
    fn test_memory_store_with_gateway_needs_no_project() {
        let config = Config {
            store: StoreConfig {
                backend: StoreBackend::Memory,
                ..Default::default()
            },
            auth: AuthMode::Gateway,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_unusable_house_ids_rejected() {
        for house_id in ["a/b", ".", "..", " .. "] {
            let config = Config {
                project_id: Some("p".to_string()),
                house_id: house_id.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{:?} should be rejected", house_id);
        }
    }

    #[test]
    fn test_house_id_is_trimmed_before_validation() {
        let config = Config {
            project_id: Some("p".to_string()),
            house_id: " my-house ".to_string(),
            ..Default::default()
        };
        config.validate().unwrap();
        assert_eq!(
            config.house_id_strategy(),
            HouseIdStrategy::Fixed("my-house".to_string())
        );
    }
}
