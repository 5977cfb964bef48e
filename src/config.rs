use crate::training::{
    DEFAULT_CV_FOLDS, DEFAULT_SEED, DEFAULT_TEST_FRACTION, SelectionStrategy, TrainingOptions,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_GEOCODING_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_ROUTING_URL: &str = "http://router.project-osrm.org";
pub const DEFAULT_DISTANCE_URL: &str = "https://api.olamaps.io";
pub const DEFAULT_USER_AGENT: &str = "ETAnalyst/1.0";
pub const DEFAULT_SERVICE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_DATASET_PATH: &str = "data/travel_time_data1.csv";
pub const DEFAULT_MODEL_OUTPUT_PATH: &str = "models/best_travel_time_model.json";
pub const DEFAULT_MODEL_ACCURACY: &str = "95.02%";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub model: Option<ModelSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub services: Option<ServicesSection>,
    #[serde(default)]
    pub training: Option<TrainingSection>,
    #[serde(default)]
    pub display: Option<DisplaySection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServicesSection {
    pub geocoding_url: Option<String>,
    pub routing_url: Option<String>,
    pub distance_url: Option<String>,
    /// Credential for the distance/ETA provider. Empty disables the provider.
    pub distance_api_key: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TrainingSection {
    pub dataset_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub test_fraction: Option<f64>,
    pub cv_folds: Option<usize>,
    pub selection: Option<SelectionStrategy>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplaySection {
    /// Shown next to every prediction; not computed.
    pub model_accuracy: Option<String>,
}

/// Resolved settings for the outbound map services.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub geocoding_url: String,
    pub routing_url: String,
    pub distance_url: String,
    pub distance_api_key: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        ServicesSection::default().resolve()
    }
}

impl ServicesSection {
    fn resolve(&self) -> ServiceSettings {
        let or_default =
            |value: &Option<String>, default: &str| value.clone().unwrap_or_else(|| default.to_string());
        ServiceSettings {
            geocoding_url: or_default(&self.geocoding_url, DEFAULT_GEOCODING_URL),
            routing_url: or_default(&self.routing_url, DEFAULT_ROUTING_URL),
            distance_url: or_default(&self.distance_url, DEFAULT_DISTANCE_URL),
            distance_api_key: self
                .distance_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            user_agent: or_default(&self.user_agent, DEFAULT_USER_AGENT),
            timeout: Duration::from_secs(
                self.timeout_secs.unwrap_or(DEFAULT_SERVICE_TIMEOUT_SECS),
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    pub fn log_level(&self) -> &str {
        let level = self.logging.level.trim();
        if level.is_empty() {
            DEFAULT_LOG_LEVEL
        } else {
            level
        }
    }

    /// Path of the trained model artifact. An empty path counts as unset.
    pub fn model_path(&self) -> Option<&Path> {
        let path = self.model.as_ref()?.path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    pub fn service_settings(&self) -> ServiceSettings {
        self.services
            .as_ref()
            .map(ServicesSection::resolve)
            .unwrap_or_default()
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.training
            .as_ref()
            .and_then(|t| t.dataset_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_PATH))
    }

    pub fn model_output_path(&self) -> PathBuf {
        self.training
            .as_ref()
            .and_then(|t| t.output_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_OUTPUT_PATH))
    }

    /// Training options with the production candidate list.
    pub fn training_options(&self) -> TrainingOptions {
        let section = self.training.clone().unwrap_or_default();
        TrainingOptions {
            seed: section.seed.unwrap_or(DEFAULT_SEED),
            test_fraction: section.test_fraction.unwrap_or(DEFAULT_TEST_FRACTION),
            cv_folds: section.cv_folds.unwrap_or(DEFAULT_CV_FOLDS),
            selection: section.selection.unwrap_or_default(),
            ..TrainingOptions::default()
        }
    }

    pub fn model_accuracy(&self) -> &str {
        self.display
            .as_ref()
            .and_then(|d| d.model_accuracy.as_deref())
            .unwrap_or(DEFAULT_MODEL_ACCURACY)
    }
}
