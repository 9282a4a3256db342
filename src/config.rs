use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::domain::Plant;
use crate::forecast::scaling::{FeatureScaling, MinMaxScaler};
use crate::telemetry::LogFormat;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub data: DataConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub enable_cors: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

fn default_request_timeout() -> u64 {
    30
}

/// Merged per-plant telemetry exports loaded into the point store at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub plant1_csv: Option<PathBuf>,
    pub plant2_csv: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_sequence_length")]
    pub sequence_length: usize,
    #[serde(default = "default_step_minutes")]
    pub step_minutes: i64,
    #[serde(default)]
    pub scaling: ScalingConfig,
    #[serde(default)]
    pub forecasters: ForecastersConfig,
}

/// One model per plant; a plant without an entry cannot serve predictions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastersConfig {
    pub plant1: Option<ForecasterConfig>,
    pub plant2: Option<ForecasterConfig>,
}

impl ForecastersConfig {
    pub fn for_plant(&self, plant: Plant) -> Option<&ForecasterConfig> {
        match plant {
            Plant::Plant1 => self.plant1.as_ref(),
            Plant::Plant2 => self.plant2.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForecasterConfig {
    /// Exported linear coefficients; without a file, a persistence baseline.
    Linear { weights: Option<PathBuf> },
    /// TensorFlow Serving REST endpoint, e.g. `http://127.0.0.1:8501/v1/models/plant1:predict`.
    TfServing {
        url: String,
        #[serde(default = "default_model_timeout")]
        timeout_secs: u64,
    },
}

fn default_model_timeout() -> u64 {
    5
}

fn default_sequence_length() -> usize {
    24
}

fn default_step_minutes() -> i64 {
    15
}

/// Min-max bounds frozen at training time, one pair per input feature.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScalingConfig {
    pub ac_power: MinMaxScaler,
    pub module_temperature: MinMaxScaler,
    pub ambient_temperature: MinMaxScaler,
    pub irradiation: MinMaxScaler,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        let s = FeatureScaling::default();
        Self {
            ac_power: s.ac_power,
            module_temperature: s.module_temperature,
            ambient_temperature: s.ambient_temperature,
            irradiation: s.irradiation,
        }
    }
}

impl From<ScalingConfig> for FeatureScaling {
    fn from(c: ScalingConfig) -> Self {
        FeatureScaling {
            ac_power: c.ac_power,
            module_temperature: c.module_temperature,
            ambient_temperature: c.ambient_temperature,
            irradiation: c.irradiation,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config/default.toml")
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("SOLAR__").split("__"));
        Ok(figment.extract()?)
    }
}
