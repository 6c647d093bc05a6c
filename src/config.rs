use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::analyzer::{
    check_attenuation, check_frequency, check_ref_level, check_span, check_sweep_time,
};
use crate::error::SiglentError;
use crate::transport::ConnectionConfig;
use crate::types::{Bandwidth, TraceFormat, TraceIndex};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    pub instrument: InstrumentConfig,
    #[serde(default)]
    pub analyzer: AnalyzerSettings,
    pub trace: TraceConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instrument.address.trim().is_empty() {
            return Err(ConfigError::Message(
                "instrument.address must not be empty".to_string(),
            ));
        }
        self.analyzer
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid analyzer settings: {e}")))?;
        TraceIndex::new(self.trace.index)
            .map_err(|e| ConfigError::Message(format!("Invalid trace.index: {e}")))?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InstrumentConfig {
    /// VISA resource string or `host[:port]`
    pub address: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    /// Check the `*IDN?` reply before doing anything else
    pub verify_identity: bool,
}

impl InstrumentConfig {
    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
        }
    }
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            address: "TCPIP0::192.168.1.50::INSTR".to_string(),
            connect_timeout_ms: 5_000,
            read_timeout_ms: 10_000,
            write_timeout_ms: 5_000,
            verify_identity: true,
        }
    }
}

/// Acquisition settings to push to the analyzer. Unset fields are left alone.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AnalyzerSettings {
    pub center_hz: Option<f64>,
    pub span_hz: Option<f64>,
    /// Must be one of the discrete [`Bandwidth`] steps
    pub rbw_hz: Option<f64>,
    /// Must be one of the discrete [`Bandwidth`] steps
    pub vbw_hz: Option<f64>,
    pub attenuation_db: Option<f64>,
    pub preamp: Option<bool>,
    pub ref_level_dbm: Option<f64>,
    pub sweep_time_s: Option<f64>,
}

impl AnalyzerSettings {
    /// Check every present field against the analyzer's legal ranges
    pub fn validate(&self) -> Result<(), SiglentError> {
        if let Some(hz) = self.center_hz {
            check_frequency("Center frequency", hz)?;
        }
        if let Some(hz) = self.span_hz {
            check_span(hz)?;
        }
        if let Some(hz) = self.rbw_hz {
            Bandwidth::from_hz(hz)?;
        }
        if let Some(hz) = self.vbw_hz {
            Bandwidth::from_hz(hz)?;
        }
        if let Some(db) = self.attenuation_db {
            check_attenuation(db)?;
        }
        if let Some(dbm) = self.ref_level_dbm {
            check_ref_level(dbm)?;
        }
        if let Some(seconds) = self.sweep_time_s {
            check_sweep_time(seconds)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == AnalyzerSettings::default()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TraceConfig {
    /// Trace number, 1-4
    pub index: u8,
    pub format: TraceFormat,
    /// Append captured traces to this JSONL file
    pub record_path: Option<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            index: 1,
            format: TraceFormat::Ascii,
            record_path: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Environment variable overrides, e.g. SIGLENT_SA__INSTRUMENT__ADDRESS
fn environment() -> Environment {
    Environment::with_prefix("SIGLENT_SA")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from file with layered fallbacks
///
/// Layers, last one wins: built-in defaults, the TOML file, then
/// `SIGLENT_SA__<SECTION>__<KEY>` environment variables.
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_layered(config_path, environment())
}

fn load_layered(config_path: Option<&Path>, env: Environment) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

    if let Some(path) = config_path {
        if path.exists() {
            builder = builder.add_source(File::from(path));
        } else {
            return Err(ConfigError::Message(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
    } else {
        let possible_paths = ["ssa-ctl.toml", "config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
                break;
            }
        }
    }

    builder = builder.add_source(env);

    let config = builder.build()?.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration, falling back to defaults on any error
pub fn load_config_or_default(config_path: Option<&Path>) -> AppConfig {
    match load_config(config_path) {
        Ok(config) => {
            log::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            log::warn!("Failed to load config ({}), using defaults", e);
            AppConfig::default()
        }
    }
}
