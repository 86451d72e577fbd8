use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tapeview_domain::value_objects::drawing::PanelId;
use tapeview_domain::value_objects::symbol::{slots_from_labels, SymbolSlot};
use tapeview_domain::value_objects::timeframe::Timeframe;

/// One primary symbol plus one per secondary panel.
pub const TRACKED_SYMBOLS: usize = 1 + PanelId::SECONDARY_COUNT as usize;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub tick_log: TickLogConfig,
    #[serde(default)]
    pub symbols: SymbolsConfig,
    #[serde(default)]
    pub resample: ResampleConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct TickLogConfig {
    pub path: String,
    /// Set when the writer prepends a row index before the timestamp.
    pub leading_index_column: bool,
}

impl Default for TickLogConfig {
    fn default() -> Self {
        Self {
            path: "stock_data.csv".to_string(),
            leading_index_column: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct SymbolsConfig {
    /// Column-group order of the log; the first label drives the primary panel.
    pub labels: Vec<String>,
}

impl Default for SymbolsConfig {
    fn default() -> Self {
        Self {
            labels: ["AAPL", "MSFT", "NFLX", "PYPL", "FB", "TWTR", "AMZN"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ResampleConfig {
    pub bucket: String,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            bucket: "1min".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct DashboardConfig {
    pub refresh_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { refresh_ms: 1000 }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        if self.symbols.labels.len() != TRACKED_SYMBOLS {
            return Err(format!(
                "symbols.labels must list exactly {TRACKED_SYMBOLS} symbols, got {}",
                self.symbols.labels.len()
            ));
        }
        if let Some(blank) = self.symbols.labels.iter().position(|l| l.trim().is_empty()) {
            return Err(format!("symbols.labels[{blank}] is empty"));
        }
        self.timeframe()?;
        if self.dashboard.refresh_ms == 0 {
            return Err("dashboard.refresh_ms must be >= 1".to_string());
        }
        if self.tick_log.path.trim().is_empty() {
            return Err("tick_log.path is empty".to_string());
        }
        Ok(())
    }

    pub fn timeframe(&self) -> Result<Timeframe, String> {
        Timeframe::parse(&self.resample.bucket)
            .map_err(|err| format!("resample.bucket: {err}"))
    }

    pub fn symbol_slots(&self) -> Vec<SymbolSlot> {
        slots_from_labels(&self.symbols.labels)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.dashboard.refresh_ms.max(1))
    }
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let (config, _source) = load_config_with_source(path)?;
    Ok(config)
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    config
        .validate()
        .map_err(|err| format!("invalid config {}: {}", path.display(), err))?;
    Ok((config, contents))
}

pub fn to_toml_pretty(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config)
        .map_err(|err| format!("failed to serialize config as TOML: {err}"))
}
