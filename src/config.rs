//! Application configuration.
//!
//! Sources, later ones winning: built-in defaults, an optional
//! `gofinances.toml` in the working directory, then `GOFINANCES__*`
//! environment variables (e.g. `GOFINANCES__SERVER__PORT=8080`).

use crate::error::DashboardResult;
use crate::models::DisplayZone;
use crate::summary::{DisplayOptions, TotalIntervalAnchor};
use chrono::{FixedOffset, Offset, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::PathBuf;

/// Brasília time, UTC-03:00
const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;
const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file backing the key/value store.
    pub database_path: PathBuf,
    /// Where the terminal UI writes its log.
    pub log_file: PathBuf,
    /// IANA zone used to turn stored timestamps into calendar days.
    /// Empty means use `utc_offset_minutes` instead.
    pub timezone: String,
    pub utc_offset_minutes: i32,
    pub total_interval_anchor: TotalIntervalAnchor,
    /// UI redraw interval while idle or loading.
    pub tick_rate_ms: u64,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from("gofinances.db"),
            log_file: PathBuf::from("gofinances.log"),
            timezone: DEFAULT_TIMEZONE.to_string(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            total_interval_anchor: TotalIntervalAnchor::default(),
            tick_rate_ms: 120,
            server: ServerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl AppConfig {
    /// Loads configuration from `gofinances.toml` and the environment.
    pub fn load() -> DashboardResult<Self> {
        Self::load_from("gofinances")
    }

    /// Same as [`AppConfig::load`] with an explicit file stem or path.
    pub fn load_from(file: &str) -> DashboardResult<Self> {
        let config = ::config::Config::builder()
            .add_source(::config::File::with_name(file).required(false))
            .add_source(
                ::config::Environment::with_prefix("GOFINANCES")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| {
            tracing::warn!(
                minutes = self.utc_offset_minutes,
                "utc offset out of range, falling back to default"
            );
            default_offset()
        })
    }

    pub fn display_zone(&self) -> DisplayZone {
        let name = self.timezone.trim();
        if name.is_empty() {
            return DisplayZone::Fixed(self.utc_offset());
        }

        match name.parse::<Tz>() {
            Ok(tz) => DisplayZone::Named(tz),
            Err(_) => {
                tracing::warn!(timezone = name, "unknown timezone, using utc offset");
                DisplayZone::Fixed(self.utc_offset())
            }
        }
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            zone: self.display_zone(),
            total_interval_anchor: self.total_interval_anchor,
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

pub fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60).unwrap_or_else(|| Utc.fix())
}
