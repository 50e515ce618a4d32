// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::poi::DEFAULT_DEDUP_KM;
use crate::tracker::DEFAULT_ARRIVAL_THRESHOLD_KM;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_WIKIPEDIA_URL: &str = "https://en.wikipedia.org";

fn default_threshold() -> f64 {
    DEFAULT_ARRIVAL_THRESHOLD_KM
}
fn default_dedup() -> f64 {
    DEFAULT_DEDUP_KM
}
fn default_radius() -> u32 {
    10_000
}
fn default_limit() -> u32 {
    50
}
fn default_poll_ms() -> u64 {
    1000
}
fn default_pulse_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_base_url() -> String {
    DEFAULT_WIKIPEDIA_URL.to_string()
}
fn default_user_agent() -> String {
    format!("WorldFlightPedia/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Distance at which the aircraft counts as "at" the current target.
    #[serde(default = "default_threshold")]
    pub arrival_threshold_km: f64,
    /// Fresh candidates closer than this to an already kept one are dropped.
    #[serde(default = "default_dedup")]
    pub dedup_km: f64,
    #[serde(default = "default_radius")]
    pub search_radius_m: u32,
    #[serde(default = "default_limit")]
    pub search_limit: u32,
    #[serde(default = "default_poll_ms")]
    pub poll_interval_ms: u64,
    /// How long the arrival flag stays raised before it is reset.
    #[serde(default = "default_pulse_ms")]
    pub pulse_delay_ms: u64,
    #[serde(default = "default_true")]
    pub auto_pause: bool,
    /// Only track arrivals while the StartFlight flag is raised.
    #[serde(default = "default_true")]
    pub require_start_flight: bool,
    #[serde(default = "default_base_url")]
    pub wikipedia_base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            arrival_threshold_km: default_threshold(),
            dedup_km: default_dedup(),
            search_radius_m: default_radius(),
            search_limit: default_limit(),
            poll_interval_ms: default_poll_ms(),
            pulse_delay_ms: default_pulse_ms(),
            auto_pause: true,
            require_start_flight: true,
            wikipedia_base_url: default_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl RouteConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn pulse_delay(&self) -> Duration {
        Duration::from_millis(self.pulse_delay_ms)
    }

    /// Rejects values that would make arrival detection meaningless.
    pub fn validate(&self) -> Result<(), crate::WfpError> {
        if !(self.arrival_threshold_km.is_finite() && self.arrival_threshold_km > 0.0) {
            return Err(crate::WfpError::Config(format!(
                "arrival_threshold_km must be positive, got {}",
                self.arrival_threshold_km
            )));
        }
        if !(self.dedup_km.is_finite() && self.dedup_km >= 0.0) {
            return Err(crate::WfpError::Config(format!(
                "dedup_km must be non-negative, got {}",
                self.dedup_km
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(crate::WfpError::Config(
                "poll_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config_path: crate::get_config_root().join("route_config.json"),
        }
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Missing file means defaults.
    pub fn load(&self) -> Result<RouteConfig> {
        if !self.config_path.exists() {
            log::debug!(
                "No route config found; using defaults — path={}",
                self.config_path.display()
            );
            return Ok(RouteConfig::default());
        }

        let content =
            fs::read_to_string(&self.config_path).context("Failed to read route_config.json")?;
        let config: RouteConfig =
            serde_json::from_str(&content).context("Failed to parse route_config.json")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &RouteConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize route config")?;
        fs::write(&self.config_path, content).context("Failed to write route_config.json")
    }
}
