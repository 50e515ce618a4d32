// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod config;
pub mod export;
pub mod flight;
pub mod geo;
pub mod host;
pub mod planner;
pub mod poi;
pub mod scheduler;
pub mod session;
pub mod tracker;
pub mod wiki;

use std::path::PathBuf;
use thiserror::Error;

pub use geo::Coordinate;
pub use poi::PointOfInterest;

#[derive(Error, Debug)]
pub enum WfpError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Simulator host error: {0}")]
    Host(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Root directory for persisted settings (`route_config.json`).
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "wfp", "WorldFlightPedia")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".wfp"))
}
