// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::RouteConfig;
use crate::geo::Coordinate;
use crate::host::PoiSearch;
use crate::WfpError;
use log::{debug, error, info};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Subset of the REST page summary the panel shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extract: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<Thumbnail>,
    #[serde(default)]
    pub content_urls: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub source: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl PageSummary {
    pub fn page_url(&self) -> Option<&str> {
        self.content_urls
            .as_ref()?
            .get("desktop")?
            .get("page")?
            .as_str()
    }
}

pub struct WikipediaClient {
    base_url: Url,
    client: reqwest::blocking::Client,
}

impl WikipediaClient {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, WfpError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| WfpError::Config(format!("invalid Wikipedia base URL: {}", base_url)))?;
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &RouteConfig) -> Result<Self, WfpError> {
        Self::new(&config.wikipedia_base_url, &config.user_agent)
    }

    /// Base URL with `segments` appended, each percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn geosearch_url(&self) -> Url {
        self.endpoint(&["w", "api.php"])
    }

    pub fn geosearch_query(&self, center: Coordinate, radius_m: u32, limit: u32) -> Url {
        let mut url = self.geosearch_url();
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("list", "geosearch")
            .append_pair("gscoord", &format!("{}|{}", center.lat, center.lon))
            .append_pair("gsradius", &radius_m.to_string())
            .append_pair("gslimit", &limit.to_string())
            .append_pair("format", "json")
            .append_pair("origin", "*");
        url
    }

    pub fn summary_url(&self, title: &str) -> Url {
        self.endpoint(&["api", "rest_v1", "page", "summary", title])
    }

    /// Raw GeoSearch records around `center`.
    pub fn geosearch(
        &self,
        center: Coordinate,
        radius_m: u32,
        limit: u32,
    ) -> Result<Vec<Value>, WfpError> {
        info!(
            "Querying GeoSearch — center={} radius_m={} limit={}",
            center, radius_m, limit
        );

        let body: Value = self
            .client
            .get(self.geosearch_query(center, radius_m, limit))
            .send()?
            .error_for_status()?
            .json()?;

        let records = extract_geosearch(body);
        debug!("GeoSearch returned records — count={}", records.len());
        Ok(records)
    }

    /// Page summary for `title`; `None` for an empty title.
    pub fn summary(&self, title: &str) -> Result<Option<PageSummary>, WfpError> {
        if title.trim().is_empty() {
            return Ok(None);
        }
        let url = self.summary_url(title);
        debug!("Fetching page summary — title={} url={}", title, url);
        let summary: PageSummary = self.client.get(url).send()?.error_for_status()?.json()?;
        Ok(Some(summary))
    }
}

impl PoiSearch for WikipediaClient {
    fn search(&self, center: Coordinate, radius_m: u32, limit: u32) -> Vec<Value> {
        if !center.is_finite() {
            return Vec::new();
        }
        match self.geosearch(center, radius_m, limit) {
            Ok(records) => records,
            Err(e) => {
                error!("GeoSearch failed; treating as no results — error={}", e);
                Vec::new()
            }
        }
    }
}

/// Pulls `query.geosearch` out of an API response; anything else is empty.
pub fn extract_geosearch(body: Value) -> Vec<Value> {
    match body {
        Value::Object(mut root) => match root.remove("query") {
            Some(Value::Object(mut query)) => match query.remove("geosearch") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
