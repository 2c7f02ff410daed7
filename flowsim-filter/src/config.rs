//! Config structs for all inbound filters.

use serde::{Deserialize, Serialize};

use crate::FilterStatKey;

/// Common configuration for inbound filters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Specifies whether this filter is enabled.
    pub is_enabled: bool,
}

impl FilterConfig {
    /// Creates a filter config with the given toggle state.
    pub fn enabled(is_enabled: bool) -> Self {
        Self { is_enabled }
    }

    /// Returns true if no configuration for this filter is given.
    pub fn is_empty(&self) -> bool {
        !self.is_enabled
    }
}

/// Configuration for all inbound filters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundFiltersConfig {
    /// Configuration for the Localhost filter.
    #[serde(default, skip_serializing_if = "FilterConfig::is_empty")]
    pub localhost: FilterConfig,

    /// Configuration for the Browser Extensions filter.
    #[serde(default, skip_serializing_if = "FilterConfig::is_empty")]
    pub browser_extensions: FilterConfig,

    /// Configuration for the Web Crawlers filter.
    #[serde(default, skip_serializing_if = "FilterConfig::is_empty")]
    pub web_crawlers: FilterConfig,

    /// Configuration for the Legacy Browsers filter.
    #[serde(default, skip_serializing_if = "FilterConfig::is_empty")]
    pub legacy_browsers: FilterConfig,
}

impl InboundFiltersConfig {
    /// Returns true if there are no filter configurations declared.
    pub fn is_empty(&self) -> bool {
        self.localhost.is_empty()
            && self.browser_extensions.is_empty()
            && self.web_crawlers.is_empty()
            && self.legacy_browsers.is_empty()
    }

    /// Returns the configuration of the given filter.
    pub fn get(&self, key: FilterStatKey) -> &FilterConfig {
        match key {
            FilterStatKey::Localhost => &self.localhost,
            FilterStatKey::BrowserExtensions => &self.browser_extensions,
            FilterStatKey::WebCrawlers => &self.web_crawlers,
            FilterStatKey::LegacyBrowsers => &self.legacy_browsers,
        }
    }

    /// Returns an iterator over all enabled filters.
    pub fn enabled(&self) -> impl Iterator<Item = FilterStatKey> + '_ {
        FilterStatKey::ALL
            .iter()
            .copied()
            .filter(|key| self.get(*key).is_enabled)
    }

    /// Returns the share of traffic that passes all enabled filters.
    ///
    /// Every enabled filter subtracts its [penalty](FilterStatKey::penalty) from a full retention
    /// of `1.0`.
    pub fn retention_rate(&self) -> f64 {
        self.enabled().fold(1.0, |rate, key| rate - key.penalty())
    }
}
