use std::fmt;

use serde::Serialize;

/// Identifies an inbound data filter.
///
/// The variants are reported in kebab-case (e.g. "browser-extensions").
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FilterStatKey {
    /// Filtered due to localhost restriction.
    Localhost,

    /// Filtered by browser extension.
    BrowserExtensions,

    /// Filtered as known web crawler.
    WebCrawlers,

    /// Filtered by legacy browser version.
    LegacyBrowsers,
}

impl FilterStatKey {
    /// All inbound filters in evaluation order.
    pub const ALL: &'static [Self] = &[
        Self::Localhost,
        Self::BrowserExtensions,
        Self::WebCrawlers,
        Self::LegacyBrowsers,
    ];

    /// Returns the string identifier of the filter stat key.
    pub fn name(self) -> &'static str {
        match self {
            FilterStatKey::Localhost => "localhost",
            FilterStatKey::BrowserExtensions => "browser-extensions",
            FilterStatKey::WebCrawlers => "web-crawlers",
            FilterStatKey::LegacyBrowsers => "legacy-browsers",
        }
    }

    /// Returns the share of all traffic this filter removes when enabled.
    pub fn penalty(self) -> f64 {
        match self {
            FilterStatKey::Localhost => 0.01,
            FilterStatKey::BrowserExtensions => 0.01,
            FilterStatKey::WebCrawlers => 0.01,
            FilterStatKey::LegacyBrowsers => 0.04,
        }
    }
}

impl fmt::Display for FilterStatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl<'a> TryFrom<&'a str> for FilterStatKey {
    type Error = &'a str;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        Ok(match value {
            "localhost" => FilterStatKey::Localhost,
            "browser-extensions" => FilterStatKey::BrowserExtensions,
            "web-crawlers" => FilterStatKey::WebCrawlers,
            "legacy-browsers" => FilterStatKey::LegacyBrowsers,
            other => return Err(other),
        })
    }
}
