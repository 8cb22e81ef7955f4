//! Store protocol versions and the wire dialect each one speaks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which product answered the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// Elasticsearch.
    #[default]
    Elasticsearch,
    /// OpenSearch (forked from Elasticsearch 7.10, always typeless).
    OpenSearch,
}

/// How update scripts are laid out in a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStyle {
    /// `{"script": "<text>", "params": {..}}` (Elasticsearch 1.x).
    Flat,
    /// `{"script": {"inline": "<text>", "params": {..}}}` (2.x to 5.5).
    Inline,
    /// `{"script": {"source": "<text>", "params": {..}}}` (5.6 onwards).
    Source,
}

/// A store version as reported by the liveness handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
    /// Product.
    pub distribution: Distribution,
}

impl ProtocolVersion {
    /// Newest dialect, assumed when no handshake was made.
    pub const LATEST: ProtocolVersion = ProtocolVersion::elasticsearch(8, 0, 0);

    /// An Elasticsearch version.
    pub const fn elasticsearch(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            distribution: Distribution::Elasticsearch,
        }
    }

    /// An OpenSearch version.
    pub const fn opensearch(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            distribution: Distribution::OpenSearch,
        }
    }

    /// Parse a version number such as `1.7.5`, `7.10.2` or `8.0.0-SNAPSHOT`.
    pub fn parse(number: &str, distribution: Distribution) -> Option<Self> {
        let core = number.trim().split(['-', '+']).next()?;
        let mut parts = core.split('.').map(|p| p.parse::<u32>());

        let major = parts.next()?.ok()?;
        let minor = match parts.next() {
            Some(part) => part.ok()?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(part) => part.ok()?,
            None => 0,
        };

        Some(Self {
            major,
            minor,
            patch,
            distribution,
        })
    }

    /// Whether documents are addressed by a mapping type path segment.
    pub fn uses_mapping_types(&self) -> bool {
        self.distribution == Distribution::Elasticsearch && self.major < 7
    }

    /// Whether text fields are declared with the old `string` type.
    pub fn uses_string_fields(&self) -> bool {
        self.distribution == Distribution::Elasticsearch && self.major < 5
    }

    /// Whether `hits.total` is a bare number rather than `{value, relation}`.
    pub fn reports_bare_total(&self) -> bool {
        self.distribution == Distribution::Elasticsearch && self.major < 7
    }

    /// Script body layout for update requests.
    pub fn script_style(&self) -> ScriptStyle {
        match self.distribution {
            Distribution::OpenSearch => ScriptStyle::Source,
            Distribution::Elasticsearch => match (self.major, self.minor) {
                (0 | 1, _) => ScriptStyle::Flat,
                (2..=4, _) => ScriptStyle::Inline,
                (5, minor) if minor < 6 => ScriptStyle::Inline,
                _ => ScriptStyle::Source,
            },
        }
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.distribution {
            Distribution::Elasticsearch => {
                write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
            }
            Distribution::OpenSearch => {
                write!(f, "opensearch {}.{}.{}", self.major, self.minor, self.patch)
            }
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = String;

    /// Accepts `7.10.2`, `opensearch 2.11.0` or `opensearch:2.11.0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (distribution, number) = match s.split_once([' ', ':']) {
            Some((product, number)) if product.eq_ignore_ascii_case("opensearch") => {
                (Distribution::OpenSearch, number)
            }
            Some((product, number)) if product.eq_ignore_ascii_case("elasticsearch") => {
                (Distribution::Elasticsearch, number)
            }
            _ => (Distribution::Elasticsearch, s),
        };

        Self::parse(number, distribution).ok_or_else(|| format!("invalid version: {s}"))
    }
}
