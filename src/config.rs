//! Session configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! identity = "store_assigned"
//! stale_segments = "truncate"
//! travel_mode = "driving"
//!
//! [network]
//! timeout_ms = 5000
//! retries = 1
//!
//! [view]
//! center = { lat = 48.450001, lng = 34.983334 }
//! zoom = 10
//!
//! [endpoints]
//! store_url = "https://example.test/api/markers"
//! webhook_url = "https://example.test/hooks/markers"
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;
use crate::marker::IdentityPolicy;
use crate::policy::NetworkPolicy;
use crate::route::{StaleSegmentPolicy, TravelMode};

/// Initial map viewport handed to the canvas host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        MapView {
            center: LatLng::new(48.450001, 34.983334),
            zoom: 10,
        }
    }
}

/// Where the HTTP adapters connect. Unset endpoints fall back to the
/// in-process adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub store_url: Option<String>,
    pub webhook_url: Option<String>,
    pub routing_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub identity: IdentityPolicy,
    pub stale_segments: StaleSegmentPolicy,
    pub travel_mode: TravelMode,
    pub network: NetworkPolicy,
    pub view: MapView,
    pub endpoints: Endpoints,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "config read error: {}", err),
            ConfigError::Parse(err) => write!(f, "config parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl SyncConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn with_identity(mut self, identity: IdentityPolicy) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_stale_segments(mut self, policy: StaleSegmentPolicy) -> Self {
        self.stale_segments = policy;
        self
    }

    pub fn with_travel_mode(mut self, mode: TravelMode) -> Self {
        self.travel_mode = mode;
        self
    }

    pub fn with_network(mut self, network: NetworkPolicy) -> Self {
        self.network = network;
        self
    }
}
