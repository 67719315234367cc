//! Contract types for the external build-trigger endpoint.
//!
//! The build itself runs in an external collaborator; this module only
//! describes and validates the wire shape. No HTTP is performed here.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::errors::AdsyncError;

/// Ad networks the build endpoint accepts.
pub const AD_NETWORKS: &[&str] = &[
    "google",
    "meta",
    "mintegral",
    "tiktok",
    "ironsource",
    "vungle",
    "unityads",
    "applovin",
    "adcolony",
    "kayzen",
];

static BUILD_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9-_]+$").unwrap());

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Packaging mode of a network build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    /// Zip packaging with split output; used by the meta network.
    Split,
    /// Single-file inline output; every other network.
    Inline,
}

impl BuildType {
    /// Network → build type mapping the template toolchain uses.
    pub fn for_network(network: &str) -> Self {
        if network == "meta" {
            BuildType::Split
        } else {
            BuildType::Inline
        }
    }

    /// Output directory produced by the external build.
    pub fn out_dir(&self) -> &'static str {
        match self {
            BuildType::Split => "dist-split",
            BuildType::Inline => "dist-inline",
        }
    }

    /// Vite config file driving the build, relative to the project root.
    pub fn config_path(&self) -> &'static str {
        match self {
            BuildType::Split => "vite/config-zip.prod.mjs",
            BuildType::Inline => "vite/config-inline.prod.mjs",
        }
    }
}

/// Request payload for the build endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub network: String,
    pub build_type: BuildType,
    pub config_path: String,
    pub project_name: String,
    pub ad_root_path: String,
    /// Budget the collaborator must enforce on the build run; not part of
    /// the wire payload.
    #[serde(skip)]
    pub timeout: Duration,
}

impl BuildRequest {
    /// Validate inputs and derive the build type and config path.
    pub fn new(
        network: &str,
        project_name: &str,
        ad_root_path: &str,
    ) -> Result<Self, AdsyncError> {
        if !AD_NETWORKS.contains(&network) {
            return Err(AdsyncError::Validation(format!(
                "unsupported ad network `{network}`"
            )));
        }
        validate_build_name(project_name)?;
        let build_type = BuildType::for_network(network);
        Ok(Self {
            network: network.to_owned(),
            build_type,
            config_path: build_type.config_path().to_owned(),
            project_name: project_name.to_owned(),
            ad_root_path: ad_root_path.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Names accepted for builds and projects: alphanumerics, hyphens,
/// underscores.
pub fn validate_build_name(name: &str) -> Result<(), AdsyncError> {
    if BUILD_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(AdsyncError::Validation(format!(
            "invalid build name `{name}`: only letters, digits, `-` and `_` are allowed"
        )))
    }
}

/// Success payload returned by the build endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub out_dir: Option<String>,
}

/// Error payload returned with a 4xx/5xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildFailure {
    pub error: String,
}
