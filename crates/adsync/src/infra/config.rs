//! Layered tool configuration: defaults, user, workspace, and env.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static WORKSPACE_CONFIG_PATH: &str = ".adsync/config.toml";

/// Tool configuration assembled from layered TOML files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scan: Scan,
    #[serde(default)]
    pub build: Build,
    #[serde(default)]
    pub cache: Cache,
}

/// Scanner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Scan {
    /// Glob patterns excluded from asset and media scans.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// Build-trigger collaborator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Build {
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl Build {
    fn default_endpoint() -> &'static str {
        "http://127.0.0.1:3000/api/build"
    }

    fn default_timeout_secs() -> u64 {
        600
    }

    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| Self::default_endpoint().to_owned())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or_else(Self::default_timeout_secs))
    }
}

/// Project-path registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Cache {
    #[serde(default)]
    ttl_secs: Option<u64>,
}

impl Cache {
    fn default_ttl_secs() -> u64 {
        3600
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.unwrap_or_else(Self::default_ttl_secs))
    }
}

/// Environment overrides for settings that change per invocation.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    build_endpoint: Option<String>,
    cache_ttl_secs: Option<u64>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            build_endpoint: env::var("ADSYNC_BUILD_ENDPOINT").ok(),
            cache_ttl_secs: env::var("ADSYNC_CACHE_TTL_SECS")
                .ok()
                .and_then(|raw| raw.parse().ok()),
        }
    }

    #[cfg(test)]
    fn for_tests(endpoint: &str, ttl_secs: u64) -> Self {
        Self {
            build_endpoint: Some(endpoint.to_owned()),
            cache_ttl_secs: Some(ttl_secs),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user config, workspace config, and
    /// env overrides, in increasing precedence.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let user = user_config_path();
        let workspace = env::current_dir()
            .ok()
            .map(|cwd| cwd.join(WORKSPACE_CONFIG_PATH));
        Self::load_with_layers(user, workspace, env)
    }

    fn load_with_layers(
        user: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut merged = Self::from_str(&DEFAULT_CONFIG)?;

        if let Some(path) = user.filter(|path| path.exists()) {
            merged = merged.merge(Self::from_file(&path)?);
        }
        if let Some(path) = workspace.filter(|path| path.exists()) {
            merged = merged.merge(Self::from_file(&path)?);
        }

        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse TOML config")
    }

    fn merge(self, overlay: Self) -> Self {
        Self {
            scan: Scan {
                ignore: merge_ignore(self.scan.ignore, overlay.scan.ignore),
            },
            build: Build {
                endpoint: overlay.build.endpoint.or(self.build.endpoint),
                timeout_secs: overlay.build.timeout_secs.or(self.build.timeout_secs),
            },
            cache: Cache {
                ttl_secs: overlay.cache.ttl_secs.or(self.cache.ttl_secs),
            },
        }
    }
}

fn merge_ignore(base: Vec<String>, overlay: Vec<String>) -> Vec<String> {
    let mut merged = base;
    for glob in overlay {
        if !merged.contains(&glob) {
            merged.push(glob);
        }
    }
    merged
}

fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("adsync/config.toml"))
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(endpoint) = env.build_endpoint {
        config.build.endpoint = Some(endpoint);
    }
    if let Some(ttl) = env.cache_ttl_secs {
        config.cache.ttl_secs = Some(ttl);
    }
    config
}
