// Gateway configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Install location of the GitHub CLI on Windows.
pub const WINDOWS_GH_PATH: &str = r"C:\Program Files\GitHub CLI\gh.exe";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Settings for how the gateway invokes the GitHub CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Path or bare name of the `gh` executable
    pub gh_path: PathBuf,
    /// Upper bound on a single command's runtime
    pub timeout: Duration,
    /// Stdout larger than this is treated as a failure
    pub max_output_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gh_path: default_gh_path(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl GatewayConfig {
    pub fn with_gh_path(mut self, gh_path: impl Into<PathBuf>) -> Self {
        self.gh_path = gh_path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The `[gateway]` table of a configuration file. Missing keys take defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default)]
    pub gh_path: Option<PathBuf>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub max_output_bytes: Option<usize>,
}

impl From<GatewaySettings> for GatewayConfig {
    fn from(settings: GatewaySettings) -> Self {
        let defaults = GatewayConfig::default();
        Self {
            gh_path: settings.gh_path.unwrap_or(defaults.gh_path),
            timeout: settings
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_output_bytes: settings
                .max_output_bytes
                .unwrap_or(defaults.max_output_bytes),
        }
    }
}

/// Platform default for the `gh` executable
pub fn default_gh_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(WINDOWS_GH_PATH)
    } else {
        PathBuf::from("gh")
    }
}
