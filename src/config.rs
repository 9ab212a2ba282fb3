//! Runtime configuration.
//!
//! Layers, later wins:
//!
//! 1. Built-in defaults ([`DashboardConfig::default`])
//! 2. TOML file: `--config`, else `DASHBOARD_CONFIG`, else `config.toml`
//!    in the platform config directory
//! 3. `DASHBOARD_*` environment variables
//!
//! Missing or malformed files are skipped with a warning; a dashboard with
//! no backend configured still starts and renders its empty state.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
    time::Duration,
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

const APP_QUALIFIER: &str = "mn";
const APP_ORG: &str = "TradeDashboard";
const APP_NAME: &str = "TradeDashboard";
const CONFIG_FILENAME: &str = "config.toml";

/// How long one attempt may wait on a slow backend.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRIES: u8 = 1;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(250);
/// Upper bound on extra attempts per upstream call.
pub const MAX_RETRIES: u8 = 1;

pub const ENV_BASE_URL: &str = "DASHBOARD_API_BASE";
pub const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG";
pub const ENV_TIMEOUT_SECS: &str = "DASHBOARD_TIMEOUT_SECS";
pub const ENV_RETRIES: &str = "DASHBOARD_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "DASHBOARD_RETRY_DELAY_MS";

/// A tracked HS product code and its display name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProductInfo {
    pub code: &'static str,
    pub name: &'static str,
}

/// Product codes the backend reports on when it omits its own list.
pub const DEFAULT_PRODUCTS: [ProductInfo; 4] = [
    ProductInfo {
        code: "2601",
        name: "Төмрийн хүдэр, баяжмал",
    },
    ProductInfo {
        code: "2603",
        name: "Зэсийн баяжмал",
    },
    ProductInfo {
        code: "2701",
        name: "Нүүрс",
    },
    ProductInfo {
        code: "2709",
        name: "Газрын тос",
    },
];

pub fn default_product_codes() -> Vec<String> {
    DEFAULT_PRODUCTS
        .iter()
        .map(|product| product.code.to_string())
        .collect()
}

pub fn product_name(code: &str) -> Option<&'static str> {
    DEFAULT_PRODUCTS
        .iter()
        .find(|product| product.code == code)
        .map(|product| product.name)
}

/// Relative paths of the six upstream datasets, joined onto the base URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPaths {
    pub metrics: String,
    pub products_timeline: String,
    pub products_value_monthly: String,
    pub export_total: String,
    pub exchange_timeline: String,
    pub coal_latest: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            metrics: "dashboard/metrics".to_string(),
            products_timeline: "dashboard/export/products-timeline".to_string(),
            products_value_monthly: "dashboard/export/products-value-monthly".to_string(),
            export_total: "dashboard/export/total".to_string(),
            exchange_timeline: "dashboard/exchange/timeline".to_string(),
            coal_latest: "dashboard/coal-cny/latest".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
    /// Statistics backend. `None` means "not configured": the dashboard
    /// renders its empty view without touching the network.
    pub base_url: Option<Url>,
    pub timeout: Duration,
    pub retries: u8,
    pub retry_delay: Duration,
    pub endpoints: EndpointPaths,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            endpoints: EndpointPaths::default(),
        }
    }
}

impl DashboardConfig {
    pub fn with_base_url(mut self, raw: &str) -> Self {
        self.base_url = parse_base_url(raw);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = clamp_retries(retries);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(url) = file.base_url.as_deref().and_then(parse_base_url) {
            self.base_url = Some(url);
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = file.retries {
            self.retries = clamp_retries(retries);
        }
        if let Some(ms) = file.retry_delay_ms {
            self.retry_delay = Duration::from_millis(ms);
        }
        if let Some(endpoints) = file.endpoints {
            self.endpoints = endpoints;
        }
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // An unusable value skips the layer rather than clearing a lower one.
        if let Some(url) = lookup(ENV_BASE_URL).and_then(|raw| parse_base_url(&raw)) {
            self.base_url = Some(url);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS).and_then(|v| parse_env_number(ENV_TIMEOUT_SECS, &v)) {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = lookup(ENV_RETRIES).and_then(|v| parse_env_number(ENV_RETRIES, &v)) {
            self.retries = clamp_retries(u8::try_from(retries).unwrap_or(u8::MAX));
        }
        if let Some(ms) = lookup(ENV_RETRY_DELAY_MS).and_then(|v| parse_env_number(ENV_RETRY_DELAY_MS, &v)) {
            self.retry_delay = Duration::from_millis(ms);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    retries: Option<u8>,
    retry_delay_ms: Option<u64>,
    endpoints: Option<EndpointPaths>,
}

static PATH_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

/// Pin the config file location for the rest of the process (`--config`).
pub fn set_path_override(path: PathBuf) {
    if PATH_OVERRIDE.set(path).is_err() {
        warn!("[config] config path already set; ignoring override");
    }
}

/// Resolve the configuration from all layers.
pub fn load() -> DashboardConfig {
    load_from(PATH_OVERRIDE.get().map(PathBuf::as_path))
}

pub fn load_from(path_override: Option<&Path>) -> DashboardConfig {
    let mut config = DashboardConfig::default();

    if let Some(file) = config_file_path(path_override).and_then(|path| load_toml_file(&path)) {
        config.apply_file(file);
    }

    config.apply_env(|key| std::env::var(key).ok());

    debug!(
        "[config] base_url={:?} timeout={:?} retries={}",
        config.base_url.as_ref().map(Url::as_str),
        config.timeout,
        config.retries
    );
    config
}

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
}

fn config_file_path(path_override: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = path_override {
        return Some(path.to_path_buf());
    }
    if let Ok(raw) = std::env::var(ENV_CONFIG_PATH) {
        if !raw.trim().is_empty() {
            return Some(PathBuf::from(raw));
        }
    }
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

fn load_toml_file(path: &Path) -> Option<ConfigFile> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(file) => Some(file),
        Err(err) => {
            warn!("[config] ignoring malformed {}: {err}", path.display());
            None
        }
    }
}

/// Parse a backend base URL. Blank means "not configured". The path always
/// ends in `/` so endpoint paths join underneath it instead of replacing
/// its last segment.
pub fn parse_base_url(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(err) => {
            warn!("[config] ignoring invalid base URL {trimmed:?}: {err}");
            return None;
        }
    };
    if !matches!(url.scheme(), "http" | "https") {
        warn!("[config] ignoring base URL with unsupported scheme {trimmed:?}");
        return None;
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Some(url)
}

fn clamp_retries(retries: u8) -> u8 {
    if retries > MAX_RETRIES {
        warn!("[config] retries={retries} exceeds the maximum of {MAX_RETRIES}; clamping");
        MAX_RETRIES
    } else {
        retries
    }
}

fn parse_env_number(key: &str, raw: &str) -> Option<u64> {
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("[config] ignoring {key}={raw:?}: not a whole number");
            None
        }
    }
}
