use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("harvester.db")
}

/// Remote listing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Listing URL; the page offset is sent as the `start` query parameter.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Items per page, fixed by the remote listing.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Hard ceiling on page requests per run.
    #[serde(default = "default_max_total_pages")]
    pub max_total_pages: u32,
    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            max_total_pages: default_max_total_pages(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://movie.douban.com/top250".to_string()
}

fn default_page_size() -> u32 {
    25
}

fn default_max_total_pages() -> u32 {
    10
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

/// Harvest run defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HarvestConfig {
    /// How many records to keep after the fetch phase.
    #[serde(default = "default_target_count")]
    pub target_count: usize,
    /// Concurrent page fetches.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    /// Transform pool width. Defaults to the available compute units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_concurrency: Option<usize>,
    /// Number of top ranked records logged after a run.
    #[serde(default = "default_preview_count")]
    pub preview_count: usize,
    /// Run one harvest when the server boots.
    #[serde(default)]
    pub run_on_startup: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            target_count: default_target_count(),
            fetch_concurrency: default_fetch_concurrency(),
            transform_concurrency: None,
            preview_count: default_preview_count(),
            run_on_startup: false,
        }
    }
}

fn default_target_count() -> usize {
    100
}

fn default_fetch_concurrency() -> usize {
    10
}

fn default_preview_count() -> usize {
    50
}
