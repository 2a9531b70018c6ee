use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

/// Configuration for the catalog module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,
    #[serde(default = "default_recent_take")]
    pub recent_take: u64,
    #[serde(with = "humantime_serde", default = "default_recent_ttl")]
    pub recent_ttl: Duration,
    /// Recommended cadence for the external like-recount scheduler. The
    /// counters are eventually consistent; this bounds the staleness window.
    #[serde(with = "humantime_serde", default = "default_like_recount_interval")]
    pub like_recount_interval: Duration,
    #[serde(with = "humantime_serde", default = "default_temp_max_age")]
    pub temp_max_age: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            temp_dir: default_temp_dir(),
            media_dir: default_media_dir(),
            recent_take: default_recent_take(),
            recent_ttl: default_recent_ttl(),
            like_recount_interval: default_like_recount_interval(),
            temp_max_age: default_temp_max_age(),
        }
    }
}

impl CatalogConfig {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            recent_take: self.recent_take,
            recent_ttl: self.recent_ttl,
            temp_max_age: self.temp_max_age,
        }
    }
}

fn default_page_size() -> u64 {
    5
}

fn default_max_page_size() -> u64 {
    100
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("public/temp")
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("public/movie")
}

fn default_recent_take() -> u64 {
    10
}

fn default_recent_ttl() -> Duration {
    Duration::from_secs(30)
}

fn default_like_recount_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_temp_max_age() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}
