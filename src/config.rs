use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.gegenpress.co.uk";
const APP_DIR: &str = "gegenpress";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CATEGORY: &str = "previews";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Json,
    Sqlite,
    Memory,
}

impl StoreBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "json" | "file" => Some(StoreBackend::Json),
            "sqlite" | "db" => Some(StoreBackend::Sqlite),
            "memory" | "mem" => Some(StoreBackend::Memory),
            _ => None,
        }
    }

    pub fn default_file_name(self) -> &'static str {
        match self {
            StoreBackend::Json => "store.json",
            StoreBackend::Sqlite => "store.sqlite",
            StoreBackend::Memory => "",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub http_timeout: Duration,
    pub store_backend: StoreBackend,
    pub store_path: Option<PathBuf>,
    // Image categories shown as tabs, in display order.
    pub categories: Vec<String>,
    pub events_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_vars(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let opt = |key: &str| {
            var(key).and_then(|val| {
                let trimmed = val.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        };

        let base_url = opt("GEGENPRESS_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let http_timeout = Duration::from_secs(
            opt("GEGENPRESS_HTTP_TIMEOUT_SECS")
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .clamp(1, 120),
        );
        let store_backend = opt("GEGENPRESS_STORE")
            .and_then(|val| StoreBackend::parse(&val))
            .unwrap_or(StoreBackend::Json);
        let store_path = opt("GEGENPRESS_STORE_PATH").map(PathBuf::from);
        let categories = opt("GEGENPRESS_CATEGORIES")
            .map(|raw| parse_categories(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_CATEGORY.to_string()]);
        let events_url = opt("GEGENPRESS_EVENTS_URL");

        Self {
            base_url,
            http_timeout,
            store_backend,
            store_path,
            categories,
            events_url,
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Explicit store path, or the backend's default file under the app cache dir.
    pub fn resolved_store_path(&self) -> Option<PathBuf> {
        if let Some(path) = self.store_path.as_ref() {
            return Some(path.clone());
        }
        if self.store_backend == StoreBackend::Memory {
            return None;
        }
        app_cache_dir().map(|dir| dir.join(self.store_backend.default_file_name()))
    }
}

fn parse_categories(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        let cat = part.trim().to_lowercase();
        if cat.is_empty() || out.contains(&cat) {
            continue;
        }
        out.push(cat);
    }
    out
}

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}
