use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::http_client::http_client;

const MIN_LEAGUE_ID_LEN: usize = 5;
const MAX_LEAGUE_ID_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manager {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub player_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueLookup {
    #[serde(deserialize_with = "string_or_number")]
    pub league_id: String,
    #[serde(default)]
    pub league_name: String,
    #[serde(default)]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub managers: Vec<Manager>,
}

/// Images for one category tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTab {
    pub category: String,
    pub images: Vec<String>,
}

impl CategoryTab {
    pub fn title(&self) -> String {
        let mut chars = self.category.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Message shown in place of an empty tab.
    pub fn placeholder(&self) -> Option<String> {
        if self.images.is_empty() {
            Some(format!("{} content is not available yet.", self.title()))
        } else {
            None
        }
    }
}

pub fn validate_league_id(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    let len_ok = (MIN_LEAGUE_ID_LEN..=MAX_LEAGUE_ID_LEN).contains(&trimmed.len());
    if !len_ok || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::InvalidLeagueId(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

pub fn parse_league_json(raw: &str, requested_id: &str) -> Result<LeagueLookup, ApiError> {
    let root: Value = serde_json::from_str(raw.trim())
        .map_err(|err| ApiError::Malformed(format!("invalid league json: {err}")))?;
    let has_id = match root.get("leagueId") {
        Some(Value::String(id)) => !id.trim().is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    };
    if !has_id {
        return Err(ApiError::LeagueNotFound(requested_id.to_string()));
    }
    let mut lookup = LeagueLookup::deserialize(&root)
        .map_err(|err| ApiError::Malformed(format!("bad league record: {err}")))?;
    sort_managers(&mut lookup.managers);
    Ok(lookup)
}

pub fn sort_managers(managers: &mut [Manager]) {
    managers.sort_by(|a, b| {
        a.player_name
            .to_lowercase()
            .cmp(&b.player_name.to_lowercase())
            .then_with(|| a.player_name.cmp(&b.player_name))
    });
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    images: Option<Vec<String>>,
}

pub fn parse_images_json(raw: &str) -> Result<Vec<String>, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let resp: ImagesResponse = serde_json::from_str(trimmed)
        .map_err(|err| ApiError::Malformed(format!("invalid images json: {err}")))?;
    Ok(resp.images.unwrap_or_default())
}

/// League lookup, image listing and image download against the companion API.
#[derive(Debug, Clone)]
pub struct CompanionApi {
    base_url: String,
    timeout: Duration,
}

impl CompanionApi {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: config.http_timeout,
        }
    }

    pub fn league_url(&self, league_id: &str) -> String {
        format!("{}/api/referrals-data/{league_id}", self.base_url)
    }

    pub fn images_url(&self, league_id: &str, gameweek: u32, category: &str) -> String {
        format!(
            "{}/api/fantasy/images/{league_id}?gameweek={gameweek}&category={category}",
            self.base_url
        )
    }

    pub fn image_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    pub fn fetch_league(&self, raw_id: &str) -> Result<LeagueLookup, ApiError> {
        let league_id = validate_league_id(raw_id)?;
        let body = match self.get_text(&self.league_url(&league_id)) {
            Err(ApiError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                return Err(ApiError::LeagueNotFound(league_id));
            }
            other => other?,
        };
        let lookup = parse_league_json(&body, &league_id)?;
        info!(
            league_id = %lookup.league_id,
            managers = lookup.managers.len(),
            "league data fetched"
        );
        Ok(lookup)
    }

    pub fn fetch_images(
        &self,
        league_id: &str,
        gameweek: u32,
        category: &str,
    ) -> Result<Vec<String>, ApiError> {
        let url = self.images_url(league_id, gameweek, category);
        debug!(%url, "fetching images");
        let body = self.get_text(&url)?;
        parse_images_json(&body)
    }

    /// One tab per configured category, in order. Any failed category fails the whole set.
    pub fn fetch_tabs(
        &self,
        league_id: &str,
        gameweek: u32,
        categories: &[String],
    ) -> Result<Vec<CategoryTab>, ApiError> {
        let mut tabs = Vec::with_capacity(categories.len());
        for category in categories {
            let images = self.fetch_images(league_id, gameweek, category)?;
            tabs.push(CategoryTab {
                category: category.clone(),
                images,
            });
        }
        Ok(tabs)
    }

    /// Downloads each image into `dir`, named by [`image_file_name`].
    pub fn download_images(&self, paths: &[String], dir: &Path) -> Result<Vec<PathBuf>, ApiError> {
        let client = http_client(self.timeout)?;
        fs::create_dir_all(dir)?;

        let mut out = Vec::with_capacity(paths.len());
        for (idx, path) in paths.iter().enumerate() {
            let url = self.image_url(path);
            let resp = client.get(&url).send()?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().unwrap_or_default();
                return Err(ApiError::Status { status, body });
            }
            let bytes = resp.bytes()?;
            let target = dir.join(image_file_name(path, idx));
            fs::write(&target, &bytes)?;
            out.push(target);
        }
        Ok(out)
    }

    fn get_text(&self, url: &str) -> Result<String, ApiError> {
        let client = http_client(self.timeout)?;
        let resp = client.get(url).send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }
        Ok(body)
    }
}

/// Index-prefixed so images sharing a name in different folders don't collide.
pub fn image_file_name(path: &str, idx: usize) -> String {
    let without_query = path.split(['?', '#']).next().unwrap_or_default();
    match without_query.rsplit('/').next().filter(|name| !name.is_empty()) {
        Some(name) => format!("{idx:02}-{name}"),
        None => format!("{idx:02}-image"),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}
