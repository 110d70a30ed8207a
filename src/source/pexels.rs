use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, SourceError};
use crate::source::Orientation;

const SEARCH_URL: &str = "https://api.pexels.com/v1/search";
const PER_PAGE: u32 = 20;
/// Pages to pick from at random, for variety between runs
const MAX_PAGE: u32 = 10;
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Photo {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub src: PhotoSources,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoSources {
    #[serde(default)]
    pub original: String,
}

/// Photos that are large enough and have a downloadable original
pub fn suitable_photos(photos: &[Photo], min_width: u32, min_height: u32) -> Vec<&Photo> {
    photos
        .iter()
        .filter(|p| p.width >= min_width && p.height >= min_height)
        .filter(|p| !p.src.original.is_empty())
        .collect()
}

/// Pexels search API provider
#[derive(Debug, Clone)]
pub struct PexelsSource {
    client: reqwest::Client,
    api_key: String,
    theme: String,
    min_width: u32,
    min_height: u32,
    orientation: Orientation,
}

impl PexelsSource {
    pub const NAME: &'static str = "Pexels";

    pub fn new(
        client: reqwest::Client,
        api_key: &str,
        theme: &str,
        min_width: u32,
        min_height: u32,
        orientation: Orientation,
    ) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            theme: theme.to_string(),
            min_width,
            min_height,
            orientation,
        }
    }

    /// Search for the theme and download one random suitable photo
    pub async fn fetch(&self) -> Result<Vec<u8>> {
        let page = rand::thread_rng().gen_range(1..=MAX_PAGE);
        info!("Searching Pexels for \"{}\" (page {})...", self.theme, page);

        let response = self
            .client
            .get(SEARCH_URL)
            .header("Authorization", self.api_key.as_str())
            .query(&[
                ("query", self.theme.as_str()),
                ("orientation", self.orientation.as_str()),
                ("size", "large"),
            ])
            .query(&[("per_page", PER_PAGE), ("page", page)])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SourceError::unavailable(Self::NAME, e))?;

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::unavailable(Self::NAME, e))?;

        if search.photos.is_empty() {
            return Err(SourceError::unavailable(
                Self::NAME,
                format!("no results for \"{}\"", self.theme),
            )
            .into());
        }

        let candidates = suitable_photos(&search.photos, self.min_width, self.min_height);
        debug!(
            "{} of {} photos meet {}x{}",
            candidates.len(),
            search.photos.len(),
            self.min_width,
            self.min_height
        );

        let chosen = candidates
            .choose(&mut rand::thread_rng())
            .map(|p| (p.src.original.clone(), p.width, p.height))
            .ok_or(SourceError::NoSuitableImage {
                provider: Self::NAME.to_string(),
                min_width: self.min_width,
                min_height: self.min_height,
            })?;

        let (url, width, height) = chosen;
        info!("Downloading randomly selected Pexels photo: {}x{}...", width, height);

        let bytes = self
            .client
            .get(&url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SourceError::unavailable(Self::NAME, e))?
            .bytes()
            .await
            .map_err(|e| SourceError::unavailable(Self::NAME, e))?;

        Ok(bytes.to_vec())
    }
}
