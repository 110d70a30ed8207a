use std::io::Cursor;
use std::time::Duration;

use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Result, SourceError};

/// Subreddits with mostly wallpaper-grade photos
const SUBREDDITS: &[&str] = &[
    "wallpaper",
    "wallpapers",
    "MinimalWallpaper",
    "EarthPorn",
    "SpacePorn",
    "CityPorn",
    "SkyPorn",
    "WaterPorn",
    "AbandonedPorn",
];
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];
/// Downloads attempted per subreddit before moving on
const MAX_ATTEMPTS: usize = 20;
const LISTING_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Child>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Child {
    #[serde(default)]
    pub data: Post,
}

#[derive(Debug, Default, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub url_overridden_by_dest: Option<String>,
    #[serde(default)]
    pub preview: Option<Preview>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Preview {
    #[serde(default)]
    pub images: Vec<PreviewImage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewImage {
    #[serde(default)]
    pub source: PreviewSource,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewSource {
    #[serde(default)]
    pub url: String,
}

fn is_direct_image(url: &str) -> bool {
    let lower = url.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext))
}

/// Image URLs from a listing: direct links, else the first preview image
pub fn collect_image_urls(listing: &Listing) -> Vec<String> {
    listing
        .data
        .children
        .iter()
        .filter_map(|child| {
            let post = &child.data;
            match post.url_overridden_by_dest.as_deref() {
                Some(url) if is_direct_image(url) => Some(url.to_string()),
                _ => post
                    .preview
                    .as_ref()
                    .and_then(|preview| preview.images.first())
                    .map(|image| image.source.url.replace("&amp;", "&"))
                    .filter(|url| !url.is_empty()),
            }
        })
        .collect()
}

/// Dimensions of encoded image bytes, read from the header only
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Reddit top-posts provider
#[derive(Debug, Clone)]
pub struct RedditSource {
    client: reqwest::Client,
    min_width: u32,
    min_height: u32,
}

impl RedditSource {
    pub const NAME: &'static str = "Reddit";

    pub fn new(client: reqwest::Client, min_width: u32, min_height: u32) -> Self {
        Self {
            client,
            min_width,
            min_height,
        }
    }

    /// Try subreddits in random order until one yields a large enough image
    pub async fn fetch(&self) -> Result<Vec<u8>> {
        let mut subreddits = SUBREDDITS.to_vec();
        subreddits.shuffle(&mut rand::thread_rng());

        for subreddit in subreddits {
            info!("Downloading from Reddit r/{}...", subreddit);
            match self.fetch_from(subreddit).await {
                Ok(Some(bytes)) => return Ok(bytes),
                Ok(None) => debug!("r/{} had no suitable image", subreddit),
                Err(e) => warn!("Error with r/{}: {}, trying next...", subreddit, e),
            }
        }

        Err(SourceError::NoSuitableImage {
            provider: Self::NAME.to_string(),
            min_width: self.min_width,
            min_height: self.min_height,
        }
        .into())
    }

    async fn fetch_from(&self, subreddit: &str) -> Result<Option<Vec<u8>>> {
        let url = format!("https://www.reddit.com/r/{}/top.json", subreddit);
        let listing: Listing = self
            .client
            .get(&url)
            .query(&[("limit", "100"), ("t", "month")])
            .timeout(LISTING_TIMEOUT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SourceError::unavailable(Self::NAME, e))?
            .json()
            .await
            .map_err(|e| SourceError::unavailable(Self::NAME, e))?;

        let mut urls = collect_image_urls(&listing);
        urls.shuffle(&mut rand::thread_rng());

        for image_url in urls.iter().take(MAX_ATTEMPTS) {
            debug!("Downloading: {}", image_url);
            let bytes = match self.download(image_url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!("Skipping {}: {}", image_url, e);
                    continue;
                }
            };

            match image_dimensions(&bytes) {
                Some((width, height)) if width >= self.min_width && height >= self.min_height => {
                    info!("Downloaded {}x{} image from r/{}", width, height, subreddit);
                    return Ok(Some(bytes));
                }
                Some((width, height)) => {
                    debug!("Image too small ({}x{}), trying next...", width, height);
                }
                None => debug!("Not a readable image: {}", image_url),
            }
        }

        Ok(None)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .client
            .get(url)
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

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, RgbImage};

    const LISTING: &str = r#"{
        "kind": "Listing",
        "data": {
            "children": [
                {"data": {"url_overridden_by_dest": "https://i.redd.it/abc.JPG"}},
                {"data": {
                    "url_overridden_by_dest": "https://www.reddit.com/gallery/xyz",
                    "preview": {"images": [{"source": {"url": "https://preview.redd.it/p.jpg?width=3840&amp;s=1"}}]}
                }},
                {"data": {"url_overridden_by_dest": "https://youtube.com/watch"}},
                {"data": {"preview": {"images": []}}},
                {"data": {}}
            ]
        }
    }"#;

    #[test]
    fn test_collect_image_urls() {
        let listing: Listing = serde_json::from_str(LISTING).unwrap();
        let urls = collect_image_urls(&listing);

        assert_eq!(
            urls,
            vec![
                "https://i.redd.it/abc.JPG".to_string(),
                "https://preview.redd.it/p.jpg?width=3840&s=1".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_listing() {
        let listing: Listing = serde_json::from_str("{}").unwrap();
        assert!(collect_image_urls(&listing).is_empty());
    }

    #[test]
    fn test_direct_image_detection() {
        assert!(is_direct_image("https://i.imgur.com/x.webp"));
        assert!(is_direct_image("https://i.redd.it/x.PNG"));
        assert!(!is_direct_image("https://v.redd.it/video"));
    }

    #[test]
    fn test_image_dimensions_from_header() {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(31, 17))
            .write_to(&mut bytes, ImageOutputFormat::Png)
            .unwrap();

        assert_eq!(image_dimensions(bytes.get_ref()), Some((31, 17)));
        assert_eq!(image_dimensions(b"<html>nope</html>"), None);
    }
}
