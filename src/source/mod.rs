//! # Image Sources
//!
//! Supplies the raw encoded bytes of one wallpaper image. The strategy is
//! picked once per run from the configuration:
//!
//! - **Fixture**: a local file, used in test mode
//! - **Pexels**: search API (needs a key), falling back to Reddit
//! - **Reddit**: top posts of wallpaper subreddits
//!
//! The bytes are opaque here; decoding happens in
//! [`SourceImage::decode`](crate::compositor::SourceImage::decode).

pub mod fixture;
pub mod pexels;
pub mod reddit;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, SourceError};

pub use fixture::FixtureSource;
pub use pexels::PexelsSource;
pub use reddit::RedditSource;

const USER_AGENT: &str = concat!("dual-wallpaper/", env!("CARGO_PKG_VERSION"));

/// Remote provider strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Pexels search, Reddit when there is no key or Pexels fails
    #[default]
    #[serde(alias = "provider_a")]
    Pexels,
    /// Reddit only
    #[serde(alias = "provider_b")]
    Reddit,
}

/// Photo orientation filter for search providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
    Square,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::Square => "square",
        }
    }
}

/// Encoded image bytes and where they came from
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub provider: &'static str,
}

/// The image source selected for this run
#[derive(Debug)]
pub enum ImageSource {
    Fixture(FixtureSource),
    Pexels {
        primary: Option<PexelsSource>,
        fallback: RedditSource,
    },
    Reddit(RedditSource),
}

impl ImageSource {
    /// Pick the source strategy for a configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = &config.source;

        if source.test_mode {
            let path = source.test_image.as_ref().ok_or_else(|| SourceError::FixtureNotFound {
                path: "<source.test_image not set>".to_string(),
            })?;
            return Ok(Self::Fixture(FixtureSource::new(path, config.base_dir.as_deref())));
        }

        let client = http_client()?;
        let reddit = RedditSource::new(client.clone(), source.min_width, source.min_height);

        Ok(match source.mode {
            SourceMode::Reddit => Self::Reddit(reddit),
            SourceMode::Pexels => Self::Pexels {
                primary: source.api_key().map(|key| {
                    PexelsSource::new(
                        client,
                        key,
                        &source.theme,
                        source.min_width,
                        source.min_height,
                        source.orientation,
                    )
                }),
                fallback: reddit,
            },
        })
    }

    /// Short human-readable description for logs
    pub fn describe(&self) -> String {
        match self {
            Self::Fixture(fixture) => format!("local file {}", fixture.requested().display()),
            Self::Pexels { primary: Some(_), .. } => "Pexels (with Reddit fallback)".to_string(),
            Self::Pexels { primary: None, .. } => "Reddit (no Pexels API key)".to_string(),
            Self::Reddit(_) => "Reddit".to_string(),
        }
    }

    /// Fetch one image
    pub async fn fetch(&self) -> Result<FetchedImage> {
        match self {
            Self::Fixture(fixture) => Ok(FetchedImage {
                bytes: fixture.fetch().await?,
                provider: FixtureSource::NAME,
            }),
            Self::Reddit(reddit) => Ok(FetchedImage {
                bytes: reddit.fetch().await?,
                provider: RedditSource::NAME,
            }),
            Self::Pexels { primary, fallback } => {
                if let Some(pexels) = primary {
                    match pexels.fetch().await {
                        Ok(bytes) => {
                            return Ok(FetchedImage {
                                bytes,
                                provider: PexelsSource::NAME,
                            })
                        }
                        Err(e) => warn!("Pexels failed: {}", e),
                    }
                } else {
                    info!("Pexels API key not set, skipping Pexels");
                }

                info!("Falling back to Reddit...");
                Ok(FetchedImage {
                    bytes: fallback.fetch().await?,
                    provider: RedditSource::NAME,
                })
            }
        }
    }
}

/// HTTP client shared by the remote providers
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| SourceError::unavailable("HTTP client", e).into())
}
