use std::sync::Arc;

use tokio::task;
use tracing::{debug, info};

use crate::{
    compositor::{CompositeResult, Compositor, CropPlan, ScreenLayout, SourceImage},
    config::Config,
    error::{Result, WallpaperError},
    source::ImageSource,
    wallpaper::{applier_from_config, SavedWallpapers, WallpaperApplier, WallpaperStore},
};

/// Summary of one completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub provider: &'static str,
    pub original_size: (u32, u32),
    pub plan: CropPlan,
    pub saved: SavedWallpapers,
    pub applier: String,
}

/// Orchestrates one wallpaper refresh
///
/// The pipeline is strictly sequential:
/// 1. Fetch - get encoded bytes from the image source
/// 2. Decode - turn them into an RGB source image
/// 3. Compose - cover-scale and split into upper/lower panels
/// 4. Persist - write both panels as JPEG
/// 5. Apply - hand the files to the wallpaper applier
pub struct WallpaperEngine {
    layout: ScreenLayout,
    compositor: Compositor,
    source: ImageSource,
    store: WallpaperStore,
    applier: Arc<dyn WallpaperApplier>,
}

impl WallpaperEngine {
    /// Create an engine with explicit collaborators
    pub fn new(
        config: &Config,
        source: ImageSource,
        applier: Arc<dyn WallpaperApplier>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            layout: config.layout.to_layout()?,
            compositor: Compositor::new().with_anchor(config.layout.vertical_anchor),
            source,
            store: WallpaperStore::from_config(config),
            applier,
        })
    }

    /// Create an engine with the collaborators the config describes
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = ImageSource::from_config(config)?;
        let applier: Arc<dyn WallpaperApplier> = Arc::from(applier_from_config(&config.applier));
        Self::new(config, source, applier)
    }

    pub fn layout(&self) -> &ScreenLayout {
        &self.layout
    }

    /// Run the whole pipeline once
    pub async fn run(&self) -> Result<RunReport> {
        info!("🖼️  Starting wallpaper refresh");
        info!("   Source: {}", self.source.describe());
        info!(
            "   Layout: upper {}x{}, lower {}x{}, gap {}px",
            self.layout.upper_width,
            self.layout.upper_height,
            self.layout.lower_width,
            self.layout.lower_height,
            self.layout.offset_px
        );

        // Step 1: fetch
        let fetched = self.source.fetch().await?;
        info!("   Fetched {} bytes from {}", fetched.bytes.len(), fetched.provider);

        // Steps 2-3: decode and compose
        let (original_size, plan, result) = self.decode_and_compose(fetched.bytes).await?;

        // Step 4: persist
        let saved = self.persist(result).await?;

        // Step 5: apply
        self.apply(saved.clone()).await?;

        info!("🎉 Wallpaper refresh complete");
        Ok(RunReport {
            provider: fetched.provider,
            original_size,
            plan,
            saved,
            applier: self.applier.name().to_string(),
        })
    }

    async fn decode_and_compose(
        &self,
        bytes: Vec<u8>,
    ) -> Result<((u32, u32), CropPlan, CompositeResult)> {
        let compositor = self.compositor;
        let layout = self.layout;

        task::spawn_blocking(move || -> Result<((u32, u32), CropPlan, CompositeResult)> {
            let source = SourceImage::decode(&bytes)?;
            let original_size = source.dimensions();
            info!("   Original image resolution: {}x{}", original_size.0, original_size.1);

            let plan = compositor.plan(&source, &layout)?;
            info!(
                "   Scaling to {}x{} (factor {:.3}), crop offset ({}, {})",
                plan.scaled_width, plan.scaled_height, plan.scale, plan.x_offset, plan.y_offset
            );

            let result = compositor.compose_planned(&source, &plan)?;
            debug!(
                "   Upper crop {:?}, lower crop {:?}",
                result.upper_rect, result.lower_rect
            );
            Ok((original_size, plan, result))
        })
        .await
        .map_err(|e| WallpaperError::generic(format!("composition task failed: {}", e)))?
    }

    async fn persist(&self, result: CompositeResult) -> Result<SavedWallpapers> {
        let store = self.store.clone();

        task::spawn_blocking(move || store.save(&result))
            .await
            .map_err(|e| WallpaperError::generic(format!("save task failed: {}", e)))?
    }

    async fn apply(&self, saved: SavedWallpapers) -> Result<()> {
        let applier = Arc::clone(&self.applier);
        debug!("Applying with {}", applier.name());

        task::spawn_blocking(move || applier.apply(&saved))
            .await
            .map_err(|e| WallpaperError::generic(format!("apply task failed: {}", e)))?
    }
}
