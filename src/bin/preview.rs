// Offline preview: split a local image and show how the panels line up

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use dual_wallpaper::{
    compositor::{Compositor, SourceImage, VerticalAnchor},
    config::LayoutConfig,
    wallpaper::WallpaperStore,
};

#[derive(Parser)]
#[command(name = "preview", about = "Split a local image into dual-screen panels and a stitched preview")]
struct Args {
    /// Source image
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "./preview")]
    output_dir: PathBuf,

    #[arg(long, default_value_t = 1920)]
    upper_width: i64,

    #[arg(long, default_value_t = 1080)]
    upper_height: i64,

    #[arg(long, default_value_t = 1920)]
    lower_width: i64,

    #[arg(long, default_value_t = 515)]
    lower_height: i64,

    #[arg(long, default_value_t = 100, allow_hyphen_values = true)]
    offset_px: i64,

    /// Center the canvas vertically instead of anchoring it at the top
    #[arg(long)]
    center: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args = Args::parse();
    let anchor = if args.center {
        VerticalAnchor::Center
    } else {
        VerticalAnchor::Top
    };

    let layout_config = LayoutConfig {
        upper_width: args.upper_width,
        upper_height: args.upper_height,
        lower_width: args.lower_width,
        lower_height: args.lower_height,
        offset_px: args.offset_px,
        vertical_anchor: anchor,
    };
    let layout = layout_config.to_layout()?;

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let source = SourceImage::decode(&bytes)?;
    info!("Source: {}x{}", source.width(), source.height());

    let compositor = Compositor::new().with_anchor(layout_config.vertical_anchor);

    let plan = compositor.plan(&source, &layout)?;
    info!(
        "Scale {:.4} -> {}x{}, x_offset {}, y_offset {}",
        plan.scale, plan.scaled_width, plan.scaled_height, plan.x_offset, plan.y_offset
    );

    let result = compositor.compose_planned(&source, &plan)?;
    let saved = WallpaperStore::new(&args.output_dir, 95).save(&result)?;

    let stitched_path = args.output_dir.join("stitched_preview.png");
    result
        .stitched_preview()
        .save(&stitched_path)
        .with_context(|| format!("writing {}", stitched_path.display()))?;

    info!("Upper:    {}", saved.upper.display());
    info!("Lower:    {}", saved.lower.display());
    info!("Stitched: {}", stitched_path.display());
    Ok(())
}
