use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dual_wallpaper::{
    config::Config,
    pipeline::WallpaperEngine,
    source::{ImageSource, SourceMode},
    wallpaper::{applier_from_config, NoopApplier, WallpaperApplier},
};

#[derive(Parser)]
#[command(
    name = "dual-wallpaper",
    version,
    about = "Download a wallpaper and split it across two stacked screens",
    long_about = "Dual-Wallpaper fetches an image from Pexels or Reddit, scales it to cover both screens of a dual-screen laptop plus the gap between them, and sets the upper and lower halves as wallpapers."
)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Search theme, overrides the config
    #[arg(short, long)]
    theme: Option<String>,

    /// Image provider, overrides the config
    #[arg(short, long, value_enum)]
    source: Option<SourceMode>,

    /// Use a local image instead of downloading one
    #[arg(long)]
    test_image: Option<PathBuf>,

    /// Directory for the generated panel images
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Only save the panels, do not set them as wallpapers
    #[arg(long)]
    no_apply: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(theme) = &self.theme {
            config.source.theme = theme.clone();
        }
        if let Some(mode) = self.source {
            config.source.mode = mode;
        }
        if let Some(image) = &self.test_image {
            config.source.test_mode = true;
            config.source.test_image = Some(image.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Dual-Wallpaper v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    cli.apply_overrides(&mut config);

    let applier: Arc<dyn WallpaperApplier> = if cli.no_apply {
        Arc::new(NoopApplier)
    } else {
        Arc::from(applier_from_config(&config.applier))
    };

    let engine = ImageSource::from_config(&config)
        .and_then(|source| WallpaperEngine::new(&config, source, applier));
    let engine = match engine {
        Ok(engine) => engine,
        Err(e) => {
            error!("{}", e.user_message());
            return Err(e.into());
        }
    };

    match engine.run().await {
        Ok(report) => {
            info!(
                "Done: {} image {}x{} -> {} / {}",
                report.provider,
                report.original_size.0,
                report.original_size.1,
                report.saved.upper.display(),
                report.saved.lower.display()
            );
            Ok(())
        }
        Err(e) => {
            error!("{}", e.user_message());
            if e.is_recoverable() {
                info!("This failure may succeed on the next run");
            }
            Err(e.into())
        }
    }
}
