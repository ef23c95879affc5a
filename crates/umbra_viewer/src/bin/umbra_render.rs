//! Headless renderer: marches the demo scene once and writes a PNG.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use umbra_march::Raymarcher;
use umbra_viewer::{demo_camera, demo_scene, MarchArgs};

/// Render the demo scene to an image file.
#[derive(Debug, Parser)]
#[command(name = "umbra_render", version, about)]
struct Cli {
    #[command(flatten)]
    march: MarchArgs,

    /// Output image path
    #[arg(short, long, default_value = "umbra.png")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let config = cli.march.config(cli.march.resolution());

    let mut raymarcher = Raymarcher::new(config)?
        .with_field(demo_scene())
        .with_shading(cli.march.shading.into());

    let buffer = raymarcher.update(&demo_camera())?;
    let (width, height) = (buffer.width(), buffer.height());
    let image = image::RgbaImage::from_raw(width, height, buffer.to_rgba8())
        .context("Offscreen buffer does not match its resolution")?;

    let stats = raymarcher.pass().stats();
    log::info!(
        "Rendered {}x{} in {:.2?}: {} hits, {:.1} mean steps",
        width,
        height,
        stats.elapsed,
        stats.hits,
        stats.mean_steps()
    );

    image
        .save(&cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    log::info!("Saved {}", cli.output.display());

    Ok(())
}
