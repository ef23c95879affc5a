//! Command line options shared by the viewer and the headless renderer.

use clap::{Args, ValueEnum};
use umbra_march::{RaymarchConfig, Resolution, Shading};

/// Shading model selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShadingArg {
    Lambert,
    Normals,
    Steps,
    Depth,
}

impl From<ShadingArg> for Shading {
    fn from(arg: ShadingArg) -> Self {
        match arg {
            ShadingArg::Lambert => Shading::default(),
            ShadingArg::Normals => Shading::Normals,
            ShadingArg::Steps => Shading::Steps,
            ShadingArg::Depth => Shading::Depth,
        }
    }
}

/// Sphere tracer settings.
#[derive(Debug, Clone, Args)]
pub struct MarchArgs {
    /// Image width in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Field of view in degrees
    #[arg(long, default_value_t = 90.0)]
    pub fov: f32,

    /// Maximum march steps per pixel
    #[arg(long, default_value_t = 1000)]
    pub max_steps: u32,

    /// Surface-hit tolerance
    #[arg(long, default_value_t = 0.001)]
    pub epsilon: f32,

    /// Samples closer than this to a surface count as hits
    #[arg(long, default_value_t = 0.001)]
    pub min_distance: f32,

    /// Rays travelling further than this miss
    #[arg(long, default_value_t = 100.0)]
    pub max_distance: f32,

    /// Shading model for hit pixels
    #[arg(long, value_enum, default_value_t = ShadingArg::Lambert)]
    pub shading: ShadingArg,
}

impl MarchArgs {
    /// Raymarch configuration for an image of `resolution`.
    ///
    /// Not validated here; construction of the raymarcher reports errors.
    pub fn config(&self, resolution: Resolution) -> RaymarchConfig {
        RaymarchConfig::default()
            .with_resolution(resolution.width, resolution.height)
            .with_field_of_view(self.fov)
            .with_quality(self.max_steps, self.epsilon)
            .with_distance_range(self.min_distance, self.max_distance)
    }

    /// Resolution given by `--width` / `--height`.
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// Offscreen resolution for a `window` size drawn at `scale`.
///
/// Each side is at least one pixel.
pub fn scaled_resolution(window: (u32, u32), scale: f32) -> Resolution {
    let scale_side = |side: u32| ((side as f32 * scale).round() as u32).max(1);
    Resolution::new(scale_side(window.0), scale_side(window.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        march: MarchArgs,
    }

    #[test]
    fn test_defaults_match_config_defaults() {
        let cli = TestCli::parse_from(["umbra"]);
        let config = cli.march.config(cli.march.resolution());

        assert_eq!(config, RaymarchConfig::default());
        assert_eq!(cli.march.shading, ShadingArg::Lambert);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = TestCli::parse_from([
            "umbra",
            "--width",
            "4",
            "--height",
            "4",
            "--max-steps",
            "64",
            "--shading",
            "steps",
        ]);
        let config = cli.march.config(cli.march.resolution());

        assert_eq!(config.resolution, Resolution::new(4, 4));
        assert_eq!(config.max_steps, 64);
        assert_eq!(Shading::from(cli.march.shading), Shading::Steps);
    }

    #[test]
    fn test_invalid_values_reach_validation() {
        let cli = TestCli::parse_from(["umbra", "--max-steps", "0"]);
        assert!(cli.march.config(cli.march.resolution()).validate().is_err());
    }

    #[test]
    fn test_scaled_resolution() {
        assert_eq!(scaled_resolution((1280, 720), 0.5), Resolution::new(640, 360));
        assert_eq!(scaled_resolution((1280, 720), 1.0), Resolution::new(1280, 720));
        assert_eq!(scaled_resolution((3, 1), 0.1), Resolution::new(1, 1));
    }
}
