//! Command-line configuration for the desktop sketch pad.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::export::DEFAULT_FILE_NAME;
use crate::surface::SurfaceConfig;
use crate::types::StrokeStyle;

/// Height of the status strip under the drawing surface.
pub const HUD_BAND: usize = 24;

#[derive(Parser, Debug, Clone)]
#[command(name = "sketchpad", version, about = "Freehand sketch pad with PNG export and upload")]
pub struct Config {
    /// Upload endpoint; uploads are disabled without one
    #[arg(long, env = "SKETCHPAD_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Initial window width
    #[arg(long, default_value_t = 900)]
    pub width: usize,

    /// Initial window height
    #[arg(long, default_value_t = 700)]
    pub height: usize,

    /// Where "save" writes the PNG
    #[arg(long, default_value = DEFAULT_FILE_NAME)]
    pub output: PathBuf,

    /// Pixel ratio for the saved PNG
    #[arg(long, default_value_t = 3.0)]
    pub pixel_ratio: f32,

    /// Stroke width in logical units
    #[arg(long, default_value_t = 2.0)]
    pub stroke_width: f32,

    /// Image to load at start-up
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Upload timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl Config {
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn surface(&self) -> SurfaceConfig {
        let (width, height) = surface_size_for_viewport(self.width, self.height);
        SurfaceConfig {
            width,
            height,
            stroke: StrokeStyle { width: self.stroke_width, ..StrokeStyle::default() },
        }
    }
}

/// Surface size that fits a window of `width` x `height` above the HUD band.
pub fn surface_size_for_viewport(width: usize, height: usize) -> (u32, u32) {
    (width as u32, height.saturating_sub(HUD_BAND) as u32)
}
