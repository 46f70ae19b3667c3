use image::{DynamicImage, GrayImage, RgbaImage};
use std::path::Path;
use tracing::debug;
use xcap::Monitor;

use crate::error::CaptureError;

/// One immutable screen grab, shared by every matching call in a run.
///
/// The screen is captured exactly once per run. Every box the pipeline
/// infers afterwards is measured against this raster, so re-grabbing
/// mid-run would invalidate all previously computed geometry. Matching runs
/// on the luma plane; color carries no signal for rank glyphs.
#[derive(Debug)]
pub struct Capture {
    gray: GrayImage,
}

impl Capture {
    pub fn from_gray(gray: GrayImage) -> Self {
        Self { gray }
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            gray: DynamicImage::ImageRgba8(image).into_luma8(),
        }
    }

    /// Load a previously saved screenshot instead of grabbing the screen.
    /// Useful for replaying a recognition run against a known image.
    pub fn load(path: &Path) -> Result<Self, CaptureError> {
        let image = image::open(path).map_err(|source| CaptureError::Load {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            gray: image.into_luma8(),
        })
    }

    /// Grab the primary monitor, which xcap lists first.
    pub fn grab_primary_screen() -> Result<Self, CaptureError> {
        let monitors = Monitor::all().map_err(|e| CaptureError::Displays(Box::new(e)))?;
        let monitor = monitors.into_iter().next().ok_or(CaptureError::NoDisplays)?;

        let image = monitor
            .capture_image()
            .map_err(|e| CaptureError::Grab(Box::new(e)))?;
        debug!(
            width = image.width(),
            height = image.height(),
            "captured monitor"
        );
        Ok(Self::from_rgba(image))
    }

    pub fn image(&self) -> &GrayImage {
        &self.gray
    }

    pub fn width(&self) -> u32 {
        self.gray.width()
    }

    pub fn height(&self) -> u32 {
        self.gray.height()
    }
}
