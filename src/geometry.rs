//! Geometry planning
//!
//! Decide whether a source image deserves a thumbnail at all, and if so,
//! which axis gets scaled and which one gets cropped. No pixels are touched
//! here; only the dimensions the caller already knows.

use serde::Serialize;

use crate::prim::*;

/// The box every thumbnail must fit in, with the policy knobs around it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailBox {
    /// Widest thumbnail, pixels
    pub max_width: u32,
    /// Tallest thumbnail, pixels
    pub max_height: u32,
    /// Width over height of the display slot
    pub display_aspect_ratio: f64,
    /// Images within `factor` times the box on both axes are left alone.
    pub skip_factor: f64,
    /// Display-stretch compensation.
    ///
    /// The page layer may stretch a narrow thumbnail up to this width,
    /// so portrait thumbnails narrower than it get a tighter height crop
    /// to keep the on-screen aspect ratio.
    pub display_stretch_width: u32,
}

/// The one and only box: 210x280 at 3:4, skip within 120%.
pub const THUMBNAIL_BOX: ThumbnailBox = ThumbnailBox {
    max_width: 210,
    max_height: 280,
    display_aspect_ratio: 3.0 / 4.0,
    skip_factor: 1.20,
    display_stretch_width: 210,
};

/// Which axis was scaled; the other one is cropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Relatively wider than the box. Scale on y, crop on x.
    Landscape,
    /// Relatively narrower than (or exactly as wide as) the box.
    /// Scale on x, crop on y.
    Portrait,
}

/// Dimensions the resampler works towards.
///
/// `scaled_*` is the size of the whole image after scaling, before the crop.
/// `thumbnail_*` is what is left after the crop. Always
/// `thumbnail_* <= scaled_*`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResamplePlan {
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    /// Height of the crop before truncating to whole rows.
    ///
    /// The display-stretch bound can be fractional; the crop window is
    /// derived from this, only the output surface is truncated.
    pub crop_height: f64,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub orientation: Orientation,
}

impl ThumbnailBox {
    /// Width and height at or below which no thumbnail is made.
    pub fn skip_threshold(&self) -> (f64, f64) {
        (
            self.max_width as f64 * self.skip_factor,
            self.max_height as f64 * self.skip_factor,
        )
    }

    /// Plan a thumbnail for a `width` x `height` image.
    ///
    /// `Ok(None)` means the image is close enough to the box already.
    #[instrument(level = "debug", skip(self))]
    pub fn plan(&self, width: u32, height: u32) -> Result<Option<ResamplePlan>> {
        if width == 0 || height == 0 {
            return Err(ThumbError::InvalidDimensions { width, height });
        }

        let (wthr, hthr) = self.skip_threshold();
        if width as f64 <= wthr && height as f64 <= hthr {
            tracing::debug!("Within threshold, skip");
            return Ok(None);
        }

        let w = width as f64;
        let h = height as f64;
        let max_w = self.max_width as f64;
        let max_h = self.max_height as f64;

        let plan = if w / h > self.display_aspect_ratio {
            let factor = if h > max_h { max_h / h } else { 1.0 };
            let scaled_width = round(w * factor);
            let scaled_height = round(h * factor);
            ResamplePlan {
                thumbnail_width: scaled_width.min(self.max_width),
                thumbnail_height: scaled_height,
                crop_height: scaled_height as f64,
                scaled_width,
                scaled_height,
                orientation: Orientation::Landscape,
            }
        } else {
            let factor = if w > max_w { max_w / w } else { 1.0 };
            let scaled_width = round(w * factor);
            let scaled_height = round(h * factor);
            // Same as max_h / (stretch / w), without the float drift.
            let stretched = max_h * w / self.display_stretch_width as f64;
            let crop_height = (scaled_height as f64).min(max_h).min(stretched);
            ResamplePlan {
                thumbnail_width: scaled_width,
                thumbnail_height: (crop_height.floor() as u32).max(1),
                crop_height,
                scaled_width,
                scaled_height,
                orientation: Orientation::Portrait,
            }
        };

        tracing::debug!("Plan: {plan:?}");
        Ok(Some(plan))
    }
}

/// Plan against [`THUMBNAIL_BOX`].
pub fn plan(width: u32, height: u32) -> Result<Option<ResamplePlan>> {
    THUMBNAIL_BOX.plan(width, height)
}

/// Round half up to a pixel count. Never below one pixel.
pub(crate) fn round(x: f64) -> u32 {
    (x.round() as u32).max(1)
}
