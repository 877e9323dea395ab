//! Drawable surfaces
//!
//! The resampler only needs three things from a raster backend: load
//! encoded bytes into something drawable, blit a region of one surface onto
//! another with or without smoothing, and serialize the result. [`Surface`]
//! captures exactly that; [`RasterSurface`] is the software implementation
//! on top of the `image` crate.

use std::io::Cursor;

use image::{
    imageops::{self, FilterType},
    ImageOutputFormat, RgbaImage,
};

use crate::prim::*;

/// Axis-aligned rectangle, pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Rectangle of `width` x `height` anchored at the origin
    pub fn origin(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Something pixels can be drawn onto.
pub trait Surface: Sized {
    /// Decode encoded image bytes (format sniffed).
    fn load_from(bytes: &[u8]) -> Result<Self>;

    /// A transparent surface.
    fn blank(width: u32, height: u32) -> Self;

    /// (width, height)
    fn dimensions(&self) -> (u32, u32);

    /// Draw `src_rect` of `src` into `dest_rect` of `self`, scaling as
    /// needed.
    ///
    /// Parts of `src_rect` outside of `src` are clipped, and the matching
    /// parts of `dest_rect` are left untouched.
    fn draw_region(
        &mut self,
        src: &Self,
        src_rect: Rect,
        dest_rect: Rect,
        smoothing: bool,
    );

    /// Serialize losslessly (PNG).
    fn encode(&self) -> Result<Vec<u8>>;
}

/// RGBA8 bitmap in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSurface(RgbaImage);

impl RasterSurface {
    /// Wrap an existing bitmap
    pub fn from_image(img: RgbaImage) -> Self {
        Self(img)
    }

    /// Borrow the bitmap
    pub fn image(&self) -> &RgbaImage {
        &self.0
    }
}

impl Surface for RasterSurface {
    #[instrument(level = "trace", skip(bytes), fields(len = bytes.len()))]
    fn load_from(bytes: &[u8]) -> Result<Self> {
        let img = image::io::Reader::new(Cursor::new(bytes))
            .with_guessed_format()
            .context("load_from: cannot guess format")
            .map_err(ThumbError::Decode)?
            .decode()
            .context("load_from: cannot decode image")
            .map_err(ThumbError::Decode)?;
        Ok(Self(img.into_rgba8()))
    }

    fn blank(width: u32, height: u32) -> Self {
        Self(RgbaImage::new(width, height))
    }

    fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    fn draw_region(
        &mut self,
        src: &Self,
        src_rect: Rect,
        dest_rect: Rect,
        smoothing: bool,
    ) {
        let Some((clipped, dest)) = clip(src.dimensions(), src_rect, dest_rect)
        else {
            tracing::trace!("Nothing to draw");
            return;
        };

        let filter = if smoothing {
            FilterType::Triangle
        } else {
            FilterType::Nearest
        };
        let region = imageops::crop_imm(
            &src.0,
            clipped.x,
            clipped.y,
            clipped.width,
            clipped.height,
        );
        let scaled = imageops::resize(&*region, dest.width, dest.height, filter);
        imageops::replace(&mut self.0, &scaled, dest.x as i64, dest.y as i64);
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(vec![]);
        self.0
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .context("encode: cannot write image")
            .map_err(ThumbError::Encode)?;
        Ok(cursor.into_inner())
    }
}

/// Clip `src_rect` to a `(width, height)` source and shrink `dest_rect`
/// by the same proportion.
///
/// `None` if nothing visible remains.
fn clip(
    (width, height): (u32, u32),
    src_rect: Rect,
    dest_rect: Rect,
) -> Option<(Rect, Rect)> {
    if src_rect.width == 0
        || src_rect.height == 0
        || dest_rect.width == 0
        || dest_rect.height == 0
        || src_rect.x >= width
        || src_rect.y >= height
    {
        return None;
    }

    let cw = src_rect.width.min(width - src_rect.x);
    let ch = src_rect.height.min(height - src_rect.y);

    // Scale the destination by the clipped fraction.
    let dw = (dest_rect.width as f64 * cw as f64 / src_rect.width as f64)
        .round() as u32;
    let dh = (dest_rect.height as f64 * ch as f64 / src_rect.height as f64)
        .round() as u32;
    if dw == 0 || dh == 0 {
        return None;
    }

    Some((
        Rect {
            x: src_rect.x,
            y: src_rect.y,
            width: cw,
            height: ch,
        },
        Rect {
            x: dest_rect.x,
            y: dest_rect.y,
            width: dw,
            height: dh,
        },
    ))
}
