//! Screenshot thumbnails
//!
//! Fit a full-size image into a 210x280 thumbnail box: scale on one axis,
//! crop on the other, and get there by halving a step at a time.
//!
//! ```no_run
//! use shotthumb::{create_thumbnail, ImageDescriptor, ImageSource, OutputFormat};
//!
//! let bytes = std::fs::read("shot.png").unwrap();
//! let image = ImageDescriptor::new(ImageSource::Bytes(bytes), 1280, 800).unwrap();
//! match create_thumbnail(&image, OutputFormat::Blob).unwrap() {
//!     Some(thumb) => println!("{}x{}", thumb.width(), thumb.height()),
//!     None => println!("small enough already"),
//! }
//! ```

pub mod geometry; // Scale/crop planning
pub mod prim; // Error and Result
pub mod resample; // Progressive halving
pub mod surface; // Drawable surfaces
pub mod thumb; // Entry points

pub use crate::{
    geometry::{plan, Orientation, ResamplePlan, ThumbnailBox, THUMBNAIL_BOX},
    prim::{Result, ThumbError},
    thumb::{
        create_thumbnail, create_thumbnail_async, thumbnail_blob,
        thumbnail_url, Encoded, ImageDescriptor, ImageSource, OutputFormat,
        Thumbnail,
    },
};
