//! Make thumbnails.
//!
//! The entry points here take an image whose dimensions the caller already
//! knows, decide whether a thumbnail is warranted, and if so produce one in
//! the requested representation.

use std::{borrow::Cow, convert::Infallible, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use crate::{geometry, prim::*, resample::resample, surface::RasterSurface};

/// Where the source pixels come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// `data:<mime>;base64,<payload>`
    DataUrl(String),
    /// Encoded image bytes (PNG, JPEG, GIF, WebP)
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Encoded image bytes, decoding the data URL if necessary.
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            ImageSource::Bytes(b) => Ok(Cow::Borrowed(b)),
            ImageSource::DataUrl(url) => {
                parse_data_url(url).map(Cow::Owned).map_err(ThumbError::Decode)
            }
        }
    }
}

/// Only the base64 flavor carries binary images.
fn parse_data_url(url: &str) -> anyhow::Result<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("not a data URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("data URL has no payload"))?;
    if !header.ends_with(";base64") {
        return Err(anyhow!("data URL is not base64: {header:?}"));
    }
    STANDARD
        .decode(payload.trim())
        .context("data URL payload is not valid base64")
}

/// A source image and its declared pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    source: ImageSource,
    width: u32,
    height: u32,
}

impl ImageDescriptor {
    /// Both dimensions must be positive.
    pub fn new(source: ImageSource, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ThumbError::InvalidDimensions { width, height });
        }
        Ok(Self {
            source,
            width,
            height,
        })
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Requested output representation.
///
/// Parses from `"dataurl"` and `"blob"`; anything else is [`DataUrl`].
///
/// [`DataUrl`]: OutputFormat::DataUrl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum OutputFormat {
    #[default]
    DataUrl,
    Blob,
}

impl OutputFormat {
    /// Put PNG bytes in this representation.
    pub fn wrap(self, png: Vec<u8>) -> Encoded {
        match self {
            OutputFormat::DataUrl => Encoded::DataUrl(format!(
                "data:image/png;base64,{}",
                STANDARD.encode(png)
            )),
            OutputFormat::Blob => Encoded::Blob(png),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s {
            "blob" => OutputFormat::Blob,
            _ => OutputFormat::DataUrl,
        }
    }
}

impl From<String> for OutputFormat {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

/// Encoded thumbnail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    /// `data:image/png;base64,...`, ready to be assigned to an `src`
    DataUrl(String),
    /// Raw PNG
    Blob(Vec<u8>),
}

/// A generated thumbnail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    width: u32,
    height: u32,
    encoded: Encoded,
}

impl Thumbnail {
    pub fn new(width: u32, height: u32, encoded: Encoded) -> Self {
        Self {
            width,
            height,
            encoded,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn encoded(&self) -> &Encoded {
        &self.encoded
    }

    /// The data URL text or the PNG bytes, whichever it is.
    pub fn into_bytes(self) -> Vec<u8> {
        match self.encoded {
            Encoded::DataUrl(s) => s.into_bytes(),
            Encoded::Blob(b) => b,
        }
    }
}

/// Make a thumbnail, synchronously.
///
/// - `Ok(None)`: the image is close enough to the thumbnail box; use it as is.
/// - `Ok(Some(_))`: a thumbnail no larger than 210x280.
/// - `Err(_)`: see [`ThumbError`].
#[instrument(
    err,
    skip(image),
    fields(width = image.width(), height = image.height())
)]
pub fn create_thumbnail(
    image: &ImageDescriptor,
    format: OutputFormat,
) -> Result<Option<Thumbnail>> {
    let Some(plan) = geometry::plan(image.width(), image.height())? else {
        return Ok(None);
    };
    resample::<RasterSurface>(image, &plan, format).map(Some)
}

/// Make a thumbnail on a blocking thread.
///
/// Decoding, resampling, and encoding can take a while, so they are
/// delegated with Tokio.
#[instrument(
    err,
    skip(image),
    fields(width = image.width(), height = image.height())
)]
pub async fn create_thumbnail_async(
    image: ImageDescriptor,
    format: OutputFormat,
) -> Result<Option<Thumbnail>> {
    // Cheap; no need for a thread if there is nothing to do.
    if geometry::plan(image.width(), image.height())?.is_none() {
        return Ok(None);
    }
    tokio::task::spawn_blocking(move || create_thumbnail(&image, format))
        .await?
}

/// Thumbnail as a data URL for a clip image, if the clip has one.
pub async fn thumbnail_url(
    image: Option<ImageDescriptor>,
) -> Result<Option<Thumbnail>> {
    match image {
        Some(image) => {
            create_thumbnail_async(image, OutputFormat::DataUrl).await
        }
        None => Ok(None),
    }
}

/// Thumbnail as raw PNG bytes.
pub async fn thumbnail_blob(
    image: ImageDescriptor,
) -> Result<Option<Thumbnail>> {
    create_thumbnail_async(image, OutputFormat::Blob).await
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use base64::Engine as _;
    use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn png(img: RgbaImage) -> Vec<u8> {
        let mut cursor = Cursor::new(vec![]);
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    /// Left half red, right half blue.
    fn sideways(width: u32, height: u32) -> ImageDescriptor {
        let img = RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                RED
            } else {
                BLUE
            }
        });
        ImageDescriptor::new(ImageSource::Bytes(png(img)), width, height)
            .unwrap()
    }

    /// Top half red, bottom half blue.
    fn upright(width: u32, height: u32) -> ImageDescriptor {
        let img = RgbaImage::from_fn(width, height, |_, y| {
            if y < height / 2 {
                RED
            } else {
                BLUE
            }
        });
        ImageDescriptor::new(ImageSource::Bytes(png(img)), width, height)
            .unwrap()
    }

    fn decode(thumb: &Thumbnail) -> RgbaImage {
        let bytes = match thumb.encoded() {
            Encoded::Blob(b) => b.clone(),
            Encoded::DataUrl(s) => {
                let payload =
                    s.strip_prefix("data:image/png;base64,").unwrap();
                STANDARD.decode(payload).unwrap()
            }
        };
        image::load_from_memory(&bytes).unwrap().into_rgba8()
    }

    #[test]
    fn landscape_crops_from_the_left() {
        let thumb = create_thumbnail(&sideways(1000, 500), OutputFormat::Blob)
            .unwrap()
            .unwrap();
        assert_eq!((thumb.width(), thumb.height()), (210, 280));
        let img = decode(&thumb);
        assert_eq!(img.dimensions(), (210, 280));
        // Only the left 375 source columns survive: all red.
        assert!(img.pixels().all(|p| *p == RED));
    }

    #[test]
    fn portrait_crops_from_the_top() {
        let thumb = create_thumbnail(&upright(400, 1000), OutputFormat::DataUrl)
            .unwrap()
            .unwrap();
        assert!(matches!(thumb.encoded(), Encoded::DataUrl(_)));
        let img = decode(&thumb);
        assert_eq!(img.dimensions(), (210, 280));
        assert_eq!(*img.get_pixel(0, 0), RED);
        assert_eq!(*img.get_pixel(209, 200), RED);
    }

    #[test]
    fn narrow_portrait_stretch_crop() {
        // Under 210 wide: height is cropped to 280 * 63 / 210 = 84 rows.
        let thumb = create_thumbnail(&upright(63, 2000), OutputFormat::Blob)
            .unwrap()
            .unwrap();
        assert_eq!((thumb.width(), thumb.height()), (63, 84));
        let img = decode(&thumb);
        assert_eq!(img.dimensions(), (63, 84));
        assert!(img.pixels().all(|p| *p == RED));

        // Fractional bound: 134.67 rows of source into 134 rows of output.
        let thumb = create_thumbnail(&upright(101, 2000), OutputFormat::DataUrl)
            .unwrap()
            .unwrap();
        assert_eq!(decode(&thumb).dimensions(), (101, 134));
    }

    #[test]
    fn several_passes() {
        let thumb = create_thumbnail(&upright(800, 2000), OutputFormat::Blob)
            .unwrap()
            .unwrap();
        assert_eq!(decode(&thumb).dimensions(), (210, 280));
    }

    #[test]
    fn skip_small() {
        let out = create_thumbnail(&sideways(252, 336), OutputFormat::Blob);
        assert_eq!(out.unwrap(), None);
    }

    #[test]
    fn skip_does_not_decode() {
        let image = ImageDescriptor::new(
            ImageSource::Bytes(b"garbage".to_vec()),
            200,
            200,
        )
        .unwrap();
        assert_eq!(create_thumbnail(&image, OutputFormat::Blob).unwrap(), None);
    }

    #[test]
    fn invalid_dimensions() {
        assert!(matches!(
            ImageDescriptor::new(ImageSource::Bytes(vec![]), 0, 100),
            Err(ThumbError::InvalidDimensions { width: 0, height: 100 })
        ));
    }

    #[test]
    fn undecodable() {
        let image = ImageDescriptor::new(
            ImageSource::Bytes(b"garbage".to_vec()),
            1000,
            1000,
        )
        .unwrap();
        assert!(matches!(
            create_thumbnail(&image, OutputFormat::Blob),
            Err(ThumbError::Decode(_))
        ));

        let image = ImageDescriptor::new(
            ImageSource::DataUrl("data:text/plain,hello".into()),
            1000,
            1000,
        )
        .unwrap();
        assert!(matches!(
            create_thumbnail(&image, OutputFormat::Blob),
            Err(ThumbError::Decode(_))
        ));
    }

    #[test]
    fn data_url_source() {
        let ImageSource::Bytes(bytes) = sideways(800, 600).source().clone()
        else {
            unreachable!()
        };
        let url = format!("data:image/png;base64,{}", STANDARD.encode(bytes));
        let image =
            ImageDescriptor::new(ImageSource::DataUrl(url), 800, 600).unwrap();
        let thumb = create_thumbnail(&image, OutputFormat::DataUrl)
            .unwrap()
            .unwrap();
        // 800x600 scales to 373x280, cropped to 210 wide.
        assert_eq!((thumb.width(), thumb.height()), (210, 280));
    }

    #[test]
    fn format_parsing() {
        assert_eq!("blob".parse::<OutputFormat>().unwrap(), OutputFormat::Blob);
        assert_eq!(
            "dataurl".parse::<OutputFormat>().unwrap(),
            OutputFormat::DataUrl
        );
        assert_eq!(
            "jpeg".parse::<OutputFormat>().unwrap(),
            OutputFormat::DataUrl
        );
        let f: OutputFormat = serde_json::from_str(r#""blob""#).unwrap();
        assert_eq!(f, OutputFormat::Blob);
        let f: OutputFormat = serde_json::from_str(r#""BLOB""#).unwrap();
        assert_eq!(f, OutputFormat::DataUrl);
    }

    #[tokio::test]
    async fn async_paths() {
        let thumb = thumbnail_blob(sideways(1000, 500)).await.unwrap().unwrap();
        assert!(matches!(thumb.encoded(), Encoded::Blob(_)));
        assert_eq!(decode(&thumb).dimensions(), (210, 280));

        let thumb = thumbnail_url(Some(upright(400, 1000)))
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(thumb.encoded(), Encoded::DataUrl(_)));

        assert_eq!(thumbnail_url(None).await.unwrap(), None);
        assert_eq!(
            thumbnail_url(Some(sideways(100, 100))).await.unwrap(),
            None
        );
    }
}
