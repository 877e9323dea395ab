//! Make a thumbnail from an image file

use std::{io::Cursor, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

use shotthumb::{
    create_thumbnail_async, plan, ImageDescriptor, ImageSource, OutputFormat,
};

/// Fit an image into the 210x280 thumbnail box.
///
/// Prints nothing when the image is small enough to be used as is.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Source image (PNG, JPEG, GIF, WebP)
    input: PathBuf,

    /// "dataurl" or "blob" (anything else means "dataurl")
    #[arg(short, long, default_value = "dataurl")]
    format: String,

    /// Write here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Declared width (default: read from the image header)
    #[arg(long)]
    width: Option<u32>,

    /// Declared height (default: read from the image header)
    #[arg(long)]
    height: Option<u32>,

    /// Print the plan as JSON and stop
    #[arg(long)]
    plan_only: bool,
}

#[tokio::main]
#[instrument]
async fn main() -> anyhow::Result<()> {
    // Set up logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let bytes = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("cannot read {:?}", args.input))?;

    // Header only; no full decode.
    let (width, height) = match (args.width, args.height) {
        (Some(w), Some(h)) => (w, h),
        (w, h) => {
            let (hw, hh) = image::io::Reader::new(Cursor::new(&bytes))
                .with_guessed_format()
                .context("cannot guess image format")?
                .into_dimensions()
                .context("cannot read image dimensions")?;
            (w.unwrap_or(hw), h.unwrap_or(hh))
        }
    };
    tracing::info!("{:?}: {width}x{height}", args.input);

    if args.plan_only {
        let plan = plan(width, height)?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let format = OutputFormat::from(args.format.as_str());
    let image = ImageDescriptor::new(ImageSource::Bytes(bytes), width, height)?;
    let Some(thumb) = create_thumbnail_async(image, format).await? else {
        tracing::info!("Small enough; no thumbnail needed");
        return Ok(());
    };
    tracing::info!("Thumbnail {}x{}", thumb.width(), thumb.height());

    let data = thumb.into_bytes();
    match args.output {
        Some(path) => tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("cannot write {path:?}"))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
