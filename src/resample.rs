//! Progressive resampling
//!
//! One big downscale aliases badly when smoothing is off. Instead, halve
//! the working image until the next halving would reach the planned size,
//! then do a last pass that both resizes and crops to the thumbnail box.
//!
//! The pass geometry ([`Passes`]) is computed without touching pixels, so
//! the loop and its bound can be inspected on their own. [`downscale`]
//! drives a [`Surface`] through those passes.

use crate::{
    geometry::{round, ResamplePlan},
    prim::*,
    surface::{Rect, Surface},
    thumb::{ImageDescriptor, OutputFormat, Thumbnail},
};

/// Largest scale step for the intermediate passes
const MAX_RESIZE_SCALE_FACTOR: f64 = 0.5;

/// One blit: read `src_*` from the origin of the working image, write the
/// whole of a `dest_*` surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pass {
    pub src_width: u32,
    pub src_height: u32,
    pub dest_width: u32,
    pub dest_height: u32,
    /// The produced surface is the thumbnail.
    pub last: bool,
}

/// Iterator over the passes for a plan.
///
/// State is just the working dimensions; it ends after the pass whose
/// output fits the thumbnail box.
#[derive(Debug, Clone)]
pub struct Passes {
    plan: ResamplePlan,
    working: (u32, u32),
    done: bool,
}

impl Passes {
    /// Start from the full `width` x `height` source.
    pub fn new(plan: ResamplePlan, width: u32, height: u32) -> Self {
        Self {
            plan,
            working: (width, height),
            done: false,
        }
    }
}

impl Iterator for Passes {
    type Item = Pass;

    fn next(&mut self) -> Option<Pass> {
        if self.done {
            return None;
        }
        let plan = &self.plan;
        let (mut src_width, mut src_height) = self.working;
        let mut dest_width = round(src_width as f64 * MAX_RESIZE_SCALE_FACTOR);
        let mut dest_height =
            round(src_height as f64 * MAX_RESIZE_SCALE_FACTOR);

        if dest_width <= plan.scaled_width || dest_height <= plan.scaled_height
        {
            // Re-derive the crop window from the current working size,
            // rather than trusting the accumulated halvings.
            src_width = round(
                src_width as f64 * plan.thumbnail_width as f64
                    / plan.scaled_width as f64,
            );
            src_height = round(
                src_height as f64 * plan.crop_height / plan.scaled_height as f64,
            );
            dest_width = plan.thumbnail_width;
            dest_height = plan.thumbnail_height;
        }

        let last = dest_width <= plan.thumbnail_width
            && dest_height <= plan.thumbnail_height;
        if last {
            self.done = true;
        } else {
            self.working = (dest_width, dest_height);
        }

        Some(Pass {
            src_width,
            src_height,
            dest_width,
            dest_height,
            last,
        })
    }
}

/// Result of [`downscale`]
#[derive(Debug)]
pub struct Downscaled<S> {
    /// The thumbnail surface
    pub surface: S,
    /// How many blits it took
    pub passes: usize,
}

/// Run every pass of `plan` over `source`, nearest neighbour only.
///
/// `width` and `height` are the dimensions the caller declared for the
/// source; the first pass reads relative to those.
#[instrument(level = "debug", skip(source))]
pub fn downscale<S: Surface>(
    source: S,
    plan: &ResamplePlan,
    width: u32,
    height: u32,
) -> Downscaled<S> {
    let mut working = source;
    let mut passes = 0;
    for pass in Passes::new(*plan, width, height) {
        tracing::trace!("Pass {passes}: {pass:?}");
        let mut dest = S::blank(pass.dest_width, pass.dest_height);
        dest.draw_region(
            &working,
            Rect::origin(pass.src_width, pass.src_height),
            Rect::origin(pass.dest_width, pass.dest_height),
            false,
        );
        working = dest;
        passes += 1;
    }
    Downscaled {
        surface: working,
        passes,
    }
}

/// Load the descriptor's source, downscale it along `plan`, and encode the
/// result in `format`.
#[instrument(
    level = "debug",
    skip(image),
    fields(width = image.width(), height = image.height())
)]
pub fn resample<S: Surface>(
    image: &ImageDescriptor,
    plan: &ResamplePlan,
    format: OutputFormat,
) -> Result<Thumbnail> {
    let source = S::load_from(&image.source().bytes()?)?;
    let Downscaled { surface, passes } =
        downscale(source, plan, image.width(), image.height());
    let (width, height) = surface.dimensions();
    tracing::debug!("{width}x{height} after {passes} pass(es)");
    let png = surface.encode()?;
    Ok(Thumbnail::new(width, height, format.wrap(png)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::plan;

    fn passes(width: u32, height: u32) -> Vec<Pass> {
        let p = plan(width, height).unwrap().unwrap();
        Passes::new(p, width, height).collect()
    }

    #[test]
    fn landscape_single_pass() {
        // 1000x500 halves to 500x250, already below scaled height 280.
        assert_eq!(
            passes(1000, 500),
            vec![Pass {
                src_width: 375,
                src_height: 500,
                dest_width: 210,
                dest_height: 280,
                last: true,
            }]
        );
    }

    #[test]
    fn portrait_three_passes() {
        // scaled 210x525; 1600x4000 -> 800x2000 -> 400x1000 -> final.
        let p = passes(1600, 4000);
        assert_eq!(p.len(), 3);
        assert_eq!(
            (p[0].dest_width, p[0].dest_height, p[0].last),
            (800, 2000, false)
        );
        assert_eq!((p[1].src_width, p[1].src_height), (800, 2000));
        let last = p[2];
        assert!(last.last);
        // 400x1000 working, crop window 400 x 400*280/210
        assert_eq!((last.src_width, last.src_height), (400, 533));
        assert_eq!((last.dest_width, last.dest_height), (210, 280));
    }

    #[test]
    fn fractional_crop_window() {
        // 101 wide may stretch to 210: crop 280 * 101 / 210 = 134.67 rows.
        let p = passes(101, 2000);
        assert_eq!(
            p,
            vec![Pass {
                src_width: 101,
                src_height: 135,
                dest_width: 101,
                dest_height: 134,
                last: true,
            }]
        );
    }

    #[test]
    fn ends_at_thumbnail_size() {
        for (w, h) in [(253, 336), (4000, 300), (300, 9000), (7777, 3333)] {
            let p = plan(w, h).unwrap().unwrap();
            let last = Passes::new(p, w, h).last().unwrap();
            assert!(last.last);
            assert_eq!(
                (last.dest_width, last.dest_height),
                (p.thumbnail_width, p.thumbnail_height)
            );
        }
    }

    #[test]
    fn termination_bound() {
        let sizes = (1..100_000u32).step_by(2_347).chain([100_000, 1, 2, 3]);
        let sizes: Vec<u32> = sizes.collect();
        for &w in &sizes {
            for &h in &sizes {
                let Some(p) = plan(w, h).unwrap() else {
                    continue;
                };
                let n = Passes::new(p, w, h).count();
                let ratio = w.max(h) as f64
                    / p.thumbnail_width.max(p.thumbnail_height) as f64;
                let bound = ratio.log2().ceil() as usize + 1;
                assert!(n >= 1);
                assert!(n <= bound, "{w}x{h}: {n} passes > {bound}");
            }
        }
    }
}
