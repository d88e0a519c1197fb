//! Hue-histogram shot change detection.

use image::imageops::{self, FilterType};
use image::RgbImage;

/// Frames are downsampled to this square size before measuring.
pub const THUMBNAIL_SIZE: u32 = 64;
/// Number of hue bins.
pub const HISTOGRAM_BINS: usize = 256;
/// Default score above which a frame starts a new shot.
pub const DEFAULT_THRESHOLD: f64 = 0.15;

/// Decides whether sampled frames start a new shot.
///
/// Each frame is compared with the most recently *accepted* keyframe, not with
/// the previous sampled frame, so slow drifts eventually trigger a new keyframe.
#[derive(Debug, Clone)]
pub struct ShotDetector {
    threshold: f64,
    baseline: Option<Vec<f64>>,
}

impl ShotDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            baseline: None,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Dissimilarity between two frames in `[0, 1]`. Any measurement failure yields 0.
    pub fn score(a: &RgbImage, b: &RgbImage) -> f64 {
        match (hue_histogram(a), hue_histogram(b)) {
            (Some(p), Some(q)) => bhattacharyya(&p, &q),
            _ => 0.0,
        }
    }

    /// Returns true when `frame` is a keyframe, and makes it the new baseline.
    ///
    /// The first frame is always a keyframe. A frame whose histogram cannot be
    /// measured scores 0 against the baseline and is never accepted after the first.
    pub fn accept(&mut self, frame: &RgbImage) -> bool {
        let histogram = hue_histogram(frame);

        let is_keyframe = match (&self.baseline, &histogram) {
            (None, _) => true,
            (Some(base), Some(current)) => bhattacharyya(base, current) > self.threshold,
            (Some(_), None) => false,
        };

        if is_keyframe {
            if let Some(h) = histogram {
                self.baseline = Some(h);
            }
        }
        is_keyframe
    }

    /// Forget the baseline so the next frame is accepted.
    pub fn reset(&mut self) {
        self.baseline = None;
    }
}

impl Default for ShotDetector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

/// Hue histogram of a downsampled frame, normalized to sum 1.
fn hue_histogram(frame: &RgbImage) -> Option<Vec<f64>> {
    if frame.width() == 0 || frame.height() == 0 {
        return None;
    }

    let small = imageops::resize(frame, THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Triangle);

    let mut bins = vec![0.0f64; HISTOGRAM_BINS];
    for pixel in small.pixels() {
        let [r, g, b] = pixel.0;
        let hue = hue_degrees(r, g, b);
        let bin = ((hue / 360.0) * HISTOGRAM_BINS as f64) as usize;
        bins[bin.min(HISTOGRAM_BINS - 1)] += 1.0;
    }

    let total: f64 = bins.iter().sum();
    if total <= 0.0 {
        return None;
    }
    bins.iter_mut().for_each(|b| *b /= total);
    Some(bins)
}

/// HSV hue in degrees `[0, 360)`. Achromatic pixels have hue 0.
fn hue_degrees(r: u8, g: u8, b: u8) -> f64 {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    if delta == 0.0 {
        return 0.0;
    }

    let hue = if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    if hue < 0.0 {
        hue + 360.0
    } else {
        hue
    }
}

/// Bhattacharyya distance between two distributions summing to 1.
fn bhattacharyya(p: &[f64], q: &[f64]) -> f64 {
    let coefficient: f64 = p.iter().zip(q).map(|(a, b)| (a * b).sqrt()).sum();
    (1.0 - coefficient).max(0.0).sqrt().min(1.0)
}
