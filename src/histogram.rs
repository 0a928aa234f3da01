//! Joint color histogram extraction.
//!
//! [`ColorHistogram`] is a single three-dimensional distribution over the
//! combined `(R, G, B)` tuple rather than three independent per-channel
//! histograms. Each axis maps `[0, 256)` linearly onto `bins_per_channel`
//! bins, so with the default 32 bins every bin spans 8 intensity levels.
//!
//! # Example
//!
//! ```
//! use shotdetect::{ColorHistogram, Frame};
//!
//! let frame = Frame::filled(16, 9, [255, 0, 8]);
//! let histogram = ColorHistogram::extract(&frame, 32)?;
//!
//! assert_eq!(histogram.bin(31, 0, 1), 1.0);
//! assert!((histogram.total() - 1.0).abs() < 1e-9);
//! # Ok::<(), shotdetect::ShotDetectError>(())
//! ```

use crate::{
    distance::{DistanceMethod, distance},
    error::ShotDetectError,
    frame::Frame,
};

/// Default number of bins along each color axis.
pub const DEFAULT_BINS_PER_CHANNEL: usize = 32;

/// An L1-normalized joint color histogram.
///
/// Bins are stored flattened in `(r, g, b)` row-major order: the bin for
/// `(r, g, b)` lives at `(r * n + g) * n + b`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorHistogram {
    bins_per_channel: usize,
    bins: Vec<f64>,
}

impl ColorHistogram {
    /// Build the normalized joint histogram of an RGB frame.
    ///
    /// Every pixel increments exactly one bin; each bin is then divided by
    /// the pixel count so the histogram sums to 1.
    ///
    /// # Errors
    ///
    /// - [`ShotDetectError::InvalidConfiguration`] if `bins_per_channel` is
    ///   not in `1..=256`.
    /// - [`ShotDetectError::InvalidFrame`] if the frame has zero pixels or
    ///   does not have exactly three channels. Grayscale or alpha frames must
    ///   be converted to RGB before extraction.
    pub fn extract(frame: &Frame, bins_per_channel: usize) -> Result<Self, ShotDetectError> {
        validate_bins_per_channel(bins_per_channel)?;

        if frame.channels() != 3 {
            return Err(ShotDetectError::InvalidFrame {
                width: frame.width(),
                height: frame.height(),
                channels: frame.channels(),
                reason: "histogram extraction requires exactly 3 channels".to_string(),
            });
        }

        let pixel_count = frame.pixel_count();
        if pixel_count == 0 {
            return Err(ShotDetectError::InvalidFrame {
                width: frame.width(),
                height: frame.height(),
                channels: frame.channels(),
                reason: "frame has no pixels".to_string(),
            });
        }

        #[cfg(feature = "rayon")]
        let counts = crate::parallel::accumulate_parallel(frame.data(), bins_per_channel);
        #[cfg(not(feature = "rayon"))]
        let counts = {
            let mut counts = vec![0_u64; bins_per_channel.pow(3)];
            accumulate(frame.data(), bins_per_channel, &mut counts);
            counts
        };

        let total = pixel_count as f64;
        let bins = counts.into_iter().map(|count| count as f64 / total).collect();

        Ok(Self {
            bins_per_channel,
            bins,
        })
    }

    /// Wrap precomputed bin values.
    ///
    /// The values are taken as-is; they are not normalized.
    ///
    /// # Errors
    ///
    /// Returns [`ShotDetectError::InvalidConfiguration`] if
    /// `bins_per_channel` is out of range or `bins` does not hold exactly
    /// `bins_per_channel³` values, or if any value is negative or not finite.
    pub fn from_bins(bins_per_channel: usize, bins: Vec<f64>) -> Result<Self, ShotDetectError> {
        validate_bins_per_channel(bins_per_channel)?;

        let expected = bins_per_channel.pow(3);
        if bins.len() != expected {
            return Err(ShotDetectError::InvalidConfiguration(format!(
                "histogram with {bins_per_channel} bins per channel needs {expected} values, got {}",
                bins.len()
            )));
        }

        if bins.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(ShotDetectError::InvalidConfiguration(
                "histogram bins must be finite and non-negative".to_string(),
            ));
        }

        Ok(Self {
            bins_per_channel,
            bins,
        })
    }

    /// Number of bins along each color axis.
    pub fn bins_per_channel(&self) -> usize {
        self.bins_per_channel
    }

    /// Flattened bin values in `(r, g, b)` row-major order.
    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    /// Value of the bin at the given per-axis bin indices.
    ///
    /// # Panics
    ///
    /// Panics if any index is `>= bins_per_channel`.
    pub fn bin(&self, red: usize, green: usize, blue: usize) -> f64 {
        let n = self.bins_per_channel;
        assert!(
            red < n && green < n && blue < n,
            "bin index out of range for {n} bins per channel"
        );
        self.bins[(red * n + green) * n + blue]
    }

    /// Sum of all bins (1 for an extracted histogram).
    pub fn total(&self) -> f64 {
        self.bins.iter().sum()
    }

    /// Distance to another histogram under `method`.
    ///
    /// Shorthand for [`crate::distance::distance`].
    pub fn distance(&self, other: &Self, method: DistanceMethod) -> Result<f64, ShotDetectError> {
        distance(self, other, method)
    }
}

fn validate_bins_per_channel(bins_per_channel: usize) -> Result<(), ShotDetectError> {
    if bins_per_channel == 0 || bins_per_channel > 256 {
        return Err(ShotDetectError::InvalidConfiguration(format!(
            "bins per channel must be between 1 and 256, got {bins_per_channel}"
        )));
    }
    Ok(())
}

/// Map one 8-bit intensity to its bin along an axis.
#[inline]
pub(crate) fn bin_index(value: u8, bins_per_channel: usize) -> usize {
    value as usize * bins_per_channel / 256
}

/// Add the pixels of an interleaved RGB buffer to `counts`.
///
/// `data.len()` must be a multiple of 3; trailing bytes are ignored.
pub(crate) fn accumulate(data: &[u8], bins_per_channel: usize, counts: &mut [u64]) {
    let n = bins_per_channel;
    for pixel in data.chunks_exact(3) {
        let red = bin_index(pixel[0], n);
        let green = bin_index(pixel[1], n);
        let blue = bin_index(pixel[2], n);
        counts[(red * n + green) * n + blue] += 1;
    }
}
