//! Histogram comparison.
//!
//! All four metrics are symmetric reductions over the full bin set, so they
//! share one linear pass: a single [`Accumulator`] gathers the running sums
//! the selected [`DistanceMethod`] needs, and the method-specific formula is
//! applied once at the end.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{error::ShotDetectError, histogram::ColorHistogram};

/// Guard used for near-zero denominators.
const EPSILON: f64 = f64::EPSILON;

/// Statistical metric used to compare two histograms.
///
/// | Method | Range | Identical histograms |
/// |--------|-------|----------------------|
/// | `ChiSquare` | `[0, ∞)` | 0 |
/// | `Correlation` | `[-1, 1]` | 1 |
/// | `Intersection` | `[0, 1]` (normalized input) | 1 |
/// | `Bhattacharyya` | `[0, 1]` | 0 |
///
/// Shot detection uses `ChiSquare`; the others are general-purpose
/// comparison utilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DistanceMethod {
    /// `Σ (a−b)² / (a+b)`, skipping jointly-empty bins.
    #[default]
    ChiSquare,
    /// Pearson correlation of the two flattened bin sequences.
    Correlation,
    /// `Σ min(a, b)`.
    Intersection,
    /// Bhattacharyya (Hellinger) distance.
    Bhattacharyya,
}

impl DistanceMethod {
    /// Every supported method, in declaration order.
    pub const ALL: [DistanceMethod; 4] = [
        DistanceMethod::ChiSquare,
        DistanceMethod::Correlation,
        DistanceMethod::Intersection,
        DistanceMethod::Bhattacharyya,
    ];

    /// Short kebab-case name, as accepted by the command line.
    pub fn name(self) -> &'static str {
        match self {
            DistanceMethod::ChiSquare => "chi-square",
            DistanceMethod::Correlation => "correlation",
            DistanceMethod::Intersection => "intersection",
            DistanceMethod::Bhattacharyya => "bhattacharyya",
        }
    }
}

impl Display for DistanceMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// Compare two histograms under `method`.
///
/// # Errors
///
/// Returns [`ShotDetectError::ShapeMismatch`] if the histograms do not have
/// the same number of bins per channel.
///
/// # Example
///
/// ```
/// use shotdetect::{ColorHistogram, DistanceMethod, Frame, distance};
///
/// let black = ColorHistogram::extract(&Frame::filled(8, 8, [0, 0, 0]), 32)?;
/// let white = ColorHistogram::extract(&Frame::filled(8, 8, [255, 255, 255]), 32)?;
///
/// assert_eq!(distance(&black, &black, DistanceMethod::ChiSquare)?, 0.0);
/// assert_eq!(distance(&black, &white, DistanceMethod::ChiSquare)?, 2.0);
/// assert_eq!(distance(&black, &white, DistanceMethod::Intersection)?, 0.0);
/// # Ok::<(), shotdetect::ShotDetectError>(())
/// ```
pub fn distance(
    first: &ColorHistogram,
    second: &ColorHistogram,
    method: DistanceMethod,
) -> Result<f64, ShotDetectError> {
    if first.bins_per_channel() != second.bins_per_channel() {
        return Err(ShotDetectError::ShapeMismatch {
            left: first.bins_per_channel(),
            right: second.bins_per_channel(),
        });
    }

    let mut accumulator = Accumulator::new(method);
    for (&a, &b) in first.bins().iter().zip(second.bins()) {
        accumulator.push(a, b);
    }
    Ok(accumulator.finish())
}

/// Running sums for one pass over a pair of bin sequences.
///
/// `primary` holds the method's main reduction (chi-square sum, intersection
/// sum, Bhattacharyya coefficient, or `Σab` for correlation); the remaining
/// sums are only maintained for the methods that read them.
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    method: DistanceMethod,
    count: usize,
    primary: f64,
    sum_first: f64,
    sum_second: f64,
    sum_first_squared: f64,
    sum_second_squared: f64,
}

impl Accumulator {
    fn new(method: DistanceMethod) -> Self {
        Self {
            method,
            count: 0,
            primary: 0.0,
            sum_first: 0.0,
            sum_second: 0.0,
            sum_first_squared: 0.0,
            sum_second_squared: 0.0,
        }
    }

    #[inline]
    fn push(&mut self, a: f64, b: f64) {
        self.count += 1;
        match self.method {
            DistanceMethod::ChiSquare => {
                let sum = a + b;
                if sum.abs() >= EPSILON {
                    let difference = a - b;
                    self.primary += difference * difference / sum;
                }
            }
            DistanceMethod::Correlation => {
                self.primary += a * b;
                self.sum_first += a;
                self.sum_second += b;
                self.sum_first_squared += a * a;
                self.sum_second_squared += b * b;
            }
            DistanceMethod::Intersection => {
                self.primary += a.min(b);
            }
            DistanceMethod::Bhattacharyya => {
                self.primary += (a * b).sqrt();
                self.sum_first += a;
                self.sum_second += b;
            }
        }
    }

    fn finish(self) -> f64 {
        match self.method {
            DistanceMethod::ChiSquare | DistanceMethod::Intersection => self.primary,
            DistanceMethod::Correlation => {
                if self.count == 0 {
                    return 1.0;
                }
                let scale = 1.0 / self.count as f64;
                let numerator = self.primary - self.sum_first * self.sum_second * scale;
                let denominator = (self.sum_first_squared
                    - self.sum_first * self.sum_first * scale)
                    * (self.sum_second_squared - self.sum_second * self.sum_second * scale);
                if denominator.abs() > EPSILON {
                    numerator / denominator.sqrt()
                } else {
                    1.0
                }
            }
            DistanceMethod::Bhattacharyya => {
                let product = self.sum_first * self.sum_second;
                let scale = if product.abs() >= EPSILON {
                    1.0 / product.sqrt()
                } else {
                    1.0
                };
                (1.0 - self.primary * scale).max(0.0).sqrt()
            }
        }
    }
}
