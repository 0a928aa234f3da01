//! Boundary classification.

/// Default chi-square threshold above which a frame pair is a boundary.
pub const DEFAULT_THRESHOLD: f64 = 0.49;

/// Whether a frame pair with the given distance is a shot boundary.
///
/// The comparison is strict: a distance equal to the threshold is not a
/// boundary. A `NaN` distance never is.
///
/// ```
/// use shotdetect::is_boundary;
///
/// assert!(is_boundary(0.5, 0.49));
/// assert!(!is_boundary(0.49, 0.49));
/// ```
#[inline]
pub fn is_boundary(distance: f64, threshold: f64) -> bool {
    distance > threshold
}
