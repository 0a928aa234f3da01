//! Color histogram extraction tests.

use shotdetect::{ColorHistogram, DEFAULT_BINS_PER_CHANNEL, Frame, ShotDetectError};

fn gradient_frame(width: u32, height: u32) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push((x * 255 / width.max(1)) as u8);
            data.push((y * 255 / height.max(1)) as u8);
            data.push(((x + y) % 256) as u8);
        }
    }
    Frame::new(width, height, 3, data).expect("valid gradient frame")
}

// ── normalization ──────────────────────────────────────────────────

#[test]
fn bins_sum_to_one() {
    let frame = gradient_frame(97, 41);
    let histogram = ColorHistogram::extract(&frame, DEFAULT_BINS_PER_CHANNEL).unwrap();
    assert!((histogram.total() - 1.0).abs() < 1e-9);
    assert!(histogram.bins().iter().all(|&value| value >= 0.0));
}

#[test]
fn solid_frame_fills_single_bin() {
    let frame = Frame::filled(10, 10, [255, 0, 8]);
    let histogram = ColorHistogram::extract(&frame, 32).unwrap();

    assert_eq!(histogram.bin(31, 0, 1), 1.0);
    let nonzero = histogram.bins().iter().filter(|&&value| value > 0.0).count();
    assert_eq!(nonzero, 1);
}

#[test]
fn half_and_half_frame_splits_mass() {
    let mut data = Vec::new();
    for index in 0..8 {
        let pixel = if index < 4 { [0, 0, 0] } else { [255, 255, 255] };
        data.extend_from_slice(&pixel);
    }
    let frame = Frame::new(4, 2, 3, data).unwrap();
    let histogram = ColorHistogram::extract(&frame, 32).unwrap();

    assert_eq!(histogram.bin(0, 0, 0), 0.5);
    assert_eq!(histogram.bin(31, 31, 31), 0.5);
}

#[test]
fn bin_boundaries_follow_linear_mapping() {
    // With 32 bins each bin covers 8 intensity levels.
    let mut data = Vec::new();
    data.extend_from_slice(&[7, 8, 255]);
    data.extend_from_slice(&[0, 15, 248]);
    let frame = Frame::new(2, 1, 3, data).unwrap();
    let histogram = ColorHistogram::extract(&frame, 32).unwrap();

    assert_eq!(histogram.bin(0, 1, 31), 1.0);
}

#[test]
fn single_bin_histogram_holds_everything() {
    let histogram = ColorHistogram::extract(&gradient_frame(16, 16), 1).unwrap();
    assert_eq!(histogram.bins(), &[1.0]);
}

#[test]
fn finer_resolution_histogram() {
    let frame = Frame::filled(2, 2, [4, 8, 255]);
    let histogram = ColorHistogram::extract(&frame, 64).unwrap();
    assert_eq!(histogram.bins().len(), 64 * 64 * 64);
    assert_eq!(histogram.bin(1, 2, 63), 1.0);
}

#[test]
fn large_frame_matches_per_pixel_counts() {
    // Large enough to be split across several accumulation tasks.
    let frame = gradient_frame(400, 200);
    let bins = 16;
    let histogram = ColorHistogram::extract(&frame, bins).unwrap();

    let mut counts = vec![0_u64; bins * bins * bins];
    for pixel in frame.data().chunks_exact(3) {
        let red = pixel[0] as usize * bins / 256;
        let green = pixel[1] as usize * bins / 256;
        let blue = pixel[2] as usize * bins / 256;
        counts[(red * bins + green) * bins + blue] += 1;
    }

    let total = (400 * 200) as f64;
    for red in 0..bins {
        for green in 0..bins {
            for blue in 0..bins {
                let expected = counts[(red * bins + green) * bins + blue] as f64 / total;
                assert_eq!(
                    histogram.bin(red, green, blue),
                    expected,
                    "bin ({red}, {green}, {blue})"
                );
            }
        }
    }
}

// ── rejected input ─────────────────────────────────────────────────

#[test]
fn empty_frame_is_rejected() {
    let frame = Frame::new(0, 0, 3, Vec::new()).unwrap();
    let result = ColorHistogram::extract(&frame, 32);
    assert!(matches!(result, Err(ShotDetectError::InvalidFrame { .. })));
}

#[test]
fn non_rgb_frame_is_rejected() {
    let gray = Frame::new(4, 4, 1, vec![128; 16]).unwrap();
    let result = ColorHistogram::extract(&gray, 32);
    assert!(matches!(
        result,
        Err(ShotDetectError::InvalidFrame { channels: 1, .. })
    ));

    let rgba = Frame::new(2, 2, 4, vec![0; 16]).unwrap();
    assert!(ColorHistogram::extract(&rgba, 32).is_err());
}

#[test]
fn out_of_range_bin_count_is_rejected() {
    let frame = Frame::filled(2, 2, [0, 0, 0]);
    assert!(matches!(
        ColorHistogram::extract(&frame, 0),
        Err(ShotDetectError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        ColorHistogram::extract(&frame, 257),
        Err(ShotDetectError::InvalidConfiguration(_))
    ));
}

// ── precomputed bins ───────────────────────────────────────────────

#[test]
fn from_bins_validates_length_and_values() {
    assert!(ColorHistogram::from_bins(2, vec![0.125; 8]).is_ok());
    assert!(ColorHistogram::from_bins(2, vec![0.125; 7]).is_err());
    assert!(ColorHistogram::from_bins(1, vec![-1.0]).is_err());
    assert!(ColorHistogram::from_bins(1, vec![f64::NAN]).is_err());
}
