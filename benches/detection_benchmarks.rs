//! Benchmarks for histogram extraction, distance computation, and detection.
//!
//! Run with: cargo bench
//! Run with all features: cargo bench --all-features
//!
//! The video benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`; the others use synthetic frames.

use std::{hint::black_box, path::Path};

use criterion::{BenchmarkId, Criterion};
use shotdetect::{
    ColorHistogram, DetectionOptions, DistanceMethod, Frame, MemorySource, ShotDetector,
    ShotEvent, VideoSource, set_ffmpeg_log_level,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

/// A deterministic noisy frame so every bin region gets some mass.
fn noise_frame(width: u32, height: u32, seed: u32) -> Frame {
    let mut state = seed.wrapping_mul(2_654_435_761).max(1);
    let data = (0..width * height * 3)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect();
    Frame::new(width, height, 3, data).unwrap()
}

fn benchmark_histogram_extraction(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("histogram extraction");
    for (width, height) in [(320, 180), (640, 360), (1920, 1080)] {
        let frame = noise_frame(width, height, 7);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &frame,
            |bencher, frame| {
                bencher.iter(|| ColorHistogram::extract(black_box(frame), 32).unwrap());
            },
        );
    }
    group.finish();
}

fn benchmark_distances(criterion: &mut Criterion) {
    let first = ColorHistogram::extract(&noise_frame(320, 180, 1), 32).unwrap();
    let second = ColorHistogram::extract(&noise_frame(320, 180, 2), 32).unwrap();

    let mut group = criterion.benchmark_group("histogram distance");
    for method in DistanceMethod::ALL {
        group.bench_function(method.name(), |bencher| {
            bencher.iter(|| black_box(&first).distance(black_box(&second), method).unwrap());
        });
    }
    group.finish();
}

fn benchmark_in_memory_detection(criterion: &mut Criterion) {
    let frames: Vec<Frame> = (0..100).map(|index| noise_frame(160, 90, index / 10)).collect();

    criterion.bench_function("detect 100 in-memory frames", |bencher| {
        bencher.iter(|| {
            let mut source = MemorySource::at_frame_rate(frames.clone(), 25.0);
            let mut events: Vec<ShotEvent> = Vec::new();
            ShotDetector::new(DetectionOptions::new())
                .run(&mut source, &mut events)
                .unwrap()
        });
    });
}

fn benchmark_video_detection(criterion: &mut Criterion) {
    set_ffmpeg_log_level(log::LevelFilter::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let mut group = criterion.benchmark_group("video detection");
    group.sample_size(10);
    group.bench_function("sample video at 160px", |bencher| {
        bencher.iter(|| {
            let mut source =
                VideoSource::open_with_resolution(SAMPLE_VIDEO, Some(160), None).unwrap();
            let mut events: Vec<ShotEvent> = Vec::new();
            ShotDetector::new(DetectionOptions::new())
                .run(&mut source, &mut events)
                .unwrap()
        });
    });
    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_histogram_extraction,
    benchmark_distances,
    benchmark_in_memory_detection,
    benchmark_video_detection,
);
criterion::criterion_main!(benches);
