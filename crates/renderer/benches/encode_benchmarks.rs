//! Benchmarks for channel encoding and frame composition.
//!
//! Run with: cargo bench --package renderer --bench encode_benchmarks

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use moisture_common::GridShape;
use rand::Rng;
use renderer::{encode_channel, EncodedFrame, ScalingLaw};

/// Generate a total-column-water-like grid (kg/m², mostly 0..70 with noise).
fn generate_tcw_grid(width: usize, height: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    let mut data = vec![0.0f32; width * height];

    for y in 0..height {
        // Moist tropics, dry poles
        let lat_factor = 1.0 - ((y as f32 / height as f32) - 0.5).abs() * 2.0;
        for x in 0..width {
            let noise = rng.gen_range(-5.0..5.0);
            data[y * width + x] = (lat_factor * 60.0 + noise).max(0.0);
        }
    }
    data
}

fn bench_encode_channel(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_channel");
    let law = ScalingLaw::new(0.0, 110.0);

    // 1° grid, 0.5° grid, ERA5 0.25° grid
    for &(width, height) in &[(360usize, 181usize), (720, 361), (1440, 721)] {
        let data = generate_tcw_grid(width, height);
        group.throughput(Throughput::Elements((width * height) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &data,
            |b, data| b.iter(|| encode_channel(black_box(data), black_box(&law))),
        );
    }
    group.finish();
}

fn bench_frame_png(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_png");
    group.sample_size(20);

    let (width, height) = (1440, 721);
    let grid = GridShape::new(height, width);
    let tcw = generate_tcw_grid(width, height);
    let anomaly: Vec<f32> = tcw.iter().map(|v| v - 30.0).collect();
    let tcw_law = ScalingLaw::new(0.0, 110.0);
    let anomaly_law = ScalingLaw::new(-50.0, 50.0);
    let ts = NaiveDate::from_ymd_opt(2021, 11, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();

    group.bench_function("era5_0p25", |b| {
        b.iter(|| {
            let frame = EncodedFrame::from_fields(
                ts,
                grid,
                [
                    (tcw.as_slice(), &tcw_law),
                    (tcw.as_slice(), &tcw_law),
                    (anomaly.as_slice(), &anomaly_law),
                ],
            )
            .unwrap();
            black_box(frame.to_png().unwrap())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_encode_channel, bench_frame_png);
criterion_main!(benches);
