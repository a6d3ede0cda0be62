use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use reveal_core::color::Rgba8;
use reveal_core::config::PipelineOptions;
use reveal_core::pipeline::{ImageSlot, PipelineCoordinator};

fn synthetic_stream(width: u32, height: u32, frames: u32) -> Vec<Vec<u8>> {
    let n = (width * height) as usize;
    (0..frames)
        .map(|f| {
            // A pulse that sweeps across the image over the stream's
            // duration, always closing with a qualifying envelope.
            let t = f as f32 / frames as f32;
            let sweep_alpha = ((t * std::f32::consts::PI).sin() * 255.0).max(0.0) as u8;
            let pixels = vec![Rgba8::new(200, 100, 50, sweep_alpha); n];
            Rgba8::slice_to_bytes(&pixels).to_vec()
        })
        .collect()
}

fn run_pipeline(width: u32, height: u32, frames: &[Vec<u8>]) {
    let mut opts = PipelineOptions::default();
    opts.gradient_size = (32, 32);
    let mut pipeline = PipelineCoordinator::new(opts);
    pipeline.initialize(width, height).unwrap();
    for bytes in frames {
        pipeline.push_frame(bytes).unwrap();
    }
    pipeline.finish_pushing_frames().unwrap();
    pipeline.compute_gradient().unwrap();
    pipeline.compute_gradient().unwrap();
    let _ = pipeline.get_image(ImageSlot::Timing).unwrap();
    let _ = pipeline.get_image(ImageSlot::Gradient).unwrap();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_end_to_end");
    for &(width, height, frames) in &[(64u32, 64u32, 30u32), (128, 128, 30)] {
        let stream = synthetic_stream(width, height, frames);
        group.bench_with_input(BenchmarkId::new("dims", format!("{width}x{height}x{frames}")), &stream, |b, stream| {
            b.iter(|| run_pipeline(width, height, stream));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
