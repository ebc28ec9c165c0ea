use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use image::{Rgb, RgbImage};
use material_fingerprint::analysis::{
    CANONICAL_RESOLUTION, ColorSettings, FeatureExtractor, GeometryCache, SpectralSettings,
};

fn textured_image(size: u32) -> RgbImage {
    RgbImage::from_fn(size, size, |x, y| {
        let stripe = ((x as f32 * 0.35 + y as f32 * 0.12).sin() * 90.0 + 128.0) as u8;
        let speckle = ((x * 31 + y * 17) % 23) as u8;
        Rgb([stripe, stripe.saturating_sub(speckle), 80 + speckle])
    })
}

fn bench_geometry(c: &mut Criterion) {
    c.bench_function("geometry_cache_build_64", |b| {
        b.iter(|| GeometryCache::build(black_box(64), 24, 32).expect("geometry"));
    });
}

fn bench_extraction(c: &mut Criterion) {
    let geometry = Arc::new(GeometryCache::canonical().expect("canonical geometry"));
    let extractor = FeatureExtractor::new(
        geometry,
        SpectralSettings::default(),
        ColorSettings::default(),
    )
    .expect("extractor");
    let image = textured_image(CANONICAL_RESOLUTION as u32 + 64);

    c.bench_function("extract_descriptor_canonical", |b| {
        b.iter(|| extractor.extract_vector(black_box(&image)).expect("extract"));
    });
}

criterion_group!(benches, bench_geometry, bench_extraction);
criterion_main!(benches);
