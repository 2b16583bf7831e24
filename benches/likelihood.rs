use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use faer::Mat;
use mogi_rs::{ModelConfig, UniformPrior};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// An 11 by 11 station grid with a zero displacement field, the shape of the
/// default synthetic case.
fn synthetic_case() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mogi-bench-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let mut stations = String::new();
    for i in 0..11 {
        for j in 0..11 {
            let x = (i as f64 - 5.0) * 2.0;
            let y = (j as f64 - 5.0) * 2.0;
            writeln!(stations, "{x},{y}").unwrap();
        }
    }
    fs::write(dir.join("stations.txt"), stations).unwrap();
    fs::write(dir.join("displacements.txt"), "0 ".repeat(363)).unwrap();
    dir
}

fn criterion_benchmark(c: &mut Criterion) {
    let config = ModelConfig {
        psets: vec![
            (
                "location".to_string(),
                Box::new(UniformPrior::new(2, -8.0, 8.0)) as _,
            ),
            (
                "depth".to_string(),
                Box::new(UniformPrior::new(1, 1.0, 5.0)) as _,
            ),
            (
                "source".to_string(),
                Box::new(UniformPrior::new(1, -1.0, 1.0)) as _,
            ),
        ],
        observations: 363,
        case: synthetic_case(),
        ..ModelConfig::default()
    };
    let model = config.initialize(0).unwrap();

    let samples = 1024;
    let mut theta = Mat::zeros(samples, model.parameters());
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    model.initialize_sample(&mut rng, theta.as_mut());

    let mut data = vec![0f64; samples];
    c.bench_function("data_likelihood 1024x363", |b| {
        b.iter(|| {
            model
                .data_likelihood(black_box(theta.as_ref()), black_box(&mut data))
                .unwrap()
        })
    });

    let mut prior = vec![0f64; samples];
    c.bench_function("prior_likelihood 1024", |b| {
        b.iter(|| model.prior_likelihood(black_box(theta.as_ref()), black_box(&mut prior)))
    });

    let mut mask = vec![0u8; samples];
    c.bench_function("verify 1024", |b| {
        b.iter(|| model.verify(black_box(theta.as_ref()), black_box(&mut mask)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
