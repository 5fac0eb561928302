use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use vanillagan::config::{Config, DiscriminatorConfig, GeneratorConfig, IMAGE_FEATURES};
use vanillagan::math::Matrix;
use vanillagan::models::Gan;

// Reduced widths keep one iteration in the millisecond range.
fn small_config() -> Config {
    let mut config = Config::default();
    config.generator = GeneratorConfig {
        latent_dim: 32,
        channels: 8,
        ..GeneratorConfig::default()
    };
    config.discriminator = DiscriminatorConfig {
        channels: vec![4, 4, 8, 8, 16],
        ..DiscriminatorConfig::default()
    };
    config
}

fn bench_train_step(c: &mut Criterion) {
    let batch = 16;
    let mut rng = rand::thread_rng();
    let data: Vec<f32> = (0..batch * IMAGE_FEATURES).map(|_| rng.gen()).collect();
    let real = Matrix::from_vec(batch, IMAGE_FEATURES, data);
    let mut gan = match Gan::from_config(&small_config(), 0) {
        Ok(gan) => gan,
        Err(e) => panic!("building gan failed: {e}"),
    };

    c.bench_function("gan_train_step", |b| {
        b.iter(|| {
            let res = gan.train_step(black_box(&real));
            black_box(res).ok();
        });
    });
}

criterion_group!(benches, bench_train_step);
criterion_main!(benches);
