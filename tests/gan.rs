use rand::rngs::StdRng;
use rand::SeedableRng;
use vanillagan::config::{Config, DiscriminatorConfig, GeneratorConfig, IMAGE_FEATURES};
use vanillagan::math::Matrix;
use vanillagan::models::{noisy_labels, Discriminator, Gan, Generator};
use vanillagan::optim::{Adam, Optimizer, OptimizerKind};

fn tiny_config() -> Config {
    let mut config = Config::default();
    config.generator = GeneratorConfig {
        latent_dim: 8,
        channels: 2,
        ..GeneratorConfig::default()
    };
    config.discriminator = DiscriminatorConfig {
        channels: vec![2, 2, 2, 2, 2],
        ..DiscriminatorConfig::default()
    };
    config
}

fn snapshot(params: Vec<&mut vanillagan::layers::Param>) -> Vec<Vec<f32>> {
    params.into_iter().map(|p| p.value.data.clone()).collect()
}

#[test]
fn noisy_labels_stay_within_smoothing_bounds() {
    let mut rng = StdRng::seed_from_u64(11);
    let labels = noisy_labels(500, 500, 0.15, &mut rng);
    assert_eq!((labels.rows, labels.cols), (1000, 1));
    let (real, fake) = labels.data.split_at(500);
    assert!(real.iter().all(|&y| (-0.15..=0.15).contains(&y)));
    assert!(fake.iter().all(|&y| y <= 1.15 && y >= 0.85));
    // Noise is actually applied and independent per row.
    assert!(real.iter().any(|&y| y > 0.0));
    assert!(real.windows(2).any(|w| w[0] != w[1]));
}

#[test]
fn zero_noise_gives_hard_labels() {
    let labels = noisy_labels(2, 3, 0.0, &mut StdRng::seed_from_u64(0));
    assert_eq!(labels.data, vec![0.0, 0.0, 1.0, 1.0, 1.0]);
}

#[test]
fn one_step_on_zero_images_gives_finite_non_negative_losses() {
    let mut gan = Gan::from_config(&tiny_config(), 42).unwrap();
    let real = Matrix::zeros(128, IMAGE_FEATURES);
    let losses = gan.train_step(&real).unwrap();
    assert!(losses.d_loss.is_finite() && losses.d_loss >= 0.0);
    assert!(losses.g_loss.is_finite() && losses.g_loss >= 0.0);
}

#[test]
fn discriminator_phase_leaves_generator_untouched() {
    let mut gan = Gan::from_config(&tiny_config(), 1).unwrap();
    let before_g = snapshot(gan.generator.parameters());
    let before_d = snapshot(gan.discriminator.parameters());
    gan.discriminator_step(&Matrix::filled(8, IMAGE_FEATURES, 0.5)).unwrap();
    assert_eq!(snapshot(gan.generator.parameters()), before_g);
    assert_ne!(snapshot(gan.discriminator.parameters()), before_d);
}

#[test]
fn generator_phase_leaves_discriminator_untouched() {
    let mut gan = Gan::from_config(&tiny_config(), 2).unwrap();
    let before_g = snapshot(gan.generator.parameters());
    let before_d = snapshot(gan.discriminator.parameters());
    gan.generator_step(8).unwrap();
    assert_eq!(snapshot(gan.discriminator.parameters()), before_d);
    assert_ne!(snapshot(gan.generator.parameters()), before_g);
}

#[test]
fn discriminator_loss_trends_down_with_repeated_updates() {
    let config = tiny_config();
    let mut rng = StdRng::seed_from_u64(5);
    let generator = Generator::new(&config.generator, &mut rng).unwrap();
    let discriminator = Discriminator::new(&config.discriminator, &mut rng).unwrap();
    let mut gan = Gan::new(
        generator,
        discriminator,
        Box::new(Adam::with_lr(1e-4)),
        Box::new(Adam::with_lr(3e-3)),
        0.15,
        StdRng::seed_from_u64(6),
    );
    // Real images are solid white; untrained fakes hover around mid-grey.
    let real = Matrix::filled(16, IMAGE_FEATURES, 1.0);
    let losses: Vec<f32> = (0..40)
        .map(|_| gan.discriminator_step(&real).unwrap())
        .collect();
    let early: f32 = losses[..5].iter().sum::<f32>() / 5.0;
    let late: f32 = losses[35..].iter().sum::<f32>() / 5.0;
    assert!(late < early, "early {early} late {late}");
}

#[test]
fn sgd_from_config_trains_each_network_with_its_own_rate() {
    let mut config = tiny_config();
    config.training.optimizer = OptimizerKind::Sgd;
    config.training.generator_lr = 0.05;
    config.training.discriminator_lr = 0.05;
    assert_eq!(config.training.optimizer.build(0.5).learning_rate(), 0.5);

    let mut gan = Gan::from_config(&config, 4).unwrap();
    let before_g = snapshot(gan.generator.parameters());
    let before_d = snapshot(gan.discriminator.parameters());
    let losses = gan.train_step(&Matrix::filled(4, IMAGE_FEATURES, 0.5)).unwrap();
    assert!(losses.d_loss.is_finite() && losses.g_loss.is_finite());
    assert_ne!(snapshot(gan.generator.parameters()), before_g);
    assert_ne!(snapshot(gan.discriminator.parameters()), before_d);
}
