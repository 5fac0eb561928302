use std::io::Write;
use vanillagan::config::Config;
use vanillagan::data::Split;
use vanillagan::optim::OptimizerKind;
use vanillagan::GanError;

fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_match_reference_hyperparameters() {
    let c = Config::default();
    assert_eq!(c.data.batch_size, 128);
    assert_eq!(c.data.shuffle_buffer, 6000);
    assert_eq!(c.data.prefetch, 64);
    assert_eq!(c.data.split, Split::Train);
    assert_eq!(c.generator.latent_dim, 128);
    assert_eq!(c.training.generator_lr, 1e-4);
    assert_eq!(c.training.discriminator_lr, 1e-5);
    assert_eq!(c.training.label_noise, 0.15);
    assert_eq!(c.training.optimizer, OptimizerKind::Adam);
    assert_eq!(c.discriminator.channels, vec![16, 32, 64, 128, 256]);
    assert_eq!(c.discriminator.dropout, 0.4);
    assert_eq!(c.monitor.num_img, 3);
    assert!(c.validate().is_ok());
}

#[test]
fn partial_toml_overrides_only_listed_fields() {
    let file = write_temp(
        ".toml",
        r#"
[training]
epochs = 3
seed = 9

[data]
split = "test"
"#,
    );
    let c = Config::from_path(file.path()).unwrap();
    assert_eq!(c.training.epochs, 3);
    assert_eq!(c.seed(), 9);
    assert_eq!(c.data.split, Split::Test);
    assert_eq!(c.data.batch_size, 128);
}

#[test]
fn json_config_is_accepted() {
    let file = write_temp(".json", r#"{"monitor": {"num_img": 5}, "training": {"optimizer": "sgd"}}"#);
    let c = Config::from_path(file.path()).unwrap();
    assert_eq!(c.monitor.num_img, 5);
    assert_eq!(c.training.optimizer, OptimizerKind::Sgd);
}

#[test]
fn invalid_values_are_rejected() {
    let file = write_temp(".toml", "[data]\nbatch_size = 0\n");
    assert!(matches!(Config::from_path(file.path()), Err(GanError::Config(_))));

    let mut c = Config::default();
    c.discriminator.dropout = 1.0;
    assert!(c.validate().is_err());

    let mut c = Config::default();
    c.training.label_noise = 0.6;
    assert!(c.validate().is_err());
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = write_temp(".toml", "[training\n");
    assert!(matches!(Config::from_path(file.path()), Err(GanError::Toml(_))));
}
