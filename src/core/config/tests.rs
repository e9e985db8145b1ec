use super::types::Environment;
use super::{ConfigError, Settings};
use crate::test_support;

#[tokio::test]
async fn load_uses_defaults_in_test_env() {
    let _guard = test_support::env_lock().await;
    test_support::set_test_env();
    std::env::remove_var("ALLOWED_MEDIA_EXTENSIONS");
    std::env::remove_var("MAX_MEDIA_PER_ACHIEVEMENT");

    let settings = Settings::load().expect("settings");

    assert_eq!(settings.runtime().environment, Environment::Test);
    assert_eq!(settings.api().api_v1_str, "/api/v1");
    assert_eq!(settings.storage().max_media_per_achievement, 12);
    assert!(settings.storage().allowed_media_extensions.iter().any(|ext| ext == "pdf"));
    assert_eq!(settings.storage().max_upload_bytes(), 20 * 1024 * 1024);
}

#[tokio::test]
async fn load_rejects_unknown_media_extension() {
    let _guard = test_support::env_lock().await;
    test_support::set_test_env();
    std::env::set_var("ALLOWED_MEDIA_EXTENSIONS", "png,exe");

    let result = Settings::load();
    std::env::remove_var("ALLOWED_MEDIA_EXTENSIONS");

    match result {
        Err(ConfigError::InvalidValue { field, value }) => {
            assert_eq!(field, "ALLOWED_MEDIA_EXTENSIONS");
            assert_eq!(value, "exe");
        }
        other => panic!("expected invalid extension error, got {other:?}"),
    }
}

#[tokio::test]
async fn strict_config_requires_storage_secrets() {
    let _guard = test_support::env_lock().await;
    test_support::set_test_env();
    std::env::set_var("ACHIEVO_STRICT_CONFIG", "1");

    let result = Settings::load();
    std::env::set_var("ACHIEVO_STRICT_CONFIG", "0");

    assert!(
        matches!(result, Err(ConfigError::MissingSecret("S3_ACCESS_KEY/S3_SECRET_KEY"))),
        "unexpected result: {result:?}"
    );
}

#[tokio::test]
async fn load_rejects_zero_port() {
    let _guard = test_support::env_lock().await;
    test_support::set_test_env();
    std::env::set_var("ACHIEVO_PORT", "0");

    let result = Settings::load();
    std::env::remove_var("ACHIEVO_PORT");

    assert!(matches!(result, Err(ConfigError::InvalidPort(_))));
}
