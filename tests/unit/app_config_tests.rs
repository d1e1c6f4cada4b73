/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::time::Duration;

use opensubtrans::app_config::{Config, LogLevel, ProviderConfig, TranslationProvider};
use opensubtrans::errors::ConfigError;
use opensubtrans::translation::cost::ModelPricing;

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "auto");
    assert_eq!(config.target_language, "Chinese (Traditional)");
    assert_eq!(config.translation.provider, TranslationProvider::OpenAI);
    assert_eq!(config.translation.get_model(), "gpt-5-mini");
    assert_eq!(config.translation.common.batch_size, 12);
    assert_eq!(config.translation.common.retry_count, 3);
    assert_eq!(config.translation.common.retry_backoff_ms, 1000);
    assert_eq!(config.translation.common.temperature, None);
    assert_eq!(config.translation.get_timeout(), Duration::from_secs(120));
    assert_eq!(config.log_level, LogLevel::Info);
}

#[test]
fn test_validate_withDefaultConfig_shouldRequireApiKey() {
    let config = Config::default();
    assert!(matches!(config.validate(), Err(ConfigError::MissingApiKey(p)) if p == "OpenAI"));
}

#[test]
fn test_validate_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = common::test_config("fr", 10);
    assert!(config.validate().is_ok());

    config.translation.common.batch_size = 0;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidBatchSize(0))));
    config.translation.common.batch_size = -1;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidBatchSize(-1))));
    config.translation.common.batch_size = 10;

    config.target_language = "xyz-not-a-language".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::InvalidLanguage(_))));
    config.target_language = "fr".to_string();

    config.translation.active_provider_config_mut().endpoint = "::not a url::".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::InvalidEndpoint { .. })));
}

#[test]
fn test_validate_withLocalProvider_shouldNotRequireApiKey() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Ollama;
    assert!(config.validate().is_ok());
    assert_eq!(config.translation.get_timeout(), Duration::from_secs(300));
    assert_eq!(config.translation.get_endpoint(), "http://localhost:11434");
}

#[test]
fn test_activeProviderConfigMut_withMissingProvider_shouldCreateIt() {
    let mut config = Config::default();
    config.translation.available_providers.clear();
    config.translation.provider = TranslationProvider::Anthropic;

    config.translation.active_provider_config_mut().model = "claude-test".to_string();

    assert_eq!(config.translation.available_providers.len(), 1);
    assert_eq!(config.translation.get_model(), "claude-test");
    assert_eq!(config.translation.get_endpoint(), "https://api.anthropic.com");
}

#[test]
fn test_providerFromStr_shouldParseKnownNames() {
    assert_eq!("OpenAI".parse::<TranslationProvider>().unwrap(), TranslationProvider::OpenAI);
    assert_eq!("lmstudio".parse::<TranslationProvider>().unwrap(), TranslationProvider::LMStudio);
    assert!(matches!("gemini".parse::<TranslationProvider>(), Err(ConfigError::InvalidProvider(_))));
    assert_eq!(TranslationProvider::LMStudio.display_name(), "LM Studio");
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.target_language, "Chinese (Traditional)");
    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.translation.available_providers.len(), 4);
    Ok(())
}

#[test]
fn test_loadOrCreate_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "target_language": "fr",
            "translation": {
                "provider": "anthropic",
                "available_providers": [{ "type": "anthropic", "api_key": "k" }],
                "common": { "batch_size": 20 },
                "pricing": { "claude-3-5-haiku-latest": { "input_per_million": 0.8, "output_per_million": 4.0 } }
            },
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.source_language, "auto");
    assert_eq!(config.translation.common.batch_size, 20);
    assert_eq!(config.translation.common.retry_count, 3);
    assert_eq!(config.translation.get_model(), "claude-3-5-haiku-latest");
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());

    let table = config.pricing_table();
    assert_eq!(table.get("claude-3-5-haiku-latest")?, &ModelPricing::new(0.8, 4.0));
    assert!(table.contains("gpt-5-mini"));
    Ok(())
}

#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_providerConfig_new_shouldUseProviderDefaults() {
    let lmstudio = ProviderConfig::new(TranslationProvider::LMStudio);
    assert_eq!(lmstudio.provider_type, "lmstudio");
    assert_eq!(lmstudio.endpoint, "http://localhost:1234/v1");
    assert_eq!(lmstudio.timeout_secs, 300);
}
