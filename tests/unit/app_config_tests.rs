/*!
 * Tests for app configuration
 */

use anyhow::Result;
use std::path::PathBuf;
use std::str::FromStr;

use yashwai::app_config::{Config, LogLevel, OracleProvider};

use crate::common;

fn valid_config() -> Config {
    Config {
        source_video: PathBuf::from("talk.mp4"),
        ..Config::default()
    }
}

#[test]
fn test_default_config_shouldHaveSensibleValues() {
    let config = Config::default();

    assert_eq!(config.target_duration_secs, 120.0);
    assert!(config.demographic_keywords.is_empty());
    assert_eq!(config.oracle.provider, OracleProvider::Ollama);
    assert_eq!(config.oracle.concurrent_requests, 4);
    assert_eq!(config.oracle.retry_count, 0);
    assert_eq!(config.assembly.fade_secs, 0.5);
    assert_eq!(config.assembly.container, "mp4");
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.convergence.tolerance_secs, None);
}

#[test]
fn test_validate_withoutSourceVideo_shouldFail() {
    assert!(Config::default().validate().is_err());
    assert!(valid_config().validate().is_ok());
}

#[test]
fn test_validate_withBadTargetDuration_shouldFail() {
    for target in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        let mut config = valid_config();
        config.target_duration_secs = target;
        assert!(config.validate().is_err(), "target {} should be rejected", target);
    }
}

#[test]
fn test_validate_withAnthropicWithoutKey_shouldFail() {
    let mut config = valid_config();
    config.oracle.provider = OracleProvider::Anthropic;
    assert!(config.validate().is_err());

    config.oracle.api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withInvertedGains_shouldFail() {
    let mut config = valid_config();
    config.ducking.speech_gain = 0.7;
    config.ducking.silence_gain = 0.5;
    assert!(config.validate().is_err());

    config.ducking.speech_gain = 0.1;
    config.ducking.silence_gain = 1.5;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withNegativeToleranceOrFade_shouldFail() {
    let mut config = valid_config();
    config.convergence.tolerance_secs = Some(-1.0);
    assert!(config.validate().is_err());

    let mut config = valid_config();
    config.assembly.fade_secs = -0.1;
    assert!(config.validate().is_err());

    let mut config = valid_config();
    config.oracle.concurrent_requests = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let created = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(created.target_duration_secs, 120.0);

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.oracle.get_model(), created.oracle.get_model());
    Ok(())
}

#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "source_video": "lecture.mkv",
            "target_duration_secs": 45,
            "demographic_keywords": ["students"],
            "oracle": { "provider": "anthropic", "api_key": "key" },
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.target_duration_secs, 45.0);
    assert_eq!(config.demographic_keywords, vec!["students".to_string()]);
    assert_eq!(config.oracle.provider, OracleProvider::Anthropic);
    assert_eq!(config.oracle.get_endpoint(), OracleProvider::Anthropic.default_endpoint());
    assert_eq!(config.oracle.get_model(), OracleProvider::Anthropic.default_model());
    assert_eq!(config.oracle.concurrent_requests, 4);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.subtitle_path(), PathBuf::from("lecture.srt"));
    config.validate()?;
    Ok(())
}

#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_subtitle_path_withExplicitSource_shouldUseIt() {
    let mut config = valid_config();
    assert_eq!(config.subtitle_path(), PathBuf::from("talk.srt"));

    config.subtitle_source = Some(PathBuf::from("subs/talk.en.srt"));
    assert_eq!(config.subtitle_path(), PathBuf::from("subs/talk.en.srt"));
}

#[test]
fn test_oracle_provider_fromStr_shouldParseCaseInsensitively() {
    assert_eq!(OracleProvider::from_str("Anthropic").unwrap(), OracleProvider::Anthropic);
    assert_eq!(OracleProvider::from_str("OLLAMA").unwrap(), OracleProvider::Ollama);
    assert_eq!(OracleProvider::from_str("extractive").unwrap(), OracleProvider::Extractive);
    assert!(OracleProvider::from_str("openai").is_err());
    assert_eq!(OracleProvider::Anthropic.to_string(), "anthropic");
}

#[test]
fn test_convergence_to_options_shouldCarryValues() {
    let mut config = valid_config();
    config.convergence.tolerance_secs = Some(2.5);
    config.convergence.max_iterations = Some(7);

    let options = config.convergence.to_options();

    assert_eq!(options.tolerance_secs, Some(2.5));
    assert_eq!(options.max_iterations, Some(7));
}
