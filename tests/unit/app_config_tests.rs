/*!
 * Tests for application configuration
 */

use anyhow::Result;
use subtier::app_config::{Config, DevicePreference};

/// Test the default configuration values
#[test]
fn test_config_default_shouldCarryDocumentedDefaults() {
    let config = Config::default();

    assert_eq!(config.language, "auto");
    assert_eq!(config.device, DevicePreference::Auto);
    assert_eq!(config.optical.sample_offsets_secs, vec![60.0, 180.0, 300.0]);
    assert_eq!(config.optical.extraction_interval_secs, 5.0);
    assert_eq!(config.quality.min_count, 10);
    assert_eq!(config.quality.max_repetition_rate, 0.7);
    assert_eq!(config.quality.max_consecutive_same, 10);
    assert_eq!(config.quality.min_avg_length, 2.0);
    assert_eq!(config.quality.max_empty_fraction, 0.5);
    assert!(config.validate().is_ok());
}

/// Test serde round trip
#[test]
fn test_config_serde_shouldRoundTrip() -> Result<()> {
    let config = Config::default();
    let json = serde_json::to_string_pretty(&config)?;
    let parsed: Config = serde_json::from_str(&json)?;

    assert_eq!(parsed.language, config.language);
    assert_eq!(parsed.quality, config.quality);
    Ok(())
}

/// Test that omitted fields fall back to defaults
#[test]
fn test_config_deserialize_withPartialJson_shouldFillDefaults() -> Result<()> {
    let parsed: Config = serde_json::from_str(r#"{"language": "zh", "device": "cpu"}"#)?;

    assert_eq!(parsed.language, "zh");
    assert_eq!(parsed.device, DevicePreference::Cpu);
    assert_eq!(parsed.quality.min_count, 10);
    assert_eq!(parsed.engines.tesseract_bin, "tesseract");
    Ok(())
}

/// Test validation failures
#[test]
fn test_config_validate_withBadValues_shouldReject() {
    let mut config = Config::default();
    config.optical.extraction_interval_secs = 0.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.optical.concurrency = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.quality.max_repetition_rate = 1.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.language = "definitely-not-a-language".to_string();
    assert!(config.validate().is_err());
}

/// Test device preference parsing
#[test]
fn test_device_preference_fromStr_shouldParseAliases() {
    assert_eq!("auto".parse::<DevicePreference>().unwrap(), DevicePreference::Auto);
    assert_eq!("GPU".parse::<DevicePreference>().unwrap(), DevicePreference::Gpu);
    assert_eq!("cuda".parse::<DevicePreference>().unwrap(), DevicePreference::Gpu);
    assert_eq!("cpu".parse::<DevicePreference>().unwrap(), DevicePreference::Cpu);
    assert!("tpu".parse::<DevicePreference>().is_err());
}
