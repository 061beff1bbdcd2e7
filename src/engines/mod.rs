//! Recognition engine implementations
//!
//! This module contains implementations of the RecognitionEngine trait for
//! different OCR backends. Engines are conditionally compiled based on
//! feature flags.

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

#[cfg(feature = "engine-tesseract")]
pub mod tesseract;

use crate::config::Config;
use crate::engine::RecognitionEngine;
use crate::error::OcrError;

/// Names of the engines compiled into this build, default first
pub fn available() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut names = Vec::new();

    #[cfg(feature = "engine-ocrs")]
    names.push("ocrs");

    #[cfg(feature = "engine-tesseract")]
    names.push("tesseract");

    names
}

/// Build the engine named in `config.engine`
///
/// The engine is only constructed here; language data is loaded by
/// [`RecognitionEngine::initialize`].
pub fn build(config: &Config) -> Result<Box<dyn RecognitionEngine>, OcrError> {
    tracing::info!("Creating {} recognition engine", config.engine);

    match config.engine.as_str() {
        #[cfg(feature = "engine-ocrs")]
        "ocrs" => Ok(Box::new(ocrs::OcrsEngine::new(config))),

        #[cfg(feature = "engine-tesseract")]
        "tesseract" => Ok(Box::new(tesseract::TesseractEngine::new(config))),

        other => Err(OcrError::InitializationError(format!(
            "Unknown engine '{}'. Available: [{}]",
            other,
            available().join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_engine_is_rejected() {
        let config = Config {
            engine: "does-not-exist".to_string(),
            ..Config::default()
        };
        let err = build(&config).err().expect("unknown engine must fail");
        assert!(matches!(err, OcrError::InitializationError(_)));
    }

    #[test]
    fn test_default_engine_is_available() {
        let config = Config::default();
        if let Some(first) = available().first() {
            assert_eq!(config.engine, *first);
            assert!(build(&config).is_ok());
        }
    }
}
