//! Tesseract engine implementation
//!
//! Better for noisy phone photos and the only engine with real language
//! selection. Uses tesseract-static for static linking (no system
//! dependencies). Training data is read from the configured tessdata
//! directory.

use crate::config::Config;
use crate::engine::{EngineOptions, EngineOutput, ProgressFn, RecognitionEngine};
use crate::error::OcrError;
use image::DynamicImage;
use std::path::PathBuf;
use tesseract_static::tesseract::Tesseract;

/// Tesseract OCR Engine
pub struct TesseractEngine {
    tessdata_path: PathBuf,
    /// Language validated by the last successful initialize
    language: Option<String>,
}

impl TesseractEngine {
    pub fn new(config: &Config) -> Self {
        let tessdata_path = config
            .tessdata_path
            .clone()
            .map(PathBuf::from)
            .unwrap_or_else(|| config.model_dir.join("tessdata"));

        Self {
            tessdata_path,
            language: None,
        }
    }

    fn tessdata_str(&self) -> Result<&str, OcrError> {
        self.tessdata_path.to_str().ok_or_else(|| {
            OcrError::InitializationError(format!(
                "tessdata path is not valid UTF-8: {:?}",
                self.tessdata_path
            ))
        })
    }
}

impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_language_available(&self, code: &str) -> bool {
        !code.is_empty()
            && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && self
                .tessdata_path
                .join(format!("{}.traineddata", code))
                .is_file()
    }

    fn initialize(&mut self, language: &str, _options: &EngineOptions) -> Result<(), OcrError> {
        if !self.is_language_available(language) {
            return Err(OcrError::LanguageUnavailable(format!(
                "no {}.traineddata in {:?}",
                language, self.tessdata_path
            )));
        }
        if self.language.as_deref() == Some(language) {
            return Ok(());
        }

        // Validate that tessdata is usable by doing a test initialization
        let probe = Tesseract::new(Some(self.tessdata_str()?), Some(language)).map_err(|e| {
            OcrError::InitializationError(format!("Failed to initialize Tesseract: {}", e))
        })?;
        drop(probe);

        tracing::info!(
            "Tesseract engine initialized (tessdata: {:?}, language: {})",
            self.tessdata_path,
            language
        );
        self.language = Some(language.to_string());
        Ok(())
    }

    fn recognize(
        &mut self,
        image: &DynamicImage,
        progress: &mut ProgressFn<'_>,
    ) -> Result<EngineOutput, OcrError> {
        let language = self
            .language
            .clone()
            .ok_or_else(|| OcrError::EngineError("Tesseract is not initialized".to_string()))?;

        // BMP is always supported by leptonica
        let rgb_img = image.to_rgb8();
        let mut bmp_data = Vec::new();
        rgb_img
            .write_to(&mut std::io::Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
            .map_err(|e| OcrError::EngineError(format!("Failed to encode BMP: {}", e)))?;

        let tess = Tesseract::new(Some(self.tessdata_str()?), Some(&language))
            .map_err(|e| OcrError::EngineError(format!("Failed to create Tesseract: {}", e)))?;
        let tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            OcrError::EngineError(format!(
                "Failed to set image ({}x{}): {}",
                rgb_img.width(),
                rgb_img.height(),
                e
            ))
        })?;

        // Tesseract offers no partial progress; last chance to stop first
        if progress(0).is_break() {
            return Err(OcrError::Cancelled);
        }

        let mut tess = tess
            .recognize()
            .map_err(|e| OcrError::EngineError(format!("Failed to recognize text: {}", e)))?;
        let text = tess
            .get_text()
            .map_err(|e| OcrError::EngineError(format!("Failed to get text: {}", e)))?;

        // 0-100 scale
        let confidence = (tess.mean_text_conf() as f32 / 100.0).clamp(0.0, 1.0);

        Ok(EngineOutput {
            text: text.trim().to_string(),
            confidence,
        })
    }

    fn cancel(&mut self) {
        // Each recognize owns its Tesseract handle; nothing survives the call
        self.language = None;
    }
}
