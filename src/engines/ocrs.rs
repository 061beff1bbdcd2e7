//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies
//! required. Models are read from the configured model directory; fetching
//! them is left to the host application.

use crate::config::Config;
use crate::engine::{EngineOptions, EngineOutput, ProgressFn, RecognitionEngine};
use crate::error::OcrError;
use image::DynamicImage;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};

const DETECTION_MODEL: &str = "text-detection.rten";
const RECOGNITION_MODEL: &str = "text-recognition.rten";

/// ocrs only ships a Latin-alphabet recognition model
const SUPPORTED_LANGUAGE: &str = "eng";

/// Share of the engine-local progress spent before line recognition
const DETECTION_PROGRESS: u8 = 30;

/// Recognition engine wrapping the ocrs library
pub struct OcrsEngine {
    model_dir: PathBuf,
    lines_per_step: usize,
    engine: Option<OcrsOcrEngine>,
}

impl OcrsEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            model_dir: config.model_dir.clone(),
            lines_per_step: config.lines_per_progress_step.max(1),
            engine: None,
        }
    }

    fn model_path(&self, filename: &str) -> PathBuf {
        self.model_dir.join(filename)
    }
}

impl RecognitionEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn is_language_available(&self, code: &str) -> bool {
        code == SUPPORTED_LANGUAGE
            && self.model_path(DETECTION_MODEL).is_file()
            && self.model_path(RECOGNITION_MODEL).is_file()
    }

    fn initialize(&mut self, language: &str, options: &EngineOptions) -> Result<(), OcrError> {
        if !self.is_language_available(language) {
            return Err(OcrError::LanguageUnavailable(format!(
                "ocrs supports '{}' with models in {:?}, requested '{}'",
                SUPPORTED_LANGUAGE, self.model_dir, language
            )));
        }
        self.lines_per_step = options.lines_per_progress_step.max(1);

        if self.engine.is_some() {
            return Ok(());
        }

        let detection_model = load_model(&self.model_path(DETECTION_MODEL))?;
        let recognition_model = load_model(&self.model_path(RECOGNITION_MODEL))?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| {
            OcrError::InitializationError(format!("Failed to create OCR engine: {}", e))
        })?;

        tracing::info!("ocrs engine initialized from {:?}", self.model_dir);
        self.engine = Some(engine);
        Ok(())
    }

    fn recognize(
        &mut self,
        image: &DynamicImage,
        progress: &mut ProgressFn<'_>,
    ) -> Result<EngineOutput, OcrError> {
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| OcrError::EngineError("ocrs engine is not initialized".to_string()))?;

        // HWC RGB8 is what ImageSource::from_bytes expects
        let rgb_img = image.to_rgb8();
        let dimensions = rgb_img.dimensions();
        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions).map_err(|e| {
            OcrError::EngineError(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::EngineError(format!("Failed to prepare input: {}", e)))?;

        let word_rects = engine
            .detect_words(&ocr_input)
            .map_err(|e| OcrError::EngineError(format!("Failed to detect words: {}", e)))?;
        let line_rects = engine.find_text_lines(&ocr_input, &word_rects);

        if progress(DETECTION_PROGRESS).is_break() {
            return Err(OcrError::Cancelled);
        }

        let total = line_rects.len().max(1);
        let mut lines = Vec::with_capacity(line_rects.len());
        for (i, batch) in line_rects.chunks(self.lines_per_step).enumerate() {
            let recognized = engine
                .recognize_text(&ocr_input, batch)
                .map_err(|e| OcrError::EngineError(format!("Failed to recognize text: {}", e)))?;
            lines.extend(recognized.into_iter().flatten().map(|line| {
                line.words()
                    .map(|word| word.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            }));

            let done = ((i + 1) * self.lines_per_step).min(total);
            let pct = DETECTION_PROGRESS as usize
                + done * (100 - DETECTION_PROGRESS as usize) / total;
            if progress(pct as u8).is_break() {
                return Err(OcrError::Cancelled);
            }
        }

        let text = lines.join("\n");
        let confidence = text_confidence(&text);
        tracing::debug!(
            "ocrs recognized {} lines, confidence {:.2}",
            lines.len(),
            confidence
        );

        Ok(EngineOutput { text, confidence })
    }

    fn cancel(&mut self) {
        // Models are reloaded on the next initialize
        self.engine = None;
    }
}

fn load_model(path: &Path) -> Result<Model, OcrError> {
    Model::load_file(path).map_err(|e| {
        OcrError::InitializationError(format!("Failed to load model {:?}: {}", path, e))
    })
}

/// Text-quality confidence, since ocrs reports no per-character scores
///
/// Garbled recognition shows up as symbol soup, runs of a repeated glyph,
/// or a spray of one-letter "words".
fn text_confidence(text: &str) -> f32 {
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.is_empty() {
        return 0.0;
    }
    if chars.len() < 5 {
        return 0.5;
    }

    let n = chars.len() as f32;
    let alnum = chars.iter().filter(|c| c.is_alphanumeric()).count() as f32 / n;
    let symbols = chars
        .iter()
        .filter(|c| !c.is_alphanumeric() && !c.is_ascii_punctuation())
        .count() as f32
        / n;
    let glyph_score = (alnum * 1.2).min(1.0) * (1.0 - (symbols * 5.0).min(1.0));

    let words: Vec<&str> = text.split_whitespace().collect();
    let single = words.iter().filter(|w| w.chars().count() == 1).count() as f32;
    let word_score = 1.0 - (single / words.len() as f32).min(0.6);

    let longest_run = chars
        .windows(2)
        .fold((1usize, 1usize), |(best, run), pair| {
            let run = if pair[0] == pair[1] { run + 1 } else { 1 };
            (best.max(run), run)
        })
        .0;
    let run_score = match longest_run {
        1..=3 => 1.0,
        4..=6 => 0.7,
        _ => 0.3,
    };

    (0.5 * glyph_score + 0.3 * word_score + 0.2 * run_score).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_returns_zero() {
        assert_eq!(text_confidence(""), 0.0);
        assert_eq!(text_confidence("  \n "), 0.0);
    }

    #[test]
    fn test_short_text_returns_half() {
        assert_eq!(text_confidence("Hi"), 0.5);
    }

    #[test]
    fn test_clean_text_high_confidence() {
        let confidence = text_confidence("The quick brown fox jumps over the lazy dog.");
        assert!(confidence > 0.8, "Expected > 0.8, got {}", confidence);
    }

    #[test]
    fn test_garbled_text_low_confidence() {
        let confidence = text_confidence("§±®©¥€£¢¤ ƒ");
        assert!(confidence < 0.5, "Expected < 0.5, got {}", confidence);
    }

    #[test]
    fn test_single_letter_spray_lowers_confidence() {
        let clean = text_confidence("Hello World Test String");
        let spray = text_confidence("a b c d e f g h i j k l m n o p");
        assert!(spray < clean, "{} >= {}", spray, clean);
    }

    #[test]
    fn test_missing_models_make_language_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            model_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let mut engine = OcrsEngine::new(&config);
        assert!(!engine.is_language_available("eng"));
        let err = engine
            .initialize("eng", &EngineOptions::default())
            .unwrap_err();
        assert!(matches!(err, OcrError::LanguageUnavailable(_)));
    }
}
