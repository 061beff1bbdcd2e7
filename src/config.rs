use std::path::PathBuf;

use crate::preprocessing::DEFAULT_MAX_DIMENSION;

/// Engine and pipeline configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Language code passed to the engine (e.g. "eng", "deu")
    pub default_language: String,
    /// Engine name, see [`crate::engines::available`]
    pub engine: String,
    pub max_dimension: u32,
    /// Run the preprocessing pipeline before recognition
    pub preprocess: bool,
    /// Directory holding the ocrs `.rten` models
    pub model_dir: PathBuf,
    /// Path to tessdata directory (tesseract engine only)
    pub tessdata_path: Option<String>,
    /// Text lines recognized between two progress reports
    pub lines_per_progress_step: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_language: "eng".to_string(),
            engine: crate::engines::available()
                .first()
                .map(|name| name.to_string())
                .unwrap_or_default(),
            max_dimension: DEFAULT_MAX_DIMENSION,
            preprocess: true,
            model_dir: default_model_dir(),
            tessdata_path: None,
            lines_per_progress_step: 4,
        }
    }
}

/// `<cache dir>/docscan-ocr`, falling back to the system temp dir
pub fn default_model_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("docscan-ocr")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_language, "eng");
        assert_eq!(config.max_dimension, 2000);
        assert!(config.preprocess);
        assert!(config.model_dir.ends_with("docscan-ocr"));
        assert!(config.lines_per_progress_step > 0);
    }
}
