use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use docscan_ocr::analysis::{brightness, edges};
use docscan_ocr::{
    engines, Config, EdgeDetector, OcrError, Pipeline, PlanarLuminanceView,
    RecognitionOrchestrator, RecognitionOutcome, RecognitionRequest, RecognitionTask,
};
use image::DynamicImage;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "docscan")]
#[command(about = "Inspect, preprocess and recognize photographed documents")]
#[command(version)]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score blur, brightness and resolution of an image
    Assess { image: PathBuf },
    /// Classify lighting the way the live preview does
    Lighting {
        image: PathBuf,
        /// Grid spacing between luminance samples
        #[arg(long, default_value_t = brightness::DEFAULT_SAMPLE_STEP)]
        sample_step: usize,
    },
    /// Detect document corners, optionally writing an outlined copy
    Edges {
        image: PathBuf,
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
    /// Rescale, grayscale and contrast-stretch an image
    Preprocess {
        image: PathBuf,
        output: PathBuf,
        #[arg(long, env = "DOCSCAN_MAX_DIMENSION", default_value_t = Pipeline::default().max_dimension())]
        max_dimension: u32,
    },
    /// Recognize the text in an image
    Recognize(RecognizeArgs),
    /// List the compiled-in recognition engines
    Engines,
}

#[derive(ClapArgs, Debug)]
pub struct RecognizeArgs {
    pub image: PathBuf,

    /// Language for recognition (e.g., "eng", "deu", "fra")
    #[arg(long, env = "DOCSCAN_LANGUAGE", default_value = "eng")]
    pub language: String,

    /// Recognition engine (see `docscan engines`)
    #[arg(long, env = "DOCSCAN_ENGINE")]
    pub engine: Option<String>,

    /// Skip preprocessing before recognition
    #[arg(long)]
    pub no_preprocess: bool,

    #[arg(long, env = "DOCSCAN_MAX_DIMENSION", default_value_t = Pipeline::default().max_dimension())]
    pub max_dimension: u32,

    /// Directory containing the ocrs models
    #[arg(long, env = "DOCSCAN_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Path to tessdata directory
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Cancel the run after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl From<&RecognizeArgs> for Config {
    fn from(args: &RecognizeArgs) -> Self {
        let defaults = Config::default();
        Self {
            default_language: args.language.clone(),
            engine: args.engine.clone().unwrap_or(defaults.engine),
            max_dimension: args.max_dimension,
            preprocess: !args.no_preprocess,
            model_dir: args.model_dir.clone().unwrap_or(defaults.model_dir),
            tessdata_path: args.tessdata_path.clone(),
            lines_per_progress_step: defaults.lines_per_progress_step,
        }
    }
}

#[derive(Serialize)]
struct RecognitionReport<'a> {
    status: &'static str,
    engine: &'static str,
    text: Option<&'a str>,
    confidence: Option<f32>,
    word_count: Option<usize>,
    character_count: Option<usize>,
    language: Option<&'a str>,
    processing_time_ms: u64,
    error: Option<String>,
    code: Option<&'static str>,
}

#[derive(Serialize)]
struct LightingReport {
    condition: brightness::LightingCondition,
    needs_warning: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr, stdout carries the JSON result
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("docscan v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Assess { image } => {
            let img = open_image(&image)?;
            print_json(&Pipeline::default().assess(&img))
        }
        Command::Lighting { image, sample_step } => {
            let gray = open_image(&image)?.to_luma8();
            let condition =
                brightness::detect(&PlanarLuminanceView::from_gray(&gray), sample_step);
            print_json(&LightingReport {
                condition,
                needs_warning: condition.needs_warning(),
            })
        }
        Command::Edges { image, overlay } => {
            let img = open_image(&image)?;
            let corners = EdgeDetector::default().detect_image(&img);
            if let (Some(path), Some(found)) = (overlay, corners.as_ref()) {
                edges::draw_overlay(&img, found)
                    .save(&path)
                    .with_context(|| format!("Failed to write overlay {:?}", path))?;
            }
            print_json(&corners)
        }
        Command::Preprocess {
            image,
            output,
            max_dimension,
        } => {
            let img = open_image(&image)?;
            let result = Pipeline::new(max_dimension).run(&img)?;
            result
                .image
                .save(&output)
                .with_context(|| format!("Failed to write {:?}", output))?;
            print_json(&result)
        }
        Command::Recognize(args) => recognize(&args).await,
        Command::Engines => print_json(&engines::available()),
    }
}

async fn recognize(args: &RecognizeArgs) -> anyhow::Result<()> {
    let config = Config::from(args);
    let img = open_image(&args.image)?;

    let quality = Pipeline::new(config.max_dimension).assess(&img);
    if !quality.acceptable {
        tracing::warn!("Image quality is poor: {}", quality.warnings.join(", "));
    }

    let engine = engines::build(&config)?;
    let orchestrator = RecognitionOrchestrator::new(engine, Pipeline::new(config.max_dimension));
    let engine_name = orchestrator.engine_name();
    let task = RecognitionTask::spawn(orchestrator, img, RecognitionRequest::from(&config));

    let mut progress = task.progress();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let snapshot = progress.borrow_and_update().clone();
            tracing::info!("[{:>3}%] {}", snapshot.percent, snapshot.message);
        }
    });

    let token = task.cancellation_token();
    let join = task.join();
    tokio::pin!(join);
    let (_, outcome) = match args.timeout_secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), &mut join).await {
            Ok(done) => done?,
            Err(_) => {
                tracing::warn!("Recognition timed out after {}s, cancelling", secs);
                token.cancel();
                join.await?
            }
        },
        None => join.await?,
    };
    let _ = reporter.await;

    let report = match &outcome {
        RecognitionOutcome::Completed(result) => RecognitionReport {
            status: "completed",
            engine: engine_name,
            text: Some(result.text()),
            confidence: Some(result.confidence()),
            word_count: Some(result.word_count()),
            character_count: Some(result.character_count()),
            language: Some(result.language()),
            processing_time_ms: result.processing_time_ms(),
            error: None,
            code: None,
        },
        RecognitionOutcome::Failed { error, elapsed_ms } => RecognitionReport {
            status: "failed",
            engine: engine_name,
            text: None,
            confidence: None,
            word_count: None,
            character_count: None,
            language: None,
            processing_time_ms: *elapsed_ms,
            error: Some(error.to_string()),
            code: Some(error.code()),
        },
        RecognitionOutcome::Cancelled { elapsed_ms } => RecognitionReport {
            status: "cancelled",
            engine: engine_name,
            text: None,
            confidence: None,
            word_count: None,
            character_count: None,
            language: None,
            processing_time_ms: *elapsed_ms,
            error: None,
            code: None,
        },
    };
    print_json(&report)
}

fn open_image(path: &Path) -> Result<DynamicImage, OcrError> {
    image::open(path)
        .map_err(|e| OcrError::ImageIo(format!("Failed to load image {:?}: {}", path, e)))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
