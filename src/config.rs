use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use crate::engine::{EngineMode, OcrProfile, PageSegMode};
use crate::error::FlyerError;

#[derive(Parser, Debug)]
#[command(name = "flyer-ocr-server")]
#[command(about = "Extract products and prices from scanned retail flyers")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "OCR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_PORT", default_value = "9292")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 50MB)
    #[arg(long, env = "OCR_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Tesseract language set used for every recognition pass
    #[arg(long, env = "FLYER_OCR_LANGUAGES", default_value = "ara+eng")]
    pub languages: String,

    /// Tesseract executable
    #[arg(long, env = "TESSERACT_CMD", default_value = "tesseract")]
    pub tesseract_cmd: String,

    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Lowest accepted price
    #[arg(long, env = "FLYER_MIN_PRICE", default_value = "5")]
    pub min_price: Decimal,

    /// Highest accepted price
    #[arg(long, env = "FLYER_MAX_PRICE", default_value = "5000")]
    pub max_price: Decimal,

    /// Pages smaller than this on either axis are upscaled
    #[arg(long, env = "FLYER_MIN_DIMENSION", default_value = "1000")]
    pub min_dimension: u32,

    /// Skip Otsu binarization (keeps grayscale contrast for colored flyers)
    #[arg(long)]
    pub no_binarize: bool,

    /// Page worker threads per document (defaults to available parallelism)
    #[arg(long, env = "FLYER_WORKERS")]
    pub workers: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Extract products from local flyer files, one document per invocation
    Extract {
        /// Page images or PDFs, in page order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub tesseract_cmd: String,
    pub tessdata_path: Option<String>,
    pub workers: usize,
    pub normalize: NormalizeConfig,
    pub acquisition: AcquisitionConfig,
    pub extraction: ExtractionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9292,
            max_file_size: 52_428_800,
            tesseract_cmd: "tesseract".to_string(),
            tessdata_path: None,
            workers: default_workers(),
            normalize: NormalizeConfig::default(),
            acquisition: AcquisitionConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
            tesseract_cmd: args.tesseract_cmd,
            tessdata_path: args.tessdata_path,
            workers: args.workers.filter(|w| *w > 0).unwrap_or_else(default_workers),
            normalize: NormalizeConfig {
                min_width: args.min_dimension,
                min_height: args.min_dimension,
                binarize: !args.no_binarize,
                ..NormalizeConfig::default()
            },
            acquisition: AcquisitionConfig::with_languages(&args.languages),
            extraction: ExtractionConfig {
                min_price: args.min_price,
                max_price: args.max_price,
                ..ExtractionConfig::default()
            },
        }
    }
}

impl Config {
    /// Reject settings the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), FlyerError> {
        if self.extraction.min_price > self.extraction.max_price {
            return Err(FlyerError::Config(format!(
                "min price {} is above max price {}",
                self.extraction.min_price, self.extraction.max_price
            )));
        }
        if self.acquisition.profiles.is_empty() {
            return Err(FlyerError::Config(
                "at least one OCR profile is required".to_string(),
            ));
        }
        if self.normalize.denoise.template_window % 2 == 0
            || self.normalize.denoise.search_window % 2 == 0
        {
            return Err(FlyerError::Config("denoise windows must be odd".to_string()));
        }
        Ok(())
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Geometric/photometric normalization settings
#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    pub min_width: u32,
    pub min_height: u32,
    /// Run orientation/script detection and fix quadrant rotations
    pub detect_orientation: bool,
    pub deskew: DeskewConfig,
    pub denoise: DenoiseConfig,
    /// Global Otsu binarization as the last stage
    pub binarize: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            min_width: 1000,
            min_height: 1000,
            detect_orientation: true,
            deskew: DeskewConfig::default(),
            denoise: DenoiseConfig::default(),
            binarize: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeskewConfig {
    /// Corrections at or below this magnitude (degrees) are skipped
    pub deadband_degrees: f32,
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Components must be wider and taller than this many pixels
    pub min_component_size: u32,
    /// Fewer text-like components than this means no reliable signal
    pub min_components: usize,
}

impl Default for DeskewConfig {
    fn default() -> Self {
        Self {
            deadband_degrees: 0.5,
            min_aspect: 0.1,
            max_aspect: 20.0,
            min_component_size: 5,
            min_components: 3,
        }
    }
}

/// Non-local means parameters, tuned for scanned documents.
#[derive(Debug, Clone)]
pub struct DenoiseConfig {
    /// Filter strength; larger removes more noise and more detail
    pub h: f32,
    pub template_window: u32,
    pub search_window: u32,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            h: 10.0,
            template_window: 7,
            search_window: 21,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    /// Profiles tried per page; the longest text wins
    pub profiles: Vec<OcrProfile>,
}

impl AcquisitionConfig {
    pub fn with_languages(languages: &str) -> Self {
        Self {
            profiles: vec![
                OcrProfile::new(EngineMode::Lstm, PageSegMode::UniformBlock, languages),
                OcrProfile::new(EngineMode::Lstm, PageSegMode::SparseText, languages),
                OcrProfile::new(EngineMode::Lstm, PageSegMode::Auto, languages),
            ],
        }
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self::with_languages("ara+eng")
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub min_price: Decimal,
    pub max_price: Decimal,
    /// Lines searched above a price anchor
    pub window_before: usize,
    /// Lines searched below a price anchor
    pub window_after: usize,
    /// Longer lines are treated as run-on OCR garbage
    pub max_name_len: usize,
    /// Name candidates must contain Arabic script
    pub require_arabic_name: bool,
    /// Pages with fewer words than this are skipped as non-textual
    pub min_page_words: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_price: Decimal::from(5),
            max_price: Decimal::from(5000),
            window_before: 3,
            window_after: 2,
            max_name_len: 100,
            require_arabic_name: true,
            min_page_words: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_map_to_config() {
        let args = Args::parse_from([
            "flyer-ocr-server",
            "--min-price",
            "2.5",
            "--max-price",
            "900",
            "--no-binarize",
            "--workers",
            "2",
            "--languages",
            "ara",
        ]);
        let config = Config::from(args);

        assert_eq!(config.extraction.min_price, Decimal::new(25, 1));
        assert_eq!(config.extraction.max_price, Decimal::from(900));
        assert!(!config.normalize.binarize);
        assert_eq!(config.workers, 2);
        assert!(config.acquisition.profiles.iter().all(|p| p.languages == "ara"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_extract_subcommand_parses_files() {
        let args = Args::parse_from(["flyer-ocr-server", "extract", "a.png", "b.pdf", "--format", "csv"]);
        match args.command {
            Some(Command::Extract { files, format, .. }) => {
                assert_eq!(files.len(), 2);
                assert_eq!(format, OutputFormat::Csv);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_inverted_band() {
        let mut config = Config::default();
        config.extraction.min_price = Decimal::from(100);
        config.extraction.max_price = Decimal::from(10);
        assert!(matches!(config.validate(), Err(FlyerError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_even_denoise_window() {
        let mut config = Config::default();
        config.normalize.denoise.search_window = 20;
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration: denoise windows must be odd");
    }

    #[test]
    fn test_default_profiles_cover_three_segmentations() {
        let config = AcquisitionConfig::default();
        let modes: Vec<_> = config.profiles.iter().map(|p| p.page_seg_mode).collect();
        assert_eq!(
            modes,
            vec![PageSegMode::UniformBlock, PageSegMode::SparseText, PageSegMode::Auto]
        );
    }
}
