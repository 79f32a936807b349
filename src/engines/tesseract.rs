//! Tesseract engine implementation
//!
//! Runs the `tesseract` command-line tool once per recognition pass. Each call
//! writes the page to its own temporary PNG, so concurrent page workers never
//! share files.

use std::path::Path;
use std::process::Command;

use image::{DynamicImage, ImageFormat};

use crate::engine::{OcrEngine, OcrError, OcrProfile, Rotation};

pub struct TesseractEngine {
    command: String,
    tessdata_path: Option<String>,
}

impl TesseractEngine {
    pub fn new(command: &str, tessdata_path: Option<String>) -> Self {
        Self {
            command: command.to_string(),
            tessdata_path,
        }
    }

    /// Whether the executable can be launched at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run(&self, image: &DynamicImage, extra_args: &[String]) -> Result<String, OcrError> {
        let input = tempfile::Builder::new().suffix(".png").tempfile()?;
        write_png(image, input.path())?;

        let mut cmd = Command::new(&self.command);
        cmd.arg(input.path()).arg("stdout");
        if let Some(dir) = &self.tessdata_path {
            cmd.args(["--tessdata-dir", dir]);
        }
        cmd.args(extra_args);

        tracing::debug!(
            "Running {} on {}x{} image with {:?}",
            self.command,
            image.width(),
            image.height(),
            extra_args
        );

        match cmd.output() {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::Failed(format!(
                    "{} exited with {}: {}",
                    self.command,
                    output.status,
                    stderr.trim()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::Unavailable(
                format!("{} not found (install tesseract-ocr)", self.command),
            )),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage, profile: &OcrProfile) -> Result<String, OcrError> {
        let args = vec![
            "-l".to_string(),
            profile.languages.clone(),
            "--oem".to_string(),
            profile.engine_mode.code().to_string(),
            "--psm".to_string(),
            profile.page_seg_mode.code().to_string(),
        ];
        self.run(image, &args)
    }

    fn detect_orientation(&self, image: &DynamicImage) -> Result<Rotation, OcrError> {
        let report = self.run(image, &["--psm".to_string(), "0".to_string()])?;
        parse_osd_rotation(&report)
    }
}

fn write_png(image: &DynamicImage, path: &Path) -> Result<(), OcrError> {
    // Tesseract reads 8-bit gray and RGB reliably; normalize everything else.
    let encodable = match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image.clone(),
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    };
    encodable
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| OcrError::Failed(format!("Failed to encode page for tesseract: {}", e)))
}

/// Read the `Rotate:` field of a `--psm 0` report.
///
/// ```text
/// Page number: 0
/// Orientation in degrees: 270
/// Rotate: 90
/// Orientation confidence: 4.21
/// ```
fn parse_osd_rotation(report: &str) -> Result<Rotation, OcrError> {
    let value = report
        .lines()
        .find_map(|line| line.trim().strip_prefix("Rotate:"))
        .ok_or_else(|| OcrError::NoOrientation("no Rotate field in OSD output".to_string()))?;

    let degrees: i32 = value
        .trim()
        .parse()
        .map_err(|_| OcrError::NoOrientation(format!("unparseable rotation '{}'", value.trim())))?;

    Rotation::from_degrees(degrees)
        .ok_or_else(|| OcrError::NoOrientation(format!("non-quadrant rotation {}", degrees)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_osd_rotation() {
        let report = "Page number: 0\nOrientation in degrees: 270\nRotate: 90\n\
                      Orientation confidence: 4.21\nScript: Arabic\nScript confidence: 1.50\n";
        assert_eq!(parse_osd_rotation(report).unwrap(), Rotation::Clockwise90);
    }

    #[test]
    fn test_parse_osd_upright_page() {
        let report = "Page number: 0\nOrientation in degrees: 0\nRotate: 0\n";
        assert_eq!(parse_osd_rotation(report).unwrap(), Rotation::None);
    }

    #[test]
    fn test_parse_osd_missing_field() {
        let err = parse_osd_rotation("Too few characters. Skipping this page\n").unwrap_err();
        assert!(matches!(err, OcrError::NoOrientation(_)));
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let engine = TesseractEngine::new("definitely-not-a-real-tesseract-binary", None);
        assert!(!engine.is_available());

        let img = DynamicImage::ImageLuma8(image::GrayImage::new(8, 8));
        let err = engine.detect_orientation(&img).unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(_)));
    }
}
