/*!
 * Tesseract-based image-to-text recognition.
 *
 * Drives the external `tesseract` CLI; the binary is probed at startup and a
 * missing installation degrades the optical tier to unavailable.
 */

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::errors::EngineError;
use crate::engines::TextRecognizer;
use crate::language_utils;

/// Time budget for recognizing a single frame
const RECOGNIZE_TIMEOUT_SECS: u64 = 60;

/// Image-to-text recognizer backed by the tesseract CLI
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    bin: String,
    traineddata: String,
}

impl TesseractRecognizer {
    /// Create a recognizer for the given binary and language hint
    ///
    /// The hint is a normalized ISO 639-1 code or `None` for auto-detection.
    pub fn new(bin: impl Into<String>, language_hint: Option<&str>) -> Self {
        Self {
            bin: bin.into(),
            traineddata: language_utils::tesseract_lang(language_hint),
        }
    }

    /// Traineddata identifier passed to the CLI
    pub fn traineddata(&self) -> &str {
        &self.traineddata
    }

    async fn run(&self, args: &[&str], timeout_secs: u64) -> Result<std::process::Output, EngineError> {
        let future = Command::new(&self.bin).args(args).output();

        let output = tokio::select! {
            result = future => {
                result.map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => {
                        EngineError::Unavailable(format!("{} binary not found", self.bin))
                    }
                    _ => EngineError::Failed(format!("failed to spawn {}: {}", self.bin, e)),
                })?
            },
            _ = tokio::time::sleep(Duration::from_secs(timeout_secs)) => {
                return Err(EngineError::Failed(format!(
                    "{} timed out after {}s", self.bin, timeout_secs
                )));
            }
        };

        Ok(output)
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn probe(&self) -> Result<(), EngineError> {
        let output = self.run(&["--version"], 10).await?;
        if !output.status.success() {
            return Err(EngineError::Unavailable(format!(
                "{} --version exited with {}",
                self.bin, output.status
            )));
        }
        Ok(())
    }

    async fn recognize(&self, image: &Path) -> Result<String, EngineError> {
        let output = self
            .run(
                &[
                    image.to_str().unwrap_or_default(),
                    "stdout",
                    "--psm", "6",
                    "-l", &self.traineddata,
                ],
                RECOGNIZE_TIMEOUT_SECS,
            )
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed(format!(
                "{} exited with {}: {}",
                self.bin,
                output.status,
                stderr.lines().next().unwrap_or("")
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let recognized = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        debug!("Recognized {} chars in {:?}", recognized.chars().count(), image);

        Ok(recognized)
    }
}
