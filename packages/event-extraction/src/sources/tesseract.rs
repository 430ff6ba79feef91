//! Optical text recognition through the Tesseract CLI.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::traits::source::ImageOcr;

/// Words at or below this confidence are dropped.
const MIN_CONFIDENCE: f32 = 50.0;

/// Runs `tesseract stdin stdout -l <langs> tsv` per image.
///
/// Defaults to Hebrew plus English, the languages event posters in the
/// ledger are printed in.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    languages: String,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractOcr {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            languages: "heb+eng".to_string(),
        }
    }

    /// Path to the `tesseract` executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Tesseract languages, e.g. `heb+eng`.
    pub fn with_languages(mut self, languages: impl Into<String>) -> Self {
        self.languages = languages.into();
        self
    }
}

#[async_trait]
impl ImageOcr for TesseractOcr {
    async fn extract_text(&self, image: &[u8]) -> SourceResult<String> {
        if image.is_empty() {
            return Err(SourceError::InvalidInput("empty image payload".into()));
        }

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", self.languages.as_str(), "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SourceError::Ocr(format!("failed to start {}: {}", self.binary.display(), e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(image)
                .await
                .map_err(|e| SourceError::Ocr(format!("failed to write image: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SourceError::Ocr(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!(bytes = image.len(), chars = text.len(), "OCR complete");
        Ok(text)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// Rebuild lines from Tesseract TSV output, keeping confident words only.
pub fn parse_tsv(tsv: &str) -> String {
    let mut lines: Vec<((u32, u32, u32, u32), Vec<&str>)> = Vec::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }

        let word = cols[11].trim();
        let confidence: f32 = cols[10].trim().parse().unwrap_or(-1.0);
        if word.is_empty() || confidence <= MIN_CONFIDENCE {
            continue;
        }

        let key = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        match lines.last_mut() {
            Some((last, words)) if *last == key => words.push(word),
            _ => lines.push((key, vec![word])),
        }
    }

    lines
        .into_iter()
        .map(|(_, words)| words.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn test_parse_tsv_groups_lines_and_filters_confidence() {
        let tsv = [
            HEADER,
            "1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t",
            "5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t96.5\tAI",
            "5\t1\t1\t1\t1\t2\t70\t10\t90\t20\t91.0\tSummit",
            "5\t1\t1\t1\t1\t3\t170\t10\t20\t20\t12.0\t~",
            "5\t1\t1\t1\t2\t1\t10\t40\t80\t20\t88.1\t05.06.25",
            "5\t1\t2\t1\t1\t1\t10\t90\t80\t20\t50\tborderline",
        ]
        .join("\n");

        assert_eq!(parse_tsv(&tsv), "AI Summit\n05.06.25");
    }

    #[test]
    fn test_parse_tsv_empty() {
        assert_eq!(parse_tsv(""), "");
        assert_eq!(parse_tsv(HEADER), "");
    }

    #[tokio::test]
    async fn test_missing_binary_is_ocr_error() {
        let ocr = TesseractOcr::new().with_binary("/nonexistent/tesseract");

        let result = ocr.extract_text(b"\x89PNG").await;

        assert!(matches!(result, Err(SourceError::Ocr(_))));
    }
}
