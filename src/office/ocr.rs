//! OCR adapter: shells out to a system `tesseract` binary. A missing binary
//! is an `Unsupported` failure, not a crash.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use crate::registry::failure::Failure;

#[derive(Debug, Clone)]
pub struct OcrOutput {
    pub text: String,
    /// Mean word confidence in percent, when the engine reported any.
    pub confidence: Option<f64>,
}

pub fn run(image: &Path, language: &str) -> Result<OcrOutput, Failure> {
    let output = Command::new("tesseract")
        .arg(image)
        .arg("stdout")
        .args(["-l", language, "tsv"])
        .output()
        .map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                Failure::unsupported(
                    "OCR requires a tesseract binary on PATH, which is not bundled with this system",
                )
            } else {
                Failure::handler_error(format!("failed to launch tesseract: {err}"))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Failure::handler_error(format!(
            "tesseract failed on {}: {}",
            image.display(),
            stderr.trim()
        )));
    }

    Ok(parse_tsv(&String::from_utf8_lossy(&output.stdout)))
}

/// Rebuilds line-oriented text from tesseract's TSV output and averages the
/// per-word confidences.
fn parse_tsv(tsv: &str) -> OcrOutput {
    let mut lines: Vec<String> = Vec::new();
    let mut current_key: Option<(String, String, String)> = None;
    let mut current_words: Vec<String> = Vec::new();
    let mut confidence_sum = 0.0;
    let mut confidence_count = 0usize;

    for row in tsv.lines().skip(1) {
        let columns: Vec<&str> = row.split('\t').collect();
        if columns.len() < 12 || columns[0] != "5" {
            continue;
        }
        let word = columns[11].trim();
        if word.is_empty() {
            continue;
        }
        if let Ok(conf) = columns[10].parse::<f64>()
            && conf >= 0.0
        {
            confidence_sum += conf;
            confidence_count += 1;
        }

        let key = (
            columns[2].to_string(),
            columns[3].to_string(),
            columns[4].to_string(),
        );
        if current_key.as_ref() != Some(&key) {
            if !current_words.is_empty() {
                lines.push(current_words.join(" "));
                current_words.clear();
            }
            current_key = Some(key);
        }
        current_words.push(word.to_string());
    }
    if !current_words.is_empty() {
        lines.push(current_words.join(" "));
    }

    OcrOutput {
        text: lines.join("\n"),
        confidence: (confidence_count > 0).then(|| confidence_sum / confidence_count as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsv_parsing_rebuilds_lines_and_confidence() {
        let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
                   1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t\n\
                   5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t90\thello\n\
                   5\t1\t1\t1\t1\t2\t12\t0\t10\t10\t80\tworld\n\
                   5\t1\t1\t1\t2\t1\t0\t14\t10\t10\t70\tbye\n";
        let parsed = parse_tsv(tsv);
        assert_eq!(parsed.text, "hello world\nbye");
        assert_eq!(parsed.confidence, Some(80.0));
    }

    #[test]
    fn empty_tsv_yields_empty_text() {
        let parsed = parse_tsv("header\n");
        assert_eq!(parsed.text, "");
        assert!(parsed.confidence.is_none());
    }
}
