//! PDF text extraction and paragraph chunking.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Extract plain text from a PDF file.
///
/// Extraction failure degrades to an empty string so the analysis pipeline
/// still runs on whatever text is available.
pub fn extract_text(path: &Path) -> String {
    let text = match pdf_extract::extract_text(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("PDF extraction failed for {}: {}", path.display(), e);
            return String::new();
        }
    };
    BLANK_RUNS.replace_all(&text, "\n\n").trim().to_string()
}

/// Pack blank-line-separated paragraphs into chunks of at most `max_chars`.
///
/// A single paragraph larger than the budget becomes its own chunk rather
/// than being split mid-paragraph.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for paragraph in text.split("\n\n") {
        if current_len + paragraph.len() + 2 > max_chars {
            if !current.is_empty() {
                chunks.push(current.join("\n\n"));
            }
            current = vec![paragraph];
            current_len = paragraph.len();
        } else {
            current.push(paragraph);
            current_len += paragraph.len() + 2;
        }
    }
    if !current.is_empty() {
        chunks.push(current.join("\n\n"));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_extracts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.pdf");
        assert_eq!(extract_text(&path), "");
    }

    #[test]
    fn corrupt_pdf_extracts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();
        assert_eq!(extract_text(&path), "");
    }

    #[test]
    fn chunks_respect_budget() {
        let text = "aaaa\n\nbbbb\n\ncccc\n\ndddd";
        let chunks = chunk_text(text, 12);
        assert_eq!(chunks, vec!["aaaa\n\nbbbb", "cccc\n\ndddd"]);
    }

    #[test]
    fn oversized_paragraph_is_its_own_chunk() {
        let big = "x".repeat(50);
        let text = format!("small\n\n{}\n\nsmall", big);
        let chunks = chunk_text(&text, 20);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], big);
    }

    #[test]
    fn short_text_is_single_chunk() {
        let chunks = chunk_text("one paragraph", 2000);
        assert_eq!(chunks, vec!["one paragraph"]);
    }
}
