//! PDF text extraction.

mod pdf;

pub use pdf::{chunk_text, extract_text};
