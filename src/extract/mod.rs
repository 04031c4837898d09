//! Document extraction: turns an uploaded file into transcript text.
//!
//! Supported inputs are plain text, markdown, PDF and Word documents.
//! Parsers run synchronously; callers on the async runtime should wrap
//! [`extract`] in `spawn_blocking`.

mod docx;
mod pdf;

use crate::transcript::Transcript;
use thiserror::Error;
use tracing::{error, info};

pub const MIME_PLAIN_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_LEGACY_WORD: &str = "application/msword";
pub const MIME_WORD: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Every MIME type accepted for upload.
pub const SUPPORTED_MIME_TYPES: [&str; 5] = [
    MIME_PLAIN_TEXT,
    MIME_MARKDOWN,
    MIME_PDF,
    MIME_WORD,
    MIME_LEGACY_WORD,
];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("Failed to process file: {0}")]
    Failed(String),
}

/// The document families we know how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Markdown,
    Pdf,
    LegacyWord,
    Word,
}

impl DocumentKind {
    /// Resolve a declared MIME type. Parameters such as `; charset=utf-8` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            MIME_PLAIN_TEXT => Some(Self::PlainText),
            MIME_MARKDOWN => Some(Self::Markdown),
            MIME_PDF => Some(Self::Pdf),
            MIME_LEGACY_WORD => Some(Self::LegacyWord),
            MIME_WORD => Some(Self::Word),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::Markdown => "markdown",
            Self::Pdf => "PDF",
            Self::LegacyWord | Self::Word => "Word document",
        }
    }
}

/// An accepted upload. Construction enforces the size limit and the MIME allow-list.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    bytes: Vec<u8>,
    declared_mime_type: String,
    original_name: String,
}

impl UploadedFile {
    pub fn new(
        bytes: Vec<u8>,
        declared_mime_type: impl Into<String>,
        original_name: impl Into<String>,
        max_size: usize,
    ) -> Result<Self, ExtractError> {
        let declared_mime_type = declared_mime_type.into();

        if bytes.len() > max_size {
            return Err(ExtractError::TooLarge {
                size: bytes.len(),
                limit: max_size,
            });
        }

        if DocumentKind::from_mime(&declared_mime_type).is_none() {
            return Err(ExtractError::UnsupportedFormat(declared_mime_type));
        }

        Ok(Self {
            bytes,
            declared_mime_type,
            original_name: original_name.into(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn declared_mime_type(&self) -> &str {
        &self.declared_mime_type
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Extract the full text of an uploaded file.
pub fn extract(file: &UploadedFile) -> Result<Transcript, ExtractError> {
    info!(
        "Processing file: {} ({})",
        file.original_name(),
        file.declared_mime_type()
    );

    extract_document(file.declared_mime_type(), file.bytes()).inspect_err(|e| {
        error!("Error processing file {}: {}", file.original_name(), e);
    })
}

/// Extract text from raw bytes of a declared MIME type.
///
/// The MIME type is checked again here so no parser ever sees an
/// unsupported input.
pub fn extract_document(declared_mime_type: &str, bytes: &[u8]) -> Result<Transcript, ExtractError> {
    let kind = DocumentKind::from_mime(declared_mime_type)
        .ok_or_else(|| ExtractError::UnsupportedFormat(declared_mime_type.to_string()))?;

    let text = match kind {
        DocumentKind::PlainText | DocumentKind::Markdown => {
            String::from_utf8_lossy(bytes).into_owned()
        }
        DocumentKind::Pdf => pdf::extract_text(bytes)?,
        DocumentKind::Word | DocumentKind::LegacyWord => docx::extract_text(bytes)?,
    };

    let transcript = Transcript::new(text);
    info!(
        "{} processed successfully, length: {} characters",
        kind.label(),
        transcript.char_count()
    );
    Ok(transcript)
}
