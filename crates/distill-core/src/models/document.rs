use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Unique identifier for an ingested document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of input a document was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Text,
    ImageScan,
    Pdf,
    Docx,
}

impl SourceKind {
    /// Detect the source kind from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str())?.to_lowercase();
        match ext.as_str() {
            "txt" | "md" | "text" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "png" | "jpg" | "jpeg" | "heic" | "webp" | "tif" | "tiff" => Some(Self::ImageScan),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::ImageScan => "image_scan",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the document's content lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentSource {
    /// Typed or pasted text held in memory
    Inline(String),
    /// A file on disk
    File(PathBuf),
}

/// An ingested document. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    id: DocumentId,
    kind: SourceKind,
    byte_size: u64,
    page_count: Option<usize>,
    password_protected: bool,
    source: DocumentSource,
}

impl Document {
    /// Create a document from typed text
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: DocumentId::new(),
            kind: SourceKind::Text,
            byte_size: text.len() as u64,
            page_count: None,
            password_protected: false,
            source: DocumentSource::Inline(text),
        }
    }

    /// Create a document by probing a file on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let kind = SourceKind::from_path(path).ok_or_else(|| {
            AppError::invalid_input(format!("Unsupported file type: {}", path.display()))
        })?;

        let metadata = std::fs::metadata(path)?;
        let (page_count, password_protected) = if kind == SourceKind::Pdf {
            let bytes = std::fs::read(path)?;
            (Some(probe_pdf_page_count(&bytes)), probe_pdf_encrypted(&bytes))
        } else {
            (None, false)
        };

        Ok(Self {
            id: DocumentId::new(),
            kind,
            byte_size: metadata.len(),
            page_count,
            password_protected,
            source: DocumentSource::File(path.to_path_buf()),
        })
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// Page count (PDF only)
    pub fn page_count(&self) -> Option<usize> {
        self.page_count
    }

    pub fn is_password_protected(&self) -> bool {
        self.password_protected
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    /// Display name for logs and output
    pub fn name(&self) -> String {
        match &self.source {
            DocumentSource::Inline(_) => "inline text".to_string(),
            DocumentSource::File(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unnamed")
                .to_string(),
        }
    }
}

/// Count `/Type /Page` objects, ignoring the `/Pages` tree nodes
fn probe_pdf_page_count(bytes: &[u8]) -> usize {
    let count = find_all(bytes, b"/Type")
        .filter(|&pos| {
            let rest = &bytes[pos + 5..];
            let rest = skip_whitespace(rest);
            rest.starts_with(b"/Page") && !rest[5..].starts_with(b"s")
        })
        .count();
    count.max(1)
}

fn probe_pdf_encrypted(bytes: &[u8]) -> bool {
    find_all(bytes, b"/Encrypt").next().is_some()
}

fn find_all<'a>(haystack: &'a [u8], needle: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(move |(_, w)| *w == needle)
        .map(|(i, _)| i)
}

fn skip_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Output of an extraction adapter. Produced once per document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub text: String,
    /// Extraction confidence in [0, 1]
    pub confidence: f32,
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn success(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            success: true,
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, text: String::new(), confidence: 0.0, error: Some(error.into()) }
    }
}
