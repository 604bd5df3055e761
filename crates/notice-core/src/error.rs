//! Error types for the notice-core library.

use thiserror::Error;

/// Main error type for the notice library.
#[derive(Error, Debug)]
pub enum NoticeError {
    /// OCR provider or image preparation error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Template acquisition or persistence error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Roster validation error.
    #[error("roster error: {0}")]
    Roster(#[from] RosterError),

    /// A page could not be processed.
    #[error("page error: {0}")]
    Page(#[from] PageError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while talking to the OCR provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OcrError {
    /// The provider rejected or failed the request.
    #[error("provider failed: {0}")]
    Provider(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Invalid image bytes, dimensions or crop area.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Failed to encode an image crop for the provider.
    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// Validation errors for regions and template acquisition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The rectangle has zero width or height, or inverted corners.
    #[error("invalid region ({x1}, {y1}, {x2}, {y2}): expected x1 < x2 and y1 < y2")]
    DegenerateRegion { x1: u32, y1: u32, x2: u32, y2: u32 },

    /// A click landed outside the template image.
    #[error("point ({x}, {y}) lies outside the {width}x{height} image")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },

    /// Every field has already been captured or skipped.
    #[error("all fields have been processed")]
    AlreadyComplete,

    /// Finalization was requested before every field was processed.
    #[error("template incomplete: {processed} of {total} fields processed")]
    Incomplete { processed: usize, total: usize },

    /// A persisted template could not be read back.
    #[error("failed to parse template: {0}")]
    Parse(String),
}

/// Roster validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// Required columns are missing from the roster header.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A row carries fewer cells than the header demands.
    #[error("row {row} is missing the {column} column")]
    ShortRow { row: usize, column: String },
}

/// Reasons a single page cannot be processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// Fixed-layout page but no template has been captured.
    #[error("fixed-layout notice but no template is available")]
    MissingTemplate,

    /// Fixed-layout page supplied as text only.
    #[error("fixed-layout notice requires the page image")]
    MissingImage,

    /// The page image could not be decoded.
    #[error("failed to decode page image: {0}")]
    Decode(String),

    /// The page file could not be read.
    #[error("failed to read page: {0}")]
    Read(String),

    /// The page file is neither an image nor OCR text.
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    /// Processing stopped before the page produced a report.
    #[error("page processing aborted: {0}")]
    Aborted(String),
}

/// Result type for the notice library.
pub type Result<T> = std::result::Result<T, NoticeError>;
