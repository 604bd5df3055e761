//! OCR provider seam and page text.

mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;

pub use preprocessing::{crop_region, encode_png};
#[cfg(feature = "native")]
pub use pure_engine::PureOcrProvider;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Trait for text-detection providers.
///
/// The same call serves whole pages and cropped template regions. A provider
/// makes a single attempt; retries belong to a wrapping layer.
pub trait OcrProvider: Send + Sync {
    /// Detect all text in an encoded image. An image without text yields an
    /// empty string.
    fn text_detect(&self, image: &[u8]) -> Result<String, OcrError>;

    /// Provider name for logs.
    fn name(&self) -> &str {
        "ocr"
    }
}

impl<P: OcrProvider + ?Sized> OcrProvider for Arc<P> {
    fn text_detect(&self, image: &[u8]) -> Result<String, OcrError> {
        (**self).text_detect(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<P: OcrProvider + ?Sized> OcrProvider for &P {
    fn text_detect(&self, image: &[u8]) -> Result<String, OcrError> {
        (**self).text_detect(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Provider used when no OCR backend is configured; every call fails.
#[derive(Debug, Clone, Default)]
pub struct UnavailableProvider;

impl OcrProvider for UnavailableProvider {
    fn text_detect(&self, _image: &[u8]) -> Result<String, OcrError> {
        Err(OcrError::Provider("no OCR provider configured".to_string()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Full OCR text of a page and its lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeText {
    /// Full text as returned by the provider.
    pub text: String,

    /// Lines in reading order (split on `\n`, empty lines kept).
    pub lines: Vec<String>,
}

impl NoticeText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        Self { text, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Line `index` joined with the following line, if there is one.
    pub fn with_next_line(&self, index: usize) -> String {
        Self::join_with_next(&self.lines[index], self.lines.get(index + 1))
    }

    /// `head` joined with an optional following line.
    pub fn join_with_next(head: &str, next: Option<&String>) -> String {
        match next {
            Some(next) => format!("{} {}", head, next),
            None => head.to_string(),
        }
    }
}
