//! Document classification by marker phrase.

use tracing::debug;

use super::rules::patterns::strip_whitespace;
use crate::models::config::ClassificationConfig;
use crate::models::notice::Classification;

/// Marker printed on fixed-layout authority notices.
pub const DEFAULT_MARKER: &str = "경찰청 고지";

/// Classify page text with the default marker.
pub fn classify(text: &str) -> Classification {
    classify_with_marker(text, DEFAULT_MARKER)
}

/// A page is fixed-layout when it contains `marker` verbatim, or once all
/// whitespace is removed from both sides. An empty marker never matches.
pub fn classify_with_marker(text: &str, marker: &str) -> Classification {
    let marker = marker.trim();
    if marker.is_empty() {
        return Classification::Generic;
    }

    let found = text.contains(marker) || strip_whitespace(text).contains(&strip_whitespace(marker));

    let classification = if found {
        Classification::FixedLayout
    } else {
        Classification::Generic
    };

    debug!("Classified page as {}", classification);
    classification
}

/// Classifier bound to a configured marker.
#[derive(Debug, Clone)]
pub struct DocumentClassifier {
    marker: String,
}

impl DocumentClassifier {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn from_config(config: &ClassificationConfig) -> Self {
        Self::new(config.marker.clone())
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn classify(&self, text: &str) -> Classification {
        classify_with_marker(text, &self.marker)
    }
}

impl Default for DocumentClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}
