//! Configuration structures for the notice pipeline.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main configuration for the notice pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    /// OCR provider configuration.
    pub ocr: OcrConfig,

    /// Document classification configuration.
    pub classification: ClassificationConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Template store configuration.
    pub template: TemplateConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,
}

/// OCR model configuration for the native provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "korean_rec.onnx".to_string(),
            dictionary: "korean_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    pub fn detection_path(&self) -> PathBuf {
        self.model_dir.join(&self.detection_model)
    }

    pub fn recognition_path(&self) -> PathBuf {
        self.model_dir.join(&self.recognition_model)
    }

    pub fn dictionary_path(&self) -> PathBuf {
        self.model_dir.join(&self.dictionary)
    }

    /// Whether every model file is present on disk.
    pub fn models_available(&self) -> bool {
        self.detection_path().exists()
            && self.recognition_path().exists()
            && self.dictionary_path().exists()
    }
}

/// Document classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Phrase that identifies a fixed-layout authority notice.
    pub marker: String,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            marker: "경찰청 고지".to_string(),
        }
    }
}

/// Field extraction configuration.
///
/// The fine bounds and discount rate follow the current fee schedule and
/// must be revisited for other jurisdictions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Smallest plausible fine (inclusive).
    pub min_fine: u64,

    /// Largest plausible fine (inclusive).
    pub max_fine: u64,

    /// Share of the fine payable within the early-payment window.
    pub discount_rate: Decimal,

    /// Currency unit appended to formatted amounts.
    pub currency_unit: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_fine: 10_000,
            max_fine: 500_000,
            discount_rate: Decimal::new(8, 1),
            currency_unit: "원".to_string(),
        }
    }
}

impl ExtractionConfig {
    /// Whether `value` is inside the plausible fine range.
    pub fn is_plausible_fine(&self, value: u64) -> bool {
        (self.min_fine..=self.max_fine).contains(&value)
    }
}

/// Template store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Template file location.
    pub path: PathBuf,

    /// Layout name recorded in newly captured templates.
    pub layout_name: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("notice_template.json"),
            layout_name: "police_notice".to_string(),
        }
    }
}

/// Batch processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum pages per batch (0 = unlimited).
    pub max_pages: usize,

    /// Pages processed concurrently.
    pub jobs: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            jobs: 4,
        }
    }
}

impl NoticeConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
