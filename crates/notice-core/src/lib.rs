//! Core library for traffic-violation notice OCR processing.
//!
//! This crate provides:
//! - Document classification (fixed-layout authority notice vs. generic notice)
//! - Template capture and storage for fixed-layout regions
//! - Region-based and keyword-based field extraction
//! - Date, amount and plate normalization
//! - Roster matching and record compilation

pub mod error;
pub mod models;
pub mod notice;
pub mod ocr;
pub mod template;

pub use error::{NoticeError, OcrError, PageError, Result, RosterError, TemplateError};
pub use models::config::NoticeConfig;
pub use models::notice::{
    Classification, ExtractionResult, Field, FieldOutcome, MATCH_FAILED, MatchedUser,
    NormalizedRecord, NoticeRow,
};
pub use models::roster::{Roster, RosterEntry};
pub use notice::rules::{NormalizedAmount, normalize_amount, normalize_date, normalize_date_with_year};
pub use notice::{
    KeywordExtractor, NoticePipeline, PageInput, PageReport, PageSource, PlateMatch,
    RegionExtractor, classify, compile_record, match_plate,
};
#[cfg(feature = "native")]
pub use ocr::PureOcrProvider;
pub use ocr::{NoticeText, OcrProvider, UnavailableProvider};
pub use template::{Point, Region, Template, TemplateAcquisition, TemplateStore};
