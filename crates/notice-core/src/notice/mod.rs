//! Notice classification, field extraction and record compilation.

mod classifier;
mod keyword;
mod matcher;
mod pipeline;
mod region;
pub mod rules;

pub use classifier::{DEFAULT_MARKER, DocumentClassifier, classify, classify_with_marker};
pub use keyword::KeywordExtractor;
pub use matcher::{PlateMatch, match_plate};
pub use pipeline::{NoticePipeline, PageInput, PageReport, PageSource, compile_record};
pub use region::{RegionExtractor, post_process};
