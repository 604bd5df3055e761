//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod process;
pub mod template;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use notice_core::models::config::NoticeConfig;
use notice_core::{
    NoticePipeline, OcrProvider, PageError, PageInput, PureOcrProvider, Roster, Template,
    TemplateStore, UnavailableProvider,
};

/// Image extensions accepted as page input.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Extension for pages that were already OCR'd.
const TEXT_EXTENSION: &str = "txt";

pub type Pipeline = NoticePipeline<dyn OcrProvider>;

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notice-ocr")
        .join("config.json")
}

/// Explicit `--config` path, else the default file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<NoticeConfig> {
    if let Some(path) = config_path {
        return Ok(NoticeConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        Ok(NoticeConfig::from_file(&default_path)?)
    } else {
        Ok(NoticeConfig::default())
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

pub fn is_image(path: &Path) -> bool {
    IMAGE_EXTENSIONS.contains(&extension(path).as_str())
}

pub fn is_supported(path: &Path) -> bool {
    is_image(path) || extension(path) == TEXT_EXTENSION
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read a page file: `.txt` files carry OCR text, anything else image bytes.
pub fn read_page(path: &Path) -> Result<PageInput, PageError> {
    let name = file_name(path);

    if !is_supported(path) {
        return Err(PageError::Unsupported(name));
    }

    if extension(path) == TEXT_EXTENSION {
        let text = fs::read_to_string(path).map_err(|e| PageError::Read(e.to_string()))?;
        Ok(PageInput::text(name, text))
    } else {
        let bytes = fs::read(path).map_err(|e| PageError::Read(e.to_string()))?;
        Ok(PageInput::image(name, bytes))
    }
}

/// Load a roster CSV with a header row.
pub fn load_roster(path: &Path) -> anyhow::Result<Roster> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect::<Vec<_>>()))
        .collect::<Result<Vec<_>, _>>()?;

    let roster = Roster::from_table(&headers, rows)?;
    info!("Loaded {} roster entries from {}", roster.len(), path.display());

    Ok(roster)
}

/// Load the stored template, if one has been captured.
pub fn load_template(config: &NoticeConfig, path: Option<&Path>) -> anyhow::Result<Option<Template>> {
    let store = TemplateStore::new(path.unwrap_or(&config.template.path));
    let template = store.load()?;

    match &template {
        Some(t) => debug!("Loaded template '{}' from {}", t.layout_name, store.path().display()),
        None => debug!("No template at {}", store.path().display()),
    }

    Ok(template)
}

/// Native OCR when the models are on disk.
///
/// Without models only text pages can be processed; image pages are refused.
pub fn build_provider(config: &NoticeConfig, needs_ocr: bool) -> anyhow::Result<Arc<dyn OcrProvider>> {
    if config.ocr.models_available() {
        let provider = PureOcrProvider::from_config(&config.ocr)?;
        return Ok(Arc::new(provider));
    }

    if needs_ocr {
        anyhow::bail!(
            "OCR models not found in {}.\n\n\
             Place {}, {} and {} there, or set 'ocr.model_dir' with 'notice config set'.",
            config.ocr.model_dir.display(),
            config.ocr.detection_model,
            config.ocr.recognition_model,
            config.ocr.dictionary
        );
    }

    warn!("OCR models not found, only text pages can be processed");
    Ok(Arc::new(UnavailableProvider))
}

/// Shared options for commands that run the pipeline.
#[derive(clap::Args, Clone)]
pub struct PipelineArgs {
    /// Roster CSV (columns 차량번호, 성명/사용자, 부서)
    #[arg(short, long)]
    pub roster: Option<PathBuf>,

    /// Template file (default: from config)
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Year used for dates printed without one (default: current year)
    #[arg(long)]
    pub year: Option<i32>,
}

pub fn build_pipeline(
    args: &PipelineArgs,
    config: &NoticeConfig,
    needs_ocr: bool,
) -> anyhow::Result<Pipeline> {
    let provider = build_provider(config, needs_ocr)?;
    let mut pipeline = NoticePipeline::new(provider, config);

    if let Some(template) = load_template(config, args.template.as_deref())? {
        pipeline = pipeline.with_template(template);
    }

    match &args.roster {
        Some(path) => pipeline = pipeline.with_roster(load_roster(path)?),
        None => warn!("No roster given, every plate will be reported as unmatched"),
    }

    if let Some(year) = args.year {
        pipeline = pipeline.with_current_year(year);
    }

    Ok(pipeline)
}
