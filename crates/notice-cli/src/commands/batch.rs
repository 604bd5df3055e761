//! Batch processing command for multiple notice pages.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use notice_core::{NoticeRow, PageError, PageReport};

use super::{PipelineArgs, build_pipeline, file_name, is_image, is_supported, load_config, read_page};

/// UTF-8 byte order mark; spreadsheet applications need it to detect the encoding.
const UTF8_BOM: &str = "\u{feff}";

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob patterns, processed in the given order
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: BatchFormat,

    /// Number of pages processed in parallel (default: from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Maximum pages per batch, 0 for no limit (default: from config)
    #[arg(long)]
    max_pages: Option<usize>,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum BatchFormat {
    /// CSV table with a UTF-8 byte order mark
    Csv,
    /// JSON array of rows
    Json,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files = expand_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for: {}", args.inputs.join(" "));
    }

    let max_pages = args.max_pages.unwrap_or(config.batch.max_pages);
    if max_pages > 0 && files.len() > max_pages {
        anyhow::bail!(
            "Batch of {} pages exceeds the limit of {} pages",
            files.len(),
            max_pages
        );
    }

    eprintln!(
        "{} Found {} pages to process",
        style("ℹ").blue(),
        files.len()
    );

    let needs_ocr = files.iter().any(|p| is_image(p));
    let pipeline = build_pipeline(&args.pipeline, &config, needs_ocr)?;
    let jobs = args.jobs.unwrap_or(config.batch.jobs).max(1);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut tasks = JoinSet::new();
    let mut pending: BTreeMap<usize, String> = BTreeMap::new();

    for (index, path) in files.into_iter().enumerate() {
        let permit = semaphore.clone().acquire_owned().await?;
        let pipeline = pipeline.clone();
        pending.insert(index, file_name(&path));

        tasks.spawn_blocking(move || {
            let _permit = permit;
            match read_page(&path) {
                Ok(page) => pipeline.process_page(index, &page),
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    PageReport::failed(index, file_name(&path), e)
                }
            }
        });
    }

    let mut reports = join_reports(tasks, pending, &pb).await;
    pb.finish_and_clear();
    reports.sort_by_key(|r| r.index);

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    let rows: Vec<NoticeRow> = reports.iter().map(PageReport::to_row).collect();

    let output = match args.format {
        BatchFormat::Csv => format_csv(&rows)?,
        BatchFormat::Json => serde_json::to_string_pretty(&rows)?,
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", output);
    }

    eprintln!(
        "{} Processed {} pages ({} failed) in {:.1}s",
        if failed == 0 { style("✓").green() } else { style("!").yellow() },
        rows.len(),
        failed,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Wait for every page task. A page whose task panicked or was cancelled gets
/// a failed report instead of failing the whole batch.
async fn join_reports(
    mut tasks: JoinSet<PageReport>,
    mut pending: BTreeMap<usize, String>,
    pb: &ProgressBar,
) -> Vec<PageReport> {
    let mut reports = Vec::with_capacity(tasks.len());

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(report) => {
                pending.remove(&report.index);
                reports.push(report);
            }
            Err(e) => error!("Page task failed: {}", e),
        }
        pb.inc(1);
    }

    reports.extend(pending.into_iter().map(|(index, name)| {
        PageReport::failed(index, name, PageError::Aborted("page task did not complete".to_string()))
    }));

    reports
}

/// Expand the input arguments into page paths, in argument order.
///
/// An argument naming a file, or one without glob metacharacters, is kept as
/// given even when it is missing or of an unsupported type, so the batch
/// reports it as a failed page. Glob matches are sorted and limited to
/// supported page files.
fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let literal = Path::new(input);
        if literal.is_file() || !input.contains(['*', '?', '[']) {
            files.push(literal.to_path_buf());
            continue;
        }

        let mut matched: Vec<PathBuf> = glob(input)?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        matched.sort();

        if matched.is_empty() {
            warn!("No files match {}", input);
        }

        for path in matched {
            if is_supported(&path) {
                files.push(path);
            } else {
                debug!("Skipping unsupported file {}", path.display());
            }
        }
    }

    Ok(files)
}

fn format_csv(rows: &[NoticeRow]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(format!("{}{}", UTF8_BOM, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_inputs_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.txt", "notes.pdf"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let pattern = format!("{}/*", dir.path().display());
        let files = expand_inputs(&[pattern]).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();

        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_missing_literal_path_is_kept() {
        let files = expand_inputs(&["/nonexistent/scan.png".to_string()]).unwrap();
        assert_eq!(files, vec![PathBuf::from("/nonexistent/scan.png")]);
    }

    #[test]
    fn test_named_files_are_kept_whatever_their_type() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("notice.pdf");
        let bracketed = dir.path().join("scan[1].txt");
        fs::write(&pdf, "%PDF-1.7").unwrap();
        fs::write(&bracketed, "x").unwrap();

        let inputs = [pdf.display().to_string(), bracketed.display().to_string()];
        let files = expand_inputs(&inputs).unwrap();

        assert_eq!(files, vec![pdf, bracketed]);
    }

    #[test]
    fn test_unmatched_glob_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.png", dir.path().display());

        assert!(expand_inputs(&[pattern]).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_panicked_page_becomes_failed_report() {
        let mut tasks = JoinSet::new();
        tasks.spawn_blocking(|| PageReport::failed(0, "a.txt", PageError::Read("gone".to_string())));
        tasks.spawn_blocking(|| -> PageReport { panic!("boom") });

        let pending = BTreeMap::from([(0, "a.txt".to_string()), (1, "b.png".to_string())]);
        let mut reports = join_reports(tasks, pending, &ProgressBar::hidden()).await;
        reports.sort_by_key(|r| r.index);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].file_name, "a.txt");
        assert_eq!(reports[1].file_name, "b.png");
        assert_eq!(
            reports[1].outcome.as_ref().unwrap_err(),
            &PageError::Aborted("page task did not complete".to_string())
        );
    }

    #[test]
    fn test_csv_starts_with_bom() {
        let rows = vec![NoticeRow::failed("x.png", None, "failed to read page: gone")];
        let csv = format_csv(&rows).unwrap();

        assert!(csv.starts_with('\u{feff}'));
        assert!(csv.contains("fileName"));
        assert!(csv.contains("failed to read page: gone"));
    }
}
