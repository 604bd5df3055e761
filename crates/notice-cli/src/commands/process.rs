//! Process command - extract a record from a single notice page.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use notice_core::{ExtractionResult, Field, FieldOutcome, NoticeRow, PageReport};

use super::{PipelineArgs, build_pipeline, is_image, is_supported, load_config, read_page};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input page (image, or .txt with OCR text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show raw per-field extraction outcomes
    #[arg(long)]
    details: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !is_supported(&args.input) {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pipeline = build_pipeline(&args.pipeline, &config, is_image(&args.input))?;
    let page = read_page(&args.input)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Reading {}...", page.file_name));

    let report = tokio::task::spawn_blocking(move || pipeline.process_page(0, &page)).await?;

    pb.finish_and_clear();

    if args.details {
        if let Some(extraction) = &report.extraction {
            eprintln!("{}", format_details(extraction));
        }
    }

    if let Err(e) = &report.outcome {
        anyhow::bail!("Failed to process {}: {}", report.file_name, e);
    }

    let output = format_report(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_report(report: &PageReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => match report.record() {
            Some(record) => Ok(serde_json::to_string_pretty(record)?),
            None => Ok(serde_json::to_string_pretty(&report.to_row())?),
        },
        OutputFormat::Csv => format_csv(&report.to_row()),
        OutputFormat::Text => Ok(format_text(&report.to_row())),
    }
}

fn format_csv(row: &NoticeRow) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.serialize(row)?;
    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(row: &NoticeRow) -> String {
    let mut output = String::new();

    output.push_str(&format!("File: {} ({})\n", row.file_name, row.classification));
    output.push('\n');
    output.push_str(&format!("Plate:       {}\n", row.plate));
    output.push_str(&format!("User:        {} / {}\n", row.department, row.user));
    output.push_str(&format!("Date:        {}\n", row.date));
    output.push_str(&format!("Location:    {}\n", row.location));
    output.push_str(&format!("Description: {}\n", row.description));
    output.push('\n');
    output.push_str(&format!("Fine:        {}\n", row.fine));
    if !row.discounted_fine.is_empty() {
        output.push_str(&format!("Discounted:  {}\n", row.discounted_fine));
    }
    output.push_str(&format!("Due date:    {}\n", row.due_date));

    output
}

fn format_details(extraction: &ExtractionResult) -> String {
    let mut output = format!("{}\n", style("Extraction details:").bold());

    for field in Field::ALL {
        let line = match extraction.outcome(field) {
            FieldOutcome::Extracted(value) => {
                format!("  {} {}: {}", style("✓").green(), field.label(), value)
            }
            FieldOutcome::Empty => format!("  {} {}: (empty)", style("·").dim(), field.label()),
            FieldOutcome::Absent => format!("  {} {}: -", style("·").dim(), field.label()),
            FieldOutcome::Failed(reason) => {
                format!("  {} {}: {}", style("✗").red(), field.label(), reason)
            }
        };
        output.push_str(&line);
        output.push('\n');
    }

    output
}
