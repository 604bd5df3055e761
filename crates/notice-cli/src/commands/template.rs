//! Template command - capture, show and clear the fixed-layout template.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;
use tracing::{debug, info};

use notice_core::template::{AcquisitionEvent, ClickStep, Transition};
use notice_core::{Point, TemplateAcquisition, TemplateError, TemplateStore};

use super::load_config;

/// Arguments for the template command.
#[derive(Args)]
pub struct TemplateArgs {
    /// Template file (default: from config)
    #[arg(short, long, global = true)]
    template: Option<PathBuf>,

    #[command(subcommand)]
    command: TemplateCommand,
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// Capture field regions on a sample notice image
    Capture(CaptureArgs),

    /// Show the stored template
    Show,

    /// Delete the stored template
    Clear,
}

#[derive(Args)]
struct CaptureArgs {
    /// Sample notice image the regions are captured on
    image: PathBuf,

    /// Preview scale (display width / original width) used for clicks
    #[arg(long, default_value = "1.0")]
    scale: f64,

    /// Layout name (default: from config)
    #[arg(long)]
    layout: Option<String>,

    /// Replace an existing template
    #[arg(long)]
    force: bool,
}

pub async fn run(args: TemplateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = TemplateStore::new(args.template.unwrap_or(config.template.path.clone()));

    match args.command {
        TemplateCommand::Capture(capture) => {
            let layout = capture.layout.clone().unwrap_or(config.template.layout_name.clone());
            capture_template(&store, capture, &layout)
        }
        TemplateCommand::Show => show_template(&store),
        TemplateCommand::Clear => clear_template(&store),
    }
}

/// A parsed line of operator input.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Event(AcquisitionEvent),
    Quit,
}

fn parse_command(line: &str, scale: f64) -> anyhow::Result<Command> {
    let words: Vec<&str> = line.split_whitespace().collect();

    let numbers = |values: &[&str]| -> anyhow::Result<Vec<u32>> {
        values
            .iter()
            .map(|v| v.parse::<u32>().map_err(|_| anyhow::anyhow!("not a pixel coordinate: {}", v)))
            .collect()
    };

    let command = match words.as_slice() {
        ["quit" | "q"] => Command::Quit,
        ["skip" | "s"] => Command::Event(AcquisitionEvent::Skip),
        ["redo" | "r"] => Command::Event(AcquisitionEvent::SoftReset),
        ["reset"] => Command::Event(AcquisitionEvent::Reset),
        ["manual" | "m", rest @ ..] => match numbers(rest)?.as_slice() {
            [x1, y1, x2, y2] => Command::Event(AcquisitionEvent::Manual {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
            }),
            _ => anyhow::bail!("usage: manual <x1> <y1> <x2> <y2>"),
        },
        [x, y] => match numbers(&[*x, *y])?.as_slice() {
            [x, y] => Command::Event(AcquisitionEvent::Click(Point::from_display(*x, *y, scale))),
            _ => anyhow::bail!("usage: <x> <y>"),
        },
        _ => anyhow::bail!("unknown command: {}", line.trim()),
    };

    Ok(command)
}

fn prompt(acquisition: &TemplateAcquisition, out: &mut impl Write) -> io::Result<()> {
    let Some(field) = acquisition.current_field() else {
        return Ok(());
    };

    let corner = match acquisition.step() {
        ClickStep::AwaitingTopLeft => "top-left".to_string(),
        ClickStep::AwaitingBottomRight { top_left } => format!("bottom-right (top-left {})", top_left),
    };

    write!(
        out,
        "[{}/{}] {} - {}\n      {} > ",
        acquisition.field_index() + 1,
        notice_core::Field::ALL.len(),
        style(field.label()).bold(),
        field.hint(),
        corner
    )?;
    out.flush()
}

fn describe(transition: &Transition) -> String {
    match transition {
        Transition::TopLeftStored { field, point } => {
            format!("{} top-left of {} at {}", style("·").dim(), field.label(), point)
        }
        Transition::Committed { field, region } => {
            format!("{} {} {}", style("✓").green(), field.label(), region)
        }
        Transition::Skipped(field) => format!("{} {} skipped", style("-").yellow(), field.label()),
        Transition::SelectionCleared => format!("{} selection cleared", style("ℹ").blue()),
        Transition::ResetAll => format!("{} starting over", style("ℹ").blue()),
        Transition::Duplicate => format!("{} duplicate click ignored", style("ℹ").blue()),
    }
}

/// Drive `acquisition` from operator input until every field is processed.
fn run_session(
    acquisition: &mut TemplateAcquisition,
    input: impl BufRead,
    out: &mut impl Write,
    scale: f64,
) -> anyhow::Result<()> {
    let mut lines = input.lines();

    while !acquisition.is_complete() {
        prompt(acquisition, out)?;

        let Some(line) = lines.next() else {
            anyhow::bail!("input ended before every field was captured");
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let event = match parse_command(&line, scale) {
            Ok(Command::Quit) => anyhow::bail!("template capture aborted"),
            Ok(Command::Event(event)) => event,
            Err(e) => {
                writeln!(out, "{} {}", style("✗").red(), e)?;
                continue;
            }
        };

        match acquisition.apply(event) {
            Ok(transition) => {
                debug!("Acquisition transition: {:?}", transition);
                writeln!(out, "{}", describe(&transition))?;
            }
            Err(e @ (TemplateError::OutOfBounds { .. } | TemplateError::DegenerateRegion { .. })) => {
                writeln!(out, "{} {}", style("✗").red(), e)?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn capture_template(store: &TemplateStore, args: CaptureArgs, layout: &str) -> anyhow::Result<()> {
    if store.exists() && !args.force {
        println!(
            "{} Template already exists at {}; it is used as is. Use --force to capture a new one.",
            style("ℹ").blue(),
            store.path().display()
        );
        return Ok(());
    }

    let (width, height) = image::image_dimensions(&args.image)?;
    info!("Capturing template on {}x{} image {}", width, height, args.image.display());

    println!(
        "{} Capturing '{}' on {} ({}x{}, scale {})",
        style("ℹ").blue(),
        layout,
        args.image.display(),
        width,
        height,
        args.scale
    );
    println!("  Enter '<x> <y>' for each corner, 'manual x1 y1 x2 y2', 'skip', 'redo', 'reset' or 'quit'.");

    let mut acquisition = TemplateAcquisition::new().with_image_size(width, height);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_session(&mut acquisition, stdin.lock(), &mut stdout, args.scale)?;

    let template = acquisition.finalize(layout)?;
    store.save(&template)?;

    println!(
        "{} Saved template with {} regions to {}",
        style("✓").green(),
        template.len(),
        store.path().display()
    );

    Ok(())
}

fn show_template(store: &TemplateStore) -> anyhow::Result<()> {
    let Some(template) = store.load()? else {
        println!(
            "{} No template at {}. Run 'notice template capture <image>' first.",
            style("ℹ").blue(),
            store.path().display()
        );
        return Ok(());
    };

    println!("Layout:  {}", template.layout_name);
    println!("Created: {}", template.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Image:   {}x{}", template.image_size.0, template.image_size.1);
    println!();

    for field in notice_core::Field::ALL {
        match template.region(field) {
            Some(region) => println!("  {:<8} {}", field.label(), region),
            None => println!("  {:<8} {}", field.label(), style("(skipped)").dim()),
        }
    }

    Ok(())
}

fn clear_template(store: &TemplateStore) -> anyhow::Result<()> {
    if store.clear()? {
        println!(
            "{} Removed template at {}",
            style("✓").green(),
            store.path().display()
        );
    } else {
        println!(
            "{} No template at {}",
            style("ℹ").blue(),
            store.path().display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notice_core::{Field, Region};

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("quit", 1.0).unwrap(), Command::Quit);
        assert_eq!(
            parse_command("skip", 1.0).unwrap(),
            Command::Event(AcquisitionEvent::Skip)
        );
        assert_eq!(
            parse_command("manual 1 2 30 40", 1.0).unwrap(),
            Command::Event(AcquisitionEvent::Manual { x1: 1, y1: 2, x2: 30, y2: 40 })
        );
        assert!(parse_command("manual 1 2 3", 1.0).is_err());
        assert!(parse_command("hello", 1.0).is_err());
    }

    #[test]
    fn test_clicks_are_mapped_from_display() {
        assert_eq!(
            parse_command("50 25", 0.5).unwrap(),
            Command::Event(AcquisitionEvent::Click(Point::new(100, 50)))
        );
    }

    #[test]
    fn test_session_captures_all_fields() {
        let input = "10 10\n60 30\n\
                     manual 0 40 50 60\n\
                     skip\n\
                     bogus\n\
                     500 500\n\
                     70 70\n90 90\n\
                     skip\n\
                     skip\n";

        let mut acquisition = TemplateAcquisition::new().with_image_size(200, 200);
        let mut out = Vec::new();
        run_session(&mut acquisition, input.as_bytes(), &mut out, 1.0).unwrap();

        let template = acquisition.finalize("police_notice").unwrap();
        assert_eq!(template.region(Field::PlateNumber), Some(&Region::new(10, 10, 60, 30).unwrap()));
        assert_eq!(template.region(Field::Date), Some(&Region::new(0, 40, 50, 60).unwrap()));
        assert_eq!(template.region(Field::Location), None);
        assert_eq!(template.region(Field::Fine), Some(&Region::new(70, 70, 90, 90).unwrap()));
        assert_eq!(template.len(), 3);

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("unknown command: bogus"));
        assert!(transcript.contains("outside the 200x200 image"));
    }

    #[test]
    fn test_session_stops_on_quit_and_eof() {
        let mut acquisition = TemplateAcquisition::new().with_image_size(100, 100);
        let err = run_session(&mut acquisition, "quit\n".as_bytes(), &mut Vec::new(), 1.0).unwrap_err();
        assert_eq!(err.to_string(), "template capture aborted");

        let mut acquisition = TemplateAcquisition::new().with_image_size(100, 100);
        assert!(run_session(&mut acquisition, "skip\n".as_bytes(), &mut Vec::new(), 1.0).is_err());
    }

    #[test]
    fn test_store_round_trip_through_commands() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path().join("t.json"));

        clear_template(&store).unwrap();
        show_template(&store).unwrap();
        assert!(!store.exists());
    }
}
