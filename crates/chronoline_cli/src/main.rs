//! Command-line front end for `chronoline_core`.
//!
//! # Responsibility
//! - Import CSV timelines from disk and print ranked events or the
//!   zoom-filtered render sequence.
//! - Expose the sheet-link rewrite and health probes for quick checks.

use chronoline_core::{
    init_logging, layout_for_zoom, parse_events_csv, sheet_csv_export_url, ImportReport,
    RenderItem, ZoomLevel,
};
use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "chronoline")]
#[command(about = "Importance-ranked, zoomable timelines", version)]
struct Cli {
    /// Absolute directory for rotating log files; logging is off when unset
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// Log level used together with --log-dir
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the render sequence (events and year markers) for a zoom level
    Render {
        /// CSV file with date, title, description, image and importance columns
        #[arg(long)]
        csv: PathBuf,
        /// Zoom level from 1 (overview) to 10 (every event)
        #[arg(long, default_value_t = 10)]
        zoom: u8,
        /// Emit JSON instead of text lines
        #[arg(long)]
        json: bool,
    },

    /// Print every imported event with its assigned display tier
    Normalize {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Rewrite a spreadsheet share link into its CSV export URL
    SheetUrl { url: String },

    /// Health probe
    Ping,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&cli.log_level, log_dir)?;
    }

    match cli.command {
        Command::Render { csv, zoom, json } => render(&csv, zoom, json),
        Command::Normalize { csv, json } => normalize(&csv, json),
        Command::SheetUrl { url } => sheet_url(&url),
        Command::Ping => {
            println!(
                "chronoline_core ping={} version={}",
                chronoline_core::ping(),
                chronoline_core::core_version()
            );
            Ok(())
        }
    }
}

fn import(path: &Path) -> Result<ImportReport, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;
    let report = parse_events_csv(&text)?;
    info!(
        "event=cli_import module=cli status=ok events={} skipped={}",
        report.events.len(),
        report.skipped.len()
    );
    for skipped in &report.skipped {
        eprintln!("skipped row {}: {}", skipped.row, skipped.reason);
    }
    Ok(report)
}

fn render(path: &Path, zoom: u8, json: bool) -> Result<(), Box<dyn Error>> {
    let zoom = ZoomLevel::new(zoom).ok_or_else(|| format!("zoom must be 1..=10, got {zoom}"))?;
    let report = import(path)?;
    let items = layout_for_zoom(&report.events, zoom);

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    for item in &items {
        match item {
            RenderItem::Marker { year } => println!("  -- {year} --"),
            RenderItem::Event { event } => println!(
                "{}  [tier {:>2}] {}",
                event.date,
                event.effective_tier().get(),
                event.title
            ),
        }
    }
    Ok(())
}

fn normalize(path: &Path, json: bool) -> Result<(), Box<dyn Error>> {
    let report = import(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report.events)?);
        return Ok(());
    }
    for event in &report.events {
        println!(
            "{}  importance={:>3} tier={:>2}  {}",
            event.date,
            event.importance_key(),
            event.effective_tier().get(),
            event.title
        );
    }
    Ok(())
}

fn sheet_url(url: &str) -> Result<(), Box<dyn Error>> {
    let export = sheet_csv_export_url(url).ok_or_else(|| format!("not a spreadsheet link: {url}"))?;
    println!("{export}");
    Ok(())
}
