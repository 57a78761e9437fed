//! Command-line example scripts over the Universal Ink Model workspace
//! (§6 "Public library surface", demo surface named in `SPEC_FULL.md`
//! §2 ambient additions).
//!
//! ```text
//! cargo run -p uim-cli -- stats document.uim
//! cargo run -p uim-cli -- export --format json document.uim
//! cargo run -p uim-cli -- extract --view hwr document.uim
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "uim-cli", about = "Inspect Universal Ink Model (.uim) documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print aggregate statistics (stroke/brush/triple counts, per-tree
    /// node counts) for a document.
    Stats { path: PathBuf },
    /// Render a document (or one stroke's spline) to JSON or CSV.
    Export {
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// 0-based index into the document's stroke list; required for
        /// `--format csv`, ignored for `--format json`.
        #[arg(long)]
        stroke: Option<usize>,
    },
    /// Extract word/named-entity records from a named view.
    Extract {
        path: PathBuf,
        #[arg(long, default_value = "hwr")]
        view: String,
    },
    /// Resample every stroke's spline at a fixed arc-length step and
    /// report the point-count change.
    Resample {
        path: PathBuf,
        #[arg(long, default_value_t = 1.0)]
        step: f64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("uim-cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Stats { path } => cmd_stats(&path),
        Command::Export { path, format, stroke } => cmd_export(&path, format, stroke),
        Command::Extract { path, view } => cmd_extract(&path, &view),
        Command::Resample { path, step } => cmd_resample(&path, step),
    }
}

fn read_model(path: &std::path::Path) -> anyhow::Result<uim::InkModel> {
    let bytes = std::fs::read(path)?;
    let model = uim::parse(&bytes, uim::DecodeOptions::strict())?;
    Ok(model)
}

fn cmd_stats(path: &std::path::Path) -> anyhow::Result<()> {
    let model = read_model(path)?;
    let stats = uim_stats::analyze(&model);
    println!("strokes:           {}", stats.stroke_count);
    println!("sensor frames:     {}", stats.sensor_frame_count);
    println!("vector brushes:    {}", stats.vector_brush_count);
    println!("raster brushes:    {}", stats.raster_brush_count);
    println!("total samples:     {}", stats.total_sample_count);
    for tree in &stats.trees {
        println!(
            "tree {:<12} groups={:<5} stroke-refs={:<5} nodes={}",
            tree.name,
            tree.group_count,
            tree.stroke_ref_count,
            tree.node_count()
        );
    }
    for (predicate, count) in &stats.triple_counts_by_predicate {
        println!("triples[{predicate}] = {count}");
    }
    Ok(())
}

fn cmd_export(path: &std::path::Path, format: ExportFormat, stroke: Option<usize>) -> anyhow::Result<()> {
    let model = read_model(path)?;
    match format {
        ExportFormat::Json => {
            let json = uim_export::to_json(&model)?;
            println!("{json}");
        }
        ExportFormat::Csv => {
            let index = stroke.ok_or_else(|| anyhow::anyhow!("--stroke is required for --format csv"))?;
            let (_, stroke) = model
                .strokes
                .iter()
                .nth(index)
                .ok_or_else(|| anyhow::anyhow!("document has no stroke at index {index}"))?;
            let layout: Vec<&'static str> = vec!["X", "Y"];
            let csv = uim_export::to_csv(&model, stroke, &layout, uim_export::MissingPolicy::FillWithZeros)?
                .unwrap_or_default();
            print!("{csv}");
        }
    }
    Ok(())
}

fn cmd_extract(path: &std::path::Path, view: &str) -> anyhow::Result<()> {
    let model = read_model(path)?;
    let words = uim_extract::extract(&model, view)?;
    for word in words {
        println!(
            "{}\t{:?}\t{:?}\tbbox=({:.2},{:.2})-({:.2},{:.2})",
            word.node_uri,
            word.text,
            word.language,
            word.bounding_box.min_x,
            word.bounding_box.min_y,
            word.bounding_box.max_x,
            word.bounding_box.max_y
        );
    }
    Ok(())
}

fn cmd_resample(path: &std::path::Path, step: f64) -> anyhow::Result<()> {
    let model = read_model(path)?;
    for (id, stroke) in model.strokes.iter() {
        let before = stroke.spline.point_count();
        match uim_resample::resample_stroke(stroke, step) {
            Ok(resampled) => println!("{id}: {} -> {} points", before, resampled.point_count()),
            Err(err) => println!("{id}: skipped ({err})"),
        }
    }
    Ok(())
}
