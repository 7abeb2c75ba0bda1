//! CLI tool for turning PowerPoint slides and notes into flashcard spreadsheets.

mod config;
mod pipeline;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::PipelineConfig;
use deck_genai::GeminiClient;
use std::path::{Path, PathBuf};

/// Turn PowerPoint slides and speaker notes into flashcard spreadsheets.
#[derive(Parser, Debug)]
#[command(name = "deck-cards")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Restructure slides and notes with the Gemini API into output.xlsx
    Convert {
        /// Input PowerPoint file (.pptx)
        input: PathBuf,

        /// Output directory (default: same as input file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON file with pipeline settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fragments per restructuring request
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Attempts per chunk when rate limited (at least 1)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_retries: Option<u32>,

        /// Delay before the first retry, in milliseconds
        #[arg(long)]
        base_delay_ms: Option<u64>,

        /// Gemini model name
        #[arg(long)]
        model: Option<String>,

        /// Gemini API key
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Directory the presentation is unpacked into
        #[arg(long)]
        work_dir: Option<PathBuf>,
    },

    /// Parse slides and notes locally into slides.xlsx, slides-notes.xlsx and slides-output.xlsx
    Heuristic {
        /// Input PowerPoint file (.pptx)
        input: PathBuf,

        /// Output directory (default: same as input file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory the presentation is unpacked into
        #[arg(long, default_value = "extracted_pptx")]
        work_dir: PathBuf,
    },

    /// Append the data rows of one workbook to another
    Merge {
        /// Workbook whose rows come first, header included
        first: PathBuf,

        /// Workbook whose rows follow, header skipped
        second: PathBuf,

        /// Destination workbook
        #[arg(short, long, default_value = "merged.xlsx")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match args.command {
        Command::Convert {
            input,
            output,
            config,
            chunk_size,
            max_retries,
            base_delay_ms,
            model,
            api_key,
            work_dir,
        } => {
            let mut settings = match config {
                Some(path) => PipelineConfig::from_file(&path)?,
                None => PipelineConfig::default(),
            };
            if let Some(chunk_size) = chunk_size {
                settings.chunk_size = chunk_size;
            }
            if let Some(max_retries) = max_retries {
                settings.max_retries = max_retries;
            }
            if let Some(base_delay_ms) = base_delay_ms {
                settings.base_delay_ms = base_delay_ms;
            }
            if let Some(model) = model {
                settings.model = model;
            }
            if let Some(work_dir) = work_dir {
                settings.work_dir = work_dir;
            }

            let client = GeminiClient::new(api_key)
                .context("Failed to set up the Gemini client")?
                .with_model(settings.model.clone());

            let output_dir = output_dir(&input, output);
            let written = pipeline::convert(&input, &output_dir, &settings, client)?;
            if args.verbose {
                eprintln!("Written to: {}", written.display());
            }
        }
        Command::Heuristic {
            input,
            output,
            work_dir,
        } => {
            let output_dir = output_dir(&input, output);
            let written = pipeline::convert_heuristic(&input, &output_dir, &work_dir)?;
            if args.verbose {
                eprintln!("Written to: {}", written.slides.display());
                eprintln!("Written to: {}", written.notes.display());
                eprintln!("Written to: {}", written.merged.display());
            }
        }
        Command::Merge {
            first,
            second,
            output,
        } => {
            let merged = deck_xlsx::merge_workbooks(&first, &second, &output)?;
            if args.verbose {
                eprintln!(
                    "Merged {} rows into {}",
                    merged.rows().len(),
                    output.display()
                );
            }
        }
    }

    Ok(())
}

/// Determine the output directory for a processed file.
fn output_dir(input_path: &Path, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| {
        input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    })
}
