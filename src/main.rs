use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use gaps_extract::extract::grades;
use gaps_extract::Payload;

/// Decode saved GAPS responses into typed JSON records.
#[derive(Parser)]
#[command(name = "gaps_extract", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Continuous-assessment grades, one entry per class
    Grades {
        /// Saved response body
        file: PathBuf,
        /// Keep only the class with this exact name
        #[arg(long)]
        class: Option<String>,
    },
    /// Module report card
    ReportCard {
        /// Saved response body
        file: PathBuf,
    },
    /// Per-course absence report
    Absences {
        /// Saved response body
        file: PathBuf,
    },
    /// Rooms/teachers/students directory
    Registry {
        /// Saved response body
        file: PathBuf,
    },
    /// Student id planted in the landing page scripts
    StudentId {
        /// Saved landing page
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Grades { file, class } => {
            let mut classes = read_payload(&file)?.grades()?;
            if let Some(class) = class {
                classes = grades::filter_classes(classes, &class)?;
            }
            print_json(&classes)
        }
        Commands::ReportCard { file } => print_json(&read_payload(&file)?.report_card()?),
        Commands::Absences { file } => print_json(&read_payload(&file)?.absences()?),
        Commands::Registry { file } => print_json(&read_payload(&file)?.registry()?),
        Commands::StudentId { file } => {
            println!("{}", read_payload(&file)?.student_id()?);
            Ok(())
        }
    }
}

fn read_payload(file: &Path) -> anyhow::Result<Payload> {
    let raw = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    Ok(Payload::from_bytes(&raw)?)
}

fn print_json<T: Serialize>(records: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}
