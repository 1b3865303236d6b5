//! `shelldoc` CLI — format, check, and convert relaxed shell-document
//! literals from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Reformat a document (stdin → stdout)
//! echo '{name:"Ada", id: ObjectId("507f1f77bcf86cd799439011")}' | shelldoc fmt
//!
//! # Format from file to file
//! shelldoc fmt -i query.doc -o query.formatted.doc
//!
//! # Check a document, reporting the offending line on failure
//! shelldoc check -i query.doc
//!
//! # Convert to MongoDB extended JSON
//! shelldoc json -i query.doc
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::process;

#[derive(Parser)]
#[command(
    name = "shelldoc",
    version,
    about = "Relaxed Mongo-shell document literal toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a document and pretty-print it in canonical formatting
    Fmt {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Validate a document; print diagnostics and exit nonzero on failure
    Check {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Convert a document to MongoDB extended JSON
    Json {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fmt { input, output } => {
            let text = read_input(input.as_deref())?;
            let value = shelldoc_core::parse_document(&text, shelldoc_core::DEFAULT_MAX_DEPTH)
                .context("Failed to parse document")?;
            let formatted = shelldoc_core::serialize(&value);
            write_output(output.as_deref(), &formatted)?;
        }
        Commands::Check { input } => {
            let text = read_input(input.as_deref())?;
            let outcome = shelldoc_core::safe_parse(&text);
            if outcome.success {
                // Constructor calls parse structurally; vet them too so a bad
                // ObjectId surfaces here rather than at execution time.
                if let Some(value) = &outcome.value {
                    if let Err(err) = shelldoc_core::validate(value) {
                        eprintln!("error: {err}");
                        process::exit(1);
                    }
                }
                println!("OK");
            } else {
                let message = outcome.error.as_deref().unwrap_or("parse failed");
                match outcome.error_line {
                    Some(line) => eprintln!("error at line {line}: {message}"),
                    None => eprintln!("error: {message}"),
                }
                process::exit(1);
            }
        }
        Commands::Json { input, output } => {
            let text = read_input(input.as_deref())?;
            let value = shelldoc_core::parse_document(&text, shelldoc_core::DEFAULT_MAX_DEPTH)
                .context("Failed to parse document")?;
            let json = shelldoc_core::canonical_json(&value)
                .context("Failed to evaluate constructor calls")?;
            let pretty = serde_json::to_string_pretty(&json)?;
            write_output(output.as_deref(), &pretty)?;
        }
    }

    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
