use anyhow::{Context, Result};
use clap::Parser;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// Validate every line of an SFT JSONL file against the SFT example v1 schema.
#[derive(Parser, Debug)]
#[command(name = "validate-sft", version, about = "Validate SFT JSONL against schema")]
struct Cli {
    /// Path to the JSONL file to validate
    path: PathBuf,

    /// Optional path to a schema file (defaults to schemas/sft_example.v1.json)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Stop reporting after this many invalid lines
    #[arg(long, default_value_t = 20)]
    max_errors: usize,
}

fn load_json(path: &PathBuf) -> Result<Value> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let json: Value = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
    Ok(json)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let schema_path = args
        .schema
        .unwrap_or_else(|| PathBuf::from("schemas/sft_example.v1.json"));

    let schema_json = load_json(&schema_path)?;

    // jsonschema 0.17 expects a schema with 'static lifetime; leak the parsed schema for CLI lifetime
    let schema_static: &'static Value = Box::leak(Box::new(schema_json));

    let compiled = JSONSchema::options()
        .compile(schema_static)
        .context("Failed to compile JSON Schema")?;

    let file = File::open(&args.path)
        .with_context(|| format!("Failed to open {}", args.path.display()))?;

    let mut lines = 0usize;
    let mut invalid = 0usize;
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        lines += 1;
        let line_no = idx + 1;

        let instance: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                invalid += 1;
                if invalid <= args.max_errors {
                    eprintln!("line {line_no}: not JSON: {e}");
                }
                continue;
            }
        };

        if let Err(errors) = compiled.validate(&instance) {
            invalid += 1;
            if invalid <= args.max_errors {
                for error in errors {
                    eprintln!("line {line_no}: {} at {}", error, error.instance_path);
                }
            }
        };
    }

    if invalid == 0 {
        println!("valid ({lines} lines)");
        Ok(())
    } else {
        eprintln!("invalid: {invalid} of {lines} lines");
        std::process::exit(1)
    }
}
