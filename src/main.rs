use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{error, info};

use clinical_notes::app::ProgressSink;
use clinical_notes::config::AppConfig;
use clinical_notes::domain::JoinStyle;
use clinical_notes::infra::{BarProgress, TracingProgress};
use clinical_notes::pipeline::{self, BulkLoader, ConvertOptions, SftConverter};
use clinical_notes::{extract_section, logging, metrics, summarize, NoteRecord, NoteStore};

#[derive(Parser)]
#[command(name = "clinical_notes")]
#[command(about = "Clinical notes utilities: load, query, extract sections, convert to SFT JSONL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a notes CSV (optionally .gz) into the SQLite store, replacing its contents
    Load {
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        db: Option<PathBuf>,
        /// Rows per committed batch
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Print one note by id
    Get {
        id: String,
        #[arg(long)]
        db: Option<PathBuf>,
        /// Print the extracted headline sections instead of the raw record
        #[arg(long)]
        sections: bool,
    },
    /// Print a page of notes
    Page {
        #[arg(long, default_value_t = 100)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Substring search over input and target
    Search {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Stream every note as JSON lines (to --out or stdout)
    Stream {
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Extract a labelled section from a stored note or a text file
    Extract {
        /// Section label, e.g. "Brief Hospital Course"
        #[arg(long)]
        label: String,
        /// Note id to read from the store
        #[arg(long, conflicts_with = "file")]
        id: Option<String>,
        /// Plain-text file holding a full note
        #[arg(long)]
        file: Option<PathBuf>,
        /// Stored field to search when using --id: input or target
        #[arg(long, default_value = "input")]
        field: String,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print headline sections for the first N stored notes
    Summary {
        #[arg(long, default_value_t = 5)]
        limit: usize,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Convert a notes CSV into SFT JSONL
    Convert {
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
        /// If >0, write only the first N examples
        #[arg(long, default_value_t = 0)]
        limit: usize,
        /// How to build the `text` field: plain or chatml
        #[arg(long)]
        join_style: Option<String>,
    },
    /// Print a structural overview of a CSV
    Explore {
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Column holding the note text
        #[arg(long, default_value = "input")]
        text_column: String,
        #[arg(long)]
        sample_size: Option<usize>,
    },
}

fn progress_sink() -> Box<dyn ProgressSink> {
    if io::stderr().is_terminal() {
        Box::new(BarProgress::new())
    } else {
        Box::new(TracingProgress::default())
    }
}

fn open_store(db: Option<PathBuf>, config: &AppConfig) -> Result<NoteStore> {
    let path = db.unwrap_or_else(|| config.db_path.clone());
    NoteStore::open_existing(&path)
        .with_context(|| format!("Failed to open note store {}", path.display()))
}

fn print_json_lines<'a, I>(notes: I) -> Result<()>
where
    I: IntoIterator<Item = &'a NoteRecord>,
{
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for note in notes {
        serde_json::to_writer(&mut out, note)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn run(command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Load { csv, db, batch_size } => {
            let csv = csv.unwrap_or_else(|| config.csv_path.clone());
            let db = db.unwrap_or_else(|| config.db_path.clone());
            let mut store = NoteStore::open_for_load(&db)
                .with_context(|| format!("Failed to open note store {}", db.display()))?;
            let loader = BulkLoader::new(batch_size.unwrap_or(config.batch_size));
            let mut progress = progress_sink();
            let report = loader
                .load(&csv, &mut store, progress.as_mut())
                .with_context(|| format!("Failed to load {}", csv.display()))?;
            println!(
                "Loaded {} rows in {} batches into {}",
                report.rows,
                report.batches,
                db.display()
            );
        }
        Commands::Get { id, db, sections } => {
            let store = open_store(db, config)?;
            match store.get_by_id(&id)? {
                Some(note) if sections => {
                    println!("{}", serde_json::to_string_pretty(&summarize(&note.note_id, &note.input))?);
                }
                Some(note) => print_json_lines([&note])?,
                None => {
                    eprintln!("Note {id} not found");
                    std::process::exit(1);
                }
            }
        }
        Commands::Page { limit, offset, db } => {
            let store = open_store(db, config)?;
            print_json_lines(&store.get_page(limit, offset)?)?;
        }
        Commands::Search { query, limit, db } => {
            let store = open_store(db, config)?;
            print_json_lines(&store.search(&query, limit)?)?;
        }
        Commands::Stream {
            db,
            chunk_size,
            out,
        } => {
            let store = open_store(db, config)?;
            let chunk_size = chunk_size.unwrap_or(config.stream_chunk_size);
            let sink: Box<dyn Write> = match &out {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    Box::new(std::fs::File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?)
                }
                None => Box::new(io::stdout().lock()),
            };
            let mut writer = BufWriter::new(sink);
            let mut streamed = 0u64;
            for note in store.stream_all(chunk_size) {
                serde_json::to_writer(&mut writer, &note?)?;
                writer.write_all(b"\n")?;
                streamed += 1;
            }
            writer.flush()?;
            info!(notes = streamed, "stream complete");
        }
        Commands::Extract {
            label,
            id,
            file,
            field,
            db,
        } => {
            let text = match (id, file) {
                (Some(id), _) => {
                    let store = open_store(db, config)?;
                    let note = store
                        .get_by_id(&id)?
                        .with_context(|| format!("Note {id} not found"))?;
                    match field.as_str() {
                        "input" => note.input,
                        "target" => note.target,
                        other => anyhow::bail!("Unknown field '{other}' (expected input or target)"),
                    }
                }
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("Pass either --id or --file"),
            };
            match extract_section(&text, &label) {
                Some(body) => println!("{body}"),
                None => {
                    eprintln!("Section '{label}' not found");
                    std::process::exit(1);
                }
            }
        }
        Commands::Summary { limit, db } => {
            let store = open_store(db, config)?;
            for note in store.get_page(limit, 0)? {
                let summary = summarize(&note.note_id, &note.input);
                println!("{}", serde_json::to_string(&summary)?);
            }
        }
        Commands::Convert {
            csv,
            out,
            limit,
            join_style,
        } => {
            let csv = csv.unwrap_or_else(|| config.csv_path.clone());
            let out = out.unwrap_or_else(|| config.out_path.clone());
            let join_style = match join_style {
                Some(style) => JoinStyle::from_str(&style)?,
                None => config.join_style()?,
            };
            let converter = SftConverter::new(ConvertOptions {
                limit: (limit > 0).then_some(limit),
                join_style,
                source_tag: config.source_tag.clone(),
            });
            let mut progress = progress_sink();
            let written = converter
                .convert(&csv, &out, progress.as_mut())
                .with_context(|| format!("Failed to convert {}", csv.display()))?;
            println!("Wrote {} examples to {}", written, out.display());
        }
        Commands::Explore {
            csv,
            text_column,
            sample_size,
        } => {
            let csv = csv.unwrap_or_else(|| config.csv_path.clone());
            let profile = pipeline::explore(
                &csv,
                &text_column,
                sample_size.unwrap_or(config.explore_sample_size),
            )?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.log_dir);

    let metrics_file = std::env::var("CLINICAL_NOTES_METRICS_FILE").ok().map(PathBuf::from);
    if metrics_file.is_some() {
        metrics::init_metrics();
    }

    let result = run(cli.command, &config);
    if let Err(e) = &result {
        error!("{:#}", e);
    }

    if let Some(path) = metrics_file {
        metrics::write_snapshot(&path)
            .with_context(|| format!("Failed to write metrics snapshot {}", path.display()))?;
    }
    result
}
