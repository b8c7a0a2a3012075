//! Shelf CLI
//!
//! Command-line interface for Shelf - personal book tracking.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shelf_core::library::{AnnotationKind, AnnotationSort, BookSort};
use shelf_core::{Config, Library, ReadingStatus};

mod commands;
mod output;
mod prompt;

use commands::book::BookFields;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "Shelf - Personal book tracking with catalog lookup")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a book
    Add {
        /// Title (optional with --lookup)
        title: Option<String>,
        #[command(flatten)]
        fields: BookFields,
        /// Prefill from the catalog by ISBN or barcode
        #[arg(short, long)]
        lookup: Option<String>,
        /// Tags to add
        #[arg(short, long)]
        tag: Vec<String>,
        /// Don't download a cover
        #[arg(long)]
        no_cover: bool,
    },
    /// List books
    #[command(alias = "ls")]
    List {
        /// Match title or author
        #[arg(short, long)]
        search: Option<String>,
        /// Filter by reading status (to-read, reading, finished)
        #[arg(long)]
        status: Option<ReadingStatus>,
        /// Filter by tag (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,
        /// Match any of the tags instead of all
        #[arg(long)]
        any: bool,
        /// date-desc, date-asc, rating-desc or rating-asc
        #[arg(long, default_value = "date-desc")]
        sort: BookSort,
        /// Show one page of the collection, newest first
        #[arg(short, long, conflicts_with_all = ["search", "status", "tag"])]
        page: Option<usize>,
    },
    /// Show book details
    Show {
        /// Book ID (full UUID or prefix)
        id: String,
    },
    /// Edit a book
    Edit {
        /// Book ID (full UUID or prefix)
        id: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        #[command(flatten)]
        fields: BookFields,
    },
    /// Delete a book with its review and annotations
    #[command(alias = "rm")]
    Delete {
        /// Book ID (full UUID or prefix)
        id: String,
    },
    /// Set the reading status
    Status {
        /// Book ID (full UUID or prefix)
        id: String,
        /// to-read, reading or finished
        status: ReadingStatus,
    },
    /// Set or clear the bookmark
    Bookmark {
        /// Book ID (full UUID or prefix)
        id: String,
        /// Page number; omit to clear
        page: Option<String>,
    },
    /// Manage tags on a book
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// List all tags
    Tags,
    /// Rate a book (1 to 10)
    Review {
        /// Book ID (full UUID or prefix)
        id: String,
        rating: u8,
        /// Review text
        #[arg(short, long)]
        comment: Option<String>,
    },
    /// Manage annotations
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Search the catalog
    Search {
        /// Title, author or keywords; omit to search as you type
        query: Option<String>,
    },
    /// Look up scanned barcodes read from stdin
    Scan {
        /// Add each match to the library
        #[arg(long)]
        save: bool,
    },
    /// Export the library
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Render a view by path
    Open {
        /// Path such as /home or /book?id=<uuid>
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// Tag a book
    Add {
        /// Book ID (full UUID or prefix)
        id: String,
        tag: String,
    },
    /// Untag a book
    #[command(alias = "rm")]
    Remove {
        /// Book ID (full UUID or prefix)
        id: String,
        tag: String,
    },
}

#[derive(Subcommand)]
enum NoteCommands {
    /// Annotate a book
    Add {
        /// Book ID (full UUID or prefix)
        book_id: String,
        /// Annotation text (opens editor if not provided)
        #[arg(short, long)]
        text: Option<String>,
        /// Quoted passage
        #[arg(long)]
        quote: Option<String>,
        #[arg(short, long)]
        page: Option<u32>,
        /// Image file
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// List annotations
    #[command(alias = "ls")]
    List {
        /// Only annotations of this book
        #[arg(short, long)]
        book: Option<String>,
        /// Match text or quote
        #[arg(short, long)]
        search: Option<String>,
        /// all, has-image or has-quote
        #[arg(long, default_value = "all")]
        kind: AnnotationKind,
        /// date-desc, date-asc or page-asc
        #[arg(long, default_value = "date-desc")]
        sort: AnnotationSort,
    },
    /// Edit an annotation
    Edit {
        id: i64,
        #[arg(short, long)]
        text: Option<String>,
        #[arg(long)]
        quote: Option<String>,
        #[arg(short, long)]
        page: Option<u32>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Delete an annotation
    #[command(alias = "rm")]
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ExportCommands {
    /// One JSON document, images base64-encoded
    Json { path: PathBuf },
    /// One CSV sheet per collection
    Sheets { dir: PathBuf },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, catalog_url, views_dir, base_path, search_debounce_ms, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Commands that don't need the library
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(&output),
            Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, &output),
        };
    }

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config);

    let mut library = Library::open(&config).context("Failed to open library")?;

    match cli.command {
        Commands::Add {
            title,
            fields,
            lookup,
            tag,
            no_cover,
        } => {
            commands::book::add(
                &mut library,
                &config,
                title,
                fields,
                lookup,
                tag,
                no_cover,
                &output,
            )
            .await
        }
        Commands::List {
            search,
            status,
            tag,
            any,
            sort,
            page,
        } => commands::book::list(&mut library, search, status, tag, any, sort, page, &output),
        Commands::Show { id } => commands::book::show(&mut library, id, &output),
        Commands::Edit { id, title, fields } => {
            commands::book::edit(&mut library, id, title, fields, &output)
        }
        Commands::Delete { id } => commands::book::delete(&mut library, id, &output),
        Commands::Status { id, status } => {
            commands::book::status(&mut library, id, status, &output)
        }
        Commands::Bookmark { id, page } => {
            commands::book::bookmark(&mut library, id, page, &output)
        }
        Commands::Tag { command } => handle_tag_command(command, &mut library, &output),
        Commands::Tags => commands::tag::list(&mut library, &output),
        Commands::Review {
            id,
            rating,
            comment,
        } => commands::review::set(&mut library, id, rating, comment, &output),
        Commands::Note { command } => handle_note_command(command, &mut library, &output),
        Commands::Search { query: Some(query) } => {
            commands::search::search(&config, query, &output).await
        }
        Commands::Search { query: None } => commands::search::live(&config, &output).await,
        Commands::Scan { save } => commands::scan::run(&mut library, &config, save, &output).await,
        Commands::Export { command } => match command {
            ExportCommands::Json { path } => commands::export::json(&mut library, path, &output),
            ExportCommands::Sheets { dir } => commands::export::sheets(&mut library, dir, &output),
        },
        Commands::Open { path } => commands::open::open(library, &config, path, &output).await,
        Commands::Config { .. } => Ok(()), // Handled above
    }
}

fn handle_tag_command(command: TagCommands, library: &mut Library, output: &Output) -> Result<()> {
    match command {
        TagCommands::Add { id, tag } => commands::tag::add(library, id, tag, output),
        TagCommands::Remove { id, tag } => commands::tag::remove(library, id, tag, output),
    }
}

fn handle_note_command(command: NoteCommands, library: &mut Library, output: &Output) -> Result<()> {
    match command {
        NoteCommands::Add {
            book_id,
            text,
            quote,
            page,
            image,
        } => commands::note::add(library, book_id, text, quote, page, image, output),
        NoteCommands::List {
            book,
            search,
            kind,
            sort,
        } => commands::note::list(library, book, search, kind, sort, output),
        NoteCommands::Edit {
            id,
            text,
            quote,
            page,
            image,
        } => commands::note::edit(library, id, text, quote, page, image, output),
        NoteCommands::Delete { id } => commands::note::delete(library, id, output),
    }
}

/// Initialize logging
///
/// Only initializes if SHELF_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/debug.log).
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("SHELF_LOG") else {
        return;
    };

    let log_path = config
        .log_file
        .clone()
        .unwrap_or_else(|| config.data_dir.join("debug.log"));

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!("shelf_core={},shelf={}", log_level, log_level));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}
