use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "snapnote")]
#[command(about = "Capture notes and screenshots, export them as Markdown, DOCX or ZIP")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Quick capture: snapnote "my thought here"
    #[arg(trailing_var_arg = true)]
    pub note: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note body
        body: Vec<String>,
        /// Note title
        #[arg(short, long)]
        title: Option<String>,
        /// Category ID (defaults to the configured category)
        #[arg(short, long)]
        category: Option<String>,
        /// Attach an image file (repeatable)
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    /// List recent notes
    List {
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Only show notes in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search note titles and bodies
    Search {
        /// Search query
        query: String,
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a note as Markdown
    Show {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Delete a note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Export notes
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,
        /// Export only these notes (ID or unique prefix, repeatable)
        #[arg(long = "id", value_name = "ID")]
        ids: Vec<String>,
        /// Output path (text formats print to stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import a JSON backup
    Import {
        /// Backup file to read
        path: PathBuf,
        /// Clear existing notes and categories first
        #[arg(long)]
        replace: bool,
    },
    /// Show or update CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Markdown,
    Docx,
    Zip,
    DocxZip,
    Json,
}

impl From<ExportFormat> for snapnote_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Markdown => Self::Markdown,
            ExportFormat::Docx => Self::Docx,
            ExportFormat::Zip => Self::Zip,
            ExportFormat::DocxZip => Self::DocxZip,
            ExportFormat::Json => Self::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a category
    Add {
        /// Display label
        label: String,
    },
    /// Change a category's label
    Rename {
        /// Category ID
        id: String,
        /// New display label
        label: String,
    },
    /// Delete a category
    Delete {
        /// Category ID
        id: String,
        /// Move notes still in the category to the first remaining one
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the config file location and contents
    Show,
    /// Update config values
    Set {
        /// Database file used when no --db-path or SNAPNOTE_DB_PATH is given
        #[arg(long, value_name = "PATH")]
        db_path: Option<PathBuf>,
        /// Directory binary exports are written to
        #[arg(long, value_name = "PATH")]
        export_dir: Option<PathBuf>,
        /// Category new notes land in
        #[arg(long, value_name = "ID")]
        default_category: Option<String>,
    },
}
