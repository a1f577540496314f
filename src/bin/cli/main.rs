mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use resume_rag::rag::{IndexProvider, MemoryIndexProvider};

#[derive(Parser)]
#[command(name = "resume-rag", about = "Ask questions about a resume", version)]
struct Cli {
    /// Config file (default: <config dir>/resume-rag/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Resume text file, overriding the config
    #[arg(long, global = true)]
    document: Option<PathBuf>,

    /// Collection name, overriding the config
    #[arg(long, global = true)]
    collection: Option<String>,

    /// Keep the index in memory for this run only
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a single question
    Ask {
        /// Question about the resume
        question: String,
        /// Also print the retrieved passages
        #[arg(long)]
        show_context: bool,
    },

    /// Interactive chat (default)
    Chat,

    /// Build the index if it is missing
    Index {
        /// Clear the collection and re-ingest the document
        #[arg(long)]
        rebuild: bool,
    },

    /// Show collection statistics
    Stats,

    /// Print the chunks the document splits into
    Chunks,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();

    let app = app::App::new(
        cli.config.as_deref(),
        cli.document.clone(),
        cli.collection.clone(),
    )?;
    let command = cli.command.unwrap_or(Command::Chat);

    if let Command::Chunks = command {
        // No provider or store involved
        return commands::chunks::run(&app, &cli.format, use_color);
    }

    if cli.ephemeral {
        let provider = MemoryIndexProvider::new(app.config.retrieval.batch_size);
        run_command(&app, &provider, command, &cli.format, use_color)
    } else {
        let provider = app.open_store()?;
        run_command(&app, &provider, command, &cli.format, use_color)
    }
}

fn run_command<P: IndexProvider>(
    app: &app::App,
    provider: &P,
    command: Command,
    format: &OutputFormat,
    use_color: bool,
) -> anyhow::Result<()> {
    match command {
        Command::Ask { question, show_context } => {
            let session = app.open_session(provider)?;
            commands::ask::run(&session, &question, show_context, format, use_color)
        }
        Command::Chat => {
            let session = app.open_session(provider)?;
            commands::chat::run(&session, use_color)
        }
        Command::Index { rebuild } => commands::index::run(app, provider, rebuild, format),
        Command::Stats => commands::stats::run(app, provider, format, use_color),
        Command::Chunks => commands::chunks::run(app, format, use_color),
    }
}

