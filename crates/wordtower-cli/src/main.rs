//! wordtower CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::play::PlayArgs;
use wordtower_core::engine::QuizMode;
use commands::GlobalOpts;

#[derive(Parser)]
#[command(
    name = "wordtower",
    version,
    about = "Vocabulary tower quiz over a word graph"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use a file graph store at this path
    #[arg(long, global = true)]
    graph: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build word lists into the graph store
    Import {
        /// Word list file (.toml / .json) or directory
        #[arg(long)]
        words: PathBuf,
    },

    /// Check word lists without writing anything
    Validate {
        /// Word list file (.toml / .json) or directory
        #[arg(long)]
        words: PathBuf,
    },

    /// Show word counts per grade and root coverage
    Stats,

    /// List root families, or the members of one
    Families {
        /// Root tag to show
        #[arg(long)]
        root: Option<String>,
    },

    /// Climb the tower, starting at a floor
    Play {
        /// First floor (grade tier)
        #[arg(long, default_value = "1")]
        floor: u8,

        /// Number of floors to climb
        #[arg(long, default_value = "1")]
        floors: u8,

        /// Question kind: choice or spell
        #[arg(long)]
        mode: Option<QuizMode>,

        /// RNG seed for a reproducible session
        #[arg(long)]
        seed: Option<u64>,

        /// Mistake log path
        #[arg(long)]
        mistakes: Option<PathBuf>,

        /// Write the session summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// List words from the mistake book
    Review {
        /// Include mastered words
        #[arg(long)]
        all: bool,

        /// Mark a word as mastered
        #[arg(long)]
        master: Option<String>,

        /// Mistake log path
        #[arg(long)]
        mistakes: Option<PathBuf>,
    },

    /// Delete a word from the graph and the mistake book
    Remove {
        /// Word to delete
        #[arg(long)]
        word: String,

        /// Mistake log path
        #[arg(long)]
        mistakes: Option<PathBuf>,
    },

    /// Create starter config and a sample word list
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wordtower=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let opts = GlobalOpts {
        config: cli.config,
        graph: cli.graph,
    };

    let result = match cli.command {
        Commands::Import { words } => commands::import::execute(&opts, words).await,
        Commands::Validate { words } => commands::validate::execute(&opts, words),
        Commands::Stats => commands::stats::execute(&opts).await,
        Commands::Families { root } => commands::families::execute(&opts, root).await,
        Commands::Play {
            floor,
            floors,
            mode,
            seed,
            mistakes,
            summary,
        } => {
            commands::play::execute(
                &opts,
                PlayArgs {
                    floor,
                    floors,
                    mode,
                    seed,
                    mistakes,
                    summary,
                },
            )
            .await
        }
        Commands::Review {
            all,
            master,
            mistakes,
        } => commands::review::execute(&opts, all, master, mistakes),
        Commands::Remove { word, mistakes } => {
            commands::remove::execute(&opts, word, mistakes).await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
