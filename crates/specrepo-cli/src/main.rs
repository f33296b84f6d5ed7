//! specrepo CLI - manage, update and search spec repositories

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;

use commands::GlobalOptions;
use error::Result;

#[derive(Parser)]
#[command(name = "specrepo")]
#[command(author = "specrepo Contributors")]
#[command(version)]
#[command(about = "Manage, update and search package specification repositories", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Settings file (default: <config dir>/specrepo/config.yaml)
    #[arg(long, global = true, env = "SPECREPO_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the spec repositories
    #[arg(long, global = true, env = "SPECREPO_REPOS_DIR")]
    repos_dir: Option<PathBuf>,

    /// Search index cache file
    #[arg(long, global = true, env = "SPECREPO_SEARCH_INDEX")]
    search_index: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage spec repositories
    Repo {
        #[command(subcommand)]
        command: RepoCommands,
    },

    /// Search packages across all spec repositories
    Search {
        /// Name fragment, or text/regular expression with --full-text
        query: String,

        /// Also match summaries and descriptions
        #[arg(long)]
        full_text: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show every known version of a package
    Info {
        /// Exact package name
        name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RepoCommands {
    /// List spec repositories
    List,

    /// Fetch and fast-forward spec repositories
    Update {
        /// Repository to update (default: every git repository)
        name: Option<String>,

        /// Show progress for each repository
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check repositories against the running specrepo version
    LintVersion {
        /// Repository to check (default: all)
        name: Option<String>,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let options = GlobalOptions {
        config: cli.config,
        repos_dir: cli.repos_dir,
        search_index: cli.search_index,
    };

    match cli.command {
        Commands::Repo { command } => match command {
            RepoCommands::List => commands::repo::list(&options),
            RepoCommands::Update { name, verbose } => {
                commands::repo::update(&options, name.as_deref(), verbose)
            }
            RepoCommands::LintVersion { name } => {
                commands::repo::lint_version(&options, name.as_deref())
            }
        },

        Commands::Search {
            query,
            full_text,
            json,
        } => commands::search::run(&options, &query, full_text, json),

        Commands::Info { name, json } => commands::info::run(&options, &name, json),
    }
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
