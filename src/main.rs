//! # Dailydays Photos CLI (`photos`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `photos generate` | Generate photos for items that don't have one yet |
//! | `photos prompts` | Print the prompts `generate` would send |
//! | `photos serve [PORT]` | Serve the working directory over HTTP |
//!
//! Running `photos` with no command behaves like `photos generate` and
//! accepts the same flags (`photos --dry-run --room kitchen`). Top-level
//! flags cannot be combined with a command.
//!
//! Usage errors exit with status 64, apart from the data and credential
//! failures (2 to 5).
//!
//! ## Examples
//!
//! ```bash
//! # Preview prompts for one room
//! photos generate --dry-run --room kitchen
//!
//! # 25 items spread across rooms and categories
//! photos generate --sample 25
//!
//! # Regenerate specific items, even if already done
//! photos generate --ids obj-001,obj-005
//! ```
//!
//! Live generation needs `OPENAI_API_KEY` in the environment.

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use dailydays_photos::config::{self, Config};
use dailydays_photos::error::{exit_code_for, USAGE_EXIT_CODE};
use dailydays_photos::generate::{self, GenerateOptions};
use dailydays_photos::select::{parse_id_list, Selection};
use dailydays_photos::server;

/// Dailydays Photos: illustrative item photos for the household
/// inventory prototypes.
#[derive(Parser)]
#[command(
    name = "photos",
    about = "Generate DALL-E photos for household inventory items",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Optional: every setting has a default, and a missing file is not
    /// an error.
    #[arg(long, global = true, default_value = "./photos.toml")]
    config: PathBuf,

    #[command(flatten)]
    filters: FilterArgs,

    /// Print prompts without calling the API.
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    /// Parse arguments, rejecting top-level generate flags next to a command.
    fn try_parse_args() -> Result<Self, clap::Error> {
        let cli = Self::try_parse()?;
        if cli.command.is_some() && (cli.dry_run || cli.filters.is_set()) {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                "generate flags go after the command, e.g. `photos generate --dry-run`",
            ));
        }
        Ok(cli)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate photos for inventory items.
    ///
    /// Items that already appear in the manifest are skipped unless named
    /// explicitly with `--ids`.
    Generate {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print prompts without calling the API.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print prompts for the selected items (same as `generate --dry-run`).
    Prompts {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Serve the working directory over HTTP for local development.
    Serve {
        /// Port to listen on (defaults to `[server].port`, 8766).
        port: Option<u16>,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Generate N diverse items spread across rooms and categories.
    #[arg(long, default_value_t = 0)]
    sample: usize,

    /// Filter by room (e.g., kitchen).
    #[arg(long)]
    room: Option<String>,

    /// Filter by category (e.g., clothing).
    #[arg(long)]
    category: Option<String>,

    /// Comma-separated item IDs (e.g., obj-001,obj-005).
    #[arg(long)]
    ids: Option<String>,
}

impl FilterArgs {
    fn is_set(&self) -> bool {
        self.sample != 0 || self.room.is_some() || self.category.is_some() || self.ids.is_some()
    }

    fn into_selection(self) -> Selection {
        Selection {
            room: self.room,
            category: self.category,
            ids: self.ids.map(|raw| parse_id_list(&raw)).filter(|ids| !ids.is_empty()),
            sample: self.sample,
        }
    }
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse_args() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(USAGE_EXIT_CODE);
        }
    };

    if let Err(err) = run(cli).await {
        eprintln!("\nError: {:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg: Config = config::load_config(&cli.config)?;

    let command = cli.command.unwrap_or(Commands::Generate {
        filters: cli.filters,
        dry_run: cli.dry_run,
    });

    match command {
        Commands::Generate { filters, dry_run } => {
            let opts = GenerateOptions {
                selection: filters.into_selection(),
                dry_run,
            };
            generate::run_generate(&cfg, &opts).await?;
        }
        Commands::Prompts { filters } => {
            let opts = GenerateOptions {
                selection: filters.into_selection(),
                dry_run: true,
            };
            generate::run_generate(&cfg, &opts).await?;
        }
        Commands::Serve { port } => {
            server::run_server(&cfg.server, port).await?;
        }
    }

    Ok(())
}
