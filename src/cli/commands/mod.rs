//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod import;
mod init;
mod prospects;
mod serve;
mod tag;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "prospects")]
#[command(about = "Prospect listing and enrichment queueing service")]
#[command(version)]
pub struct Cli {
    /// Data directory or database file (overrides config file).
    #[arg(long, short = 'd', global = true)]
    data: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the JSON API server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: from HOST/PORT or 127.0.0.1:4000)
        bind: Option<String>,
    },

    /// List one page of prospects
    Ls {
        /// Records per page (1-200)
        #[arg(short = 'n', long, default_value = "50", value_parser = clap::value_parser!(u64).range(1..=200))]
        page_size: u64,
        /// Resume after this prospect id (from a previous page)
        #[arg(long)]
        page_token: Option<String>,
        /// Comma-separated list tags (any of, at most 10)
        #[arg(long)]
        list_ids: Option<String>,
        /// Comma-separated priority buckets
        #[arg(long)]
        priorities: Option<String>,
        /// Comma-separated enrichment statuses
        #[arg(long)]
        statuses: Option<String>,
        /// Case-insensitive search over name, organization and role title
        #[arg(short, long)]
        search: Option<String>,
        /// Output the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show list tags in use
    ListOptions,

    /// Queue prospects for enrichment under a new run
    Enqueue {
        /// Prospect ids
        #[arg(required = true)]
        prospect_ids: Vec<String>,
        /// List tag to add (defaults to DEFAULT_QUEUE_LIST_ID)
        #[arg(short, long)]
        list_tag: Option<String>,
        /// Run metadata as a JSON object
        #[arg(short, long)]
        metadata: Option<String>,
    },

    /// Mark prospects ready for outreach
    TagReady {
        /// Prospect ids
        #[arg(required = true)]
        prospect_ids: Vec<String>,
        /// List tag to add (defaults to OUTREACH_READY_LIST_ID or "outreach_ready")
        #[arg(short, long)]
        list_tag: Option<String>,
    },

    /// Import prospect documents from a JSON array or JSON lines file
    Import {
        /// File to import
        file: PathBuf,
    },

    /// Show an enrichment run
    Run {
        /// Run id
        run_id: String,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data: cli.data,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Serve { bind } => serve::cmd_serve(&settings, bind.as_deref()).await,
        Commands::Ls {
            page_size,
            page_token,
            list_ids,
            priorities,
            statuses,
            search,
            json,
        } => {
            let args = prospects::LsArgs {
                page_size: page_size as usize,
                page_token,
                list_ids,
                priorities,
                statuses,
                search,
                json,
            };
            prospects::cmd_ls(&settings, args).await
        }
        Commands::ListOptions => prospects::cmd_list_options(&settings).await,
        Commands::Enqueue {
            prospect_ids,
            list_tag,
            metadata,
        } => tag::cmd_enqueue(&settings, &prospect_ids, list_tag.as_deref(), metadata.as_deref()).await,
        Commands::TagReady {
            prospect_ids,
            list_tag,
        } => tag::cmd_tag_ready(&settings, &prospect_ids, list_tag.as_deref()).await,
        Commands::Import { file } => import::cmd_import(&settings, &file).await,
        Commands::Run { run_id } => tag::cmd_show_run(&settings, &run_id).await,
    }
}
