//! # FAQ Harness CLI (`faq`)
//!
//! Builds a keyword knowledge base from remote and local CSV sources plus
//! admin edits, and answers lookups from the command line or over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! faq --config ./config/faq.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `faq sources` | List configured sources in merge order |
//! | `faq rebuild` | Rebuild and print the per-source report |
//! | `faq lookup <key>` | Print the description for a keyword |
//! | `faq search <fragment>` | Case-insensitive substring search |
//! | `faq suggest <text>` | Closest keywords by edit distance |
//! | `faq topics` / `faq keywords <topic>` | Browse by topic |
//! | `faq export` | Dump the knowledge base as JSON |
//! | `faq admin ...` | Manage admin edits (requires `--token`) |
//! | `faq pin` / `unpin` / `pins` | Per-user pinned keywords |
//! | `faq theme <user>` | Show or toggle the dark-mode preference |
//! | `faq serve` | Start the HTTP API |
//! | `faq completions <shell>` | Print shell completions |

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use faq_harness::admin::{AdminEditStore, AdminEditor, CsvAdminEditStore};
use faq_harness::config::{self, Config};
use faq_harness::models::KeywordEntry;
use faq_harness::pins::{JsonPinStore, PinStore};
use faq_harness::prefs::PreferenceStore;
use faq_harness::{export, ingest, search, server, sources};

/// FAQ Harness CLI: a keyword knowledge base for call-center FAQ widgets.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/faq.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "faq",
    about = "FAQ Harness: keyword knowledge base built from CSV sources",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/faq.toml`. When the file does not exist the
    /// built-in defaults are used (no sources).
    #[arg(long, global = true, default_value = "./config/faq.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured sources and their status, in merge order.
    Sources,

    /// Rebuild the knowledge base and print the per-source report.
    Rebuild,

    /// Print the description for a keyword (exact, then case-insensitive).
    Lookup { key: String },

    /// List entries whose keyword contains the fragment, case-insensitively.
    ///
    /// An empty fragment lists every entry.
    Search {
        #[arg(default_value = "")]
        fragment: String,

        /// Restrict results to these topics (repeatable).
        #[arg(long = "topic")]
        topics: Vec<String>,
    },

    /// Suggest keywords close to the given text.
    Suggest {
        text: String,

        /// Maximum number of suggestions (defaults to `[lookup].suggest_limit`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List topics in first-appearance order.
    Topics,

    /// List the keywords of one topic.
    Keywords { topic: String },

    /// Export the knowledge base and rebuild report as JSON.
    Export {
        /// Output file. Writes to stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Manage admin edits.
    Admin {
        /// Admin token, compared against the variable named by `[admin].token_env`.
        #[arg(long, global = true)]
        token: Option<String>,

        #[command(subcommand)]
        action: AdminAction,
    },

    /// Pin a keyword for a user.
    Pin { user: String, key: String },

    /// Remove a pinned keyword.
    Unpin { user: String, key: String },

    /// Show a user's pinned keywords grouped by topic.
    Pins { user: String },

    /// Show a user's theme, or flip it with `--toggle`.
    Theme {
        user: String,
        #[arg(long)]
        toggle: bool,
    },

    /// Start the HTTP API on `[server].bind`.
    Serve,

    /// Print shell completions to stdout.
    Completions { shell: clap_complete::Shell },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List stored admin edits.
    List,

    /// Add an edit; an existing edit with the same key is replaced.
    Add {
        #[arg(long)]
        key: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        topic: String,
    },

    /// Replace the edit for KEY, optionally renaming it with `--new-key`.
    Update {
        key: String,
        #[arg(long)]
        new_key: Option<String>,
        #[arg(long)]
        description: String,
        #[arg(long)]
        topic: String,
    },

    /// Delete every edit whose key or topic equals TARGET.
    Delete { target: String },

    /// Move every edit from one topic to another.
    RenameTopic { old: String, new: String },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("faq_harness=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config not found, using defaults");
        Ok(Config::minimal())
    }
}

fn run_admin(cfg: &Config, token: Option<&str>, action: AdminAction) -> Result<()> {
    let store = CsvAdminEditStore::new(&cfg.store.admin_edits);
    let editor = AdminEditor::new(&store, cfg.admin.is_admin(token));

    match action {
        AdminAction::List => {
            if !cfg.admin.is_admin(token) {
                anyhow::bail!("admin access required");
            }
            let edits = store.load()?;
            if edits.is_empty() {
                println!("No admin edits.");
            }
            for e in edits {
                println!("{:<24} {:<16} {}", e.key, e.topic, e.description);
            }
        }
        AdminAction::Add {
            key,
            description,
            topic,
        } => {
            editor.add(KeywordEntry::new(key.clone(), description, topic))?;
            println!("Saved '{}'.", key);
        }
        AdminAction::Update {
            key,
            new_key,
            description,
            topic,
        } => {
            let target = new_key.unwrap_or_else(|| key.clone());
            editor.update(&key, KeywordEntry::new(target.clone(), description, topic))?;
            println!("Updated '{}'.", target);
        }
        AdminAction::Delete { target } => {
            let n = editor.delete(&target)?;
            println!("Deleted {} edit(s).", n);
        }
        AdminAction::RenameTopic { old, new } => {
            let n = editor.rename_topic(&old, &new)?;
            println!("Moved {} edit(s) from '{}' to '{}'.", n, old, new);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "faq", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = load(&cli.config)?;

    match cli.command {
        Commands::Sources => sources::list_sources(&cfg)?,
        Commands::Rebuild => ingest::run_rebuild(&cfg).await?,
        Commands::Lookup { key } => search::run_lookup(&cfg, &key).await?,
        Commands::Search { fragment, topics } => {
            search::run_search(&cfg, &fragment, &topics).await?
        }
        Commands::Suggest { text, limit } => search::run_suggest(&cfg, &text, limit).await?,
        Commands::Topics => search::run_topics(&cfg).await?,
        Commands::Keywords { topic } => search::run_keywords(&cfg, &topic).await?,
        Commands::Export { output } => export::run_export(&cfg, output.as_deref()).await?,
        Commands::Admin { token, action } => run_admin(&cfg, token.as_deref(), action)?,
        Commands::Pin { user, key } => {
            let pins = JsonPinStore::new(&cfg.store.pins).pin(&user, &key)?;
            println!("{} pinned: {}", user, pins.join(", "));
        }
        Commands::Unpin { user, key } => {
            let pins = JsonPinStore::new(&cfg.store.pins).unpin(&user, &key)?;
            println!("{} pinned: {}", user, pins.join(", "));
        }
        Commands::Pins { user } => search::run_pins(&cfg, &user).await?,
        Commands::Theme { user, toggle } => {
            let store = PreferenceStore::new(&cfg.store.preferences);
            let prefs = if toggle {
                store.toggle_theme(&user)?
            } else {
                store.get(&user)?
            };
            println!("{}", if prefs.dark_mode { "dark" } else { "light" });
        }
        Commands::Serve => server::run_server(&cfg).await?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
