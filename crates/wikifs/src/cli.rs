//! Clap derive structures for the `wikifs` CLI.
//!
//! Also compiled by `build.rs` for man pages, so it may only depend on
//! clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wikifs -- MediaWiki articles as files
#[derive(Debug, Parser)]
#[command(
    name = "wikifs",
    version,
    about = "Read and edit wiki articles as files",
    long_about = "Browse, read and save MediaWiki articles through a virtual file tree.\n\n\
        Every configured wiki is a directory under `/`, every article a\n\
        `<Title>.mw` file inside it. Directories named `<family>-<lang>`\n\
        (e.g. `/wikipedia-de`) resolve to public Wikimedia wikis without\n\
        any configuration.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file to use instead of the platform default
    #[arg(long, env = "WIKIFS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "WIKIFS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List mounted wikis
    Sites,

    /// List a directory
    Ls {
        /// Directory path, e.g. `/` or `/wikipedia-en/Project`
        #[arg(default_value = "/")]
        path: String,
    },

    /// Print an article's wikitext
    Cat {
        /// Article path, e.g. `/wikipedia-en/Paris.mw`
        path: String,
    },

    /// Show file attributes
    Stat {
        /// File or directory path
        path: String,
    },

    /// Save new wikitext to an article
    ///
    /// A first line of the form `[[Summary: ...]]` becomes the edit summary.
    Put {
        /// Article path, e.g. `/wikipedia-en/Sandbox.mw`
        path: String,

        /// Read the text from this file instead of stdin
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },

    /// Create a family wiki or sub-page directory
    Mkdir {
        /// Directory path, e.g. `/wiktionary-fr` or `/mysite/Project`
        path: String,
    },

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a config file (guided when run in a terminal)
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration, secrets masked
    Show,

    /// Print the config file path
    Path,

    /// Store a site's wiki password in the system keyring
    SetPassword {
        /// Site name as configured under `[sites]`
        site: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
