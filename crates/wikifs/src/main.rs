mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wikifs_config::Config;
use wikifs_core::WikiFs;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, debug: bool) {
    let filter = match verbosity {
        0 if debug => "debug",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries article text, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let path = commands::config_file(&cli.global);
    let loaded = wikifs_config::load_config_from(&path);
    init_tracing(
        cli.global.verbose,
        loaded.as_ref().is_ok_and(|cfg| cfg.general.debug),
    );

    match cli.command {
        // Config commands work even when the file is broken
        Command::Config(args) => commands::config_cmd::handle(args, &path, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "wikifs", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let fs = mount(&loaded?)?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &fs, &cli.global).await
        }
    }
}

/// Build the file tree from every configured site.
fn mount(cfg: &Config) -> Result<WikiFs, CliError> {
    let ctx = wikifs_config::build_context(cfg);
    let sites = wikifs_config::load_sites(cfg, &ctx)?;
    Ok(WikiFs::new(ctx, sites)?)
}
