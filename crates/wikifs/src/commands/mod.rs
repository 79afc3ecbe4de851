//! Command dispatch: bridges CLI args -> adapter calls -> output formatting.

pub mod config_cmd;
pub mod files;
pub mod sites;

use std::path::PathBuf;

use wikifs_core::WikiFs;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// `--config` / `WIKIFS_CONFIG`, else the platform config path.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(wikifs_config::config_path)
}

/// Dispatch a filesystem-bound command to its handler.
pub async fn dispatch(cmd: Command, fs: &WikiFs, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Sites => {
            sites::handle(fs, global);
            Ok(())
        }
        Command::Ls { path } => files::ls(fs, &path, global).await,
        Command::Cat { path } => files::cat(fs, &path).await,
        Command::Stat { path } => files::stat(fs, &path, global).await,
        Command::Put { path, file } => files::put(fs, &path, file.as_deref(), global).await,
        Command::Mkdir { path } => files::mkdir(fs, &path, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
