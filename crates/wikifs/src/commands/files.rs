//! File tree commands: ls, cat, stat, put, mkdir.
//!
//! Each command drives the adapter through the same call sequence a
//! mounted filesystem would see, e.g. `put` is open → truncate → write →
//! release.

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tabled::Tabled;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use wikifs_core::names::{ancestors, is_temp_name, normalize};
use wikifs_core::{FileAttr, FileKind, FsError, WikiFs};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

const READ_CHUNK: usize = 64 * 1024;

// ── Display types ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Entry {
    name: String,
    kind: &'static str,
    size: u64,
    mode: String,
    modified: String,
}

impl Entry {
    fn new(name: String, attr: &FileAttr) -> Self {
        Self {
            name,
            kind: match attr.kind {
                FileKind::Directory => "directory",
                FileKind::RegularFile => "file",
            },
            size: attr.size,
            mode: format!("{:o}", attr.perm),
            modified: format_time(attr.mtime),
        }
    }

    fn is_dir(&self) -> bool {
        self.kind == "directory"
    }
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Size")]
    size: u64,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Modified")]
    modified: String,
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn child_path(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

// ── Path preparation ────────────────────────────────────────────────

/// Register the directories leading to `path`, and `path` itself when
/// `include_self` is set, so family wikis and sub-pages resolve without
/// a prior `mkdir`.
async fn ensure_dirs(fs: &WikiFs, path: &str, include_self: bool) -> Result<(), CliError> {
    let mut dirs: Vec<&str> = ancestors(path).filter(|d| *d != "/").collect();
    dirs.reverse();
    if include_self && path != "/" {
        dirs.push(path);
    }

    for dir in dirs {
        match fs.getattr(dir).await {
            Ok(attr) if attr.is_dir() => {}
            Ok(_) => return Err(CliError::NotADirectory { path: dir.into() }),
            Err(FsError::NotFound { .. }) => match fs.mkdir(dir) {
                Ok(()) | Err(FsError::AlreadyExists { .. }) => {}
                // Not a site, not a family wiki, not a usable sub-page name
                Err(FsError::PermissionDenied { .. }) => {
                    return Err(CliError::NotFound { path: dir.into() });
                }
                Err(e) => return Err(e.into()),
            },
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn read_all(fs: &WikiFs, path: &str) -> Result<Vec<u8>, FsError> {
    let mut data = Vec::new();
    loop {
        let offset = u64::try_from(data.len()).unwrap_or(u64::MAX);
        let chunk = fs.read(path, READ_CHUNK, offset).await?;
        if chunk.is_empty() {
            return Ok(data);
        }
        data.extend_from_slice(&chunk);
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn ls(fs: &WikiFs, path: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let path = normalize(path);
    ensure_dirs(fs, &path, true).await?;

    let mut entries = Vec::new();
    for name in fs.readdir(&path).await? {
        if name == "." || name == ".." {
            continue;
        }
        let attr = fs.getattr(&child_path(&path, &name)).await?;
        entries.push(Entry::new(name, &attr));
    }

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &entries,
        |e| EntryRow {
            name: if e.is_dir() {
                output::paint_dir(&e.name, color)
            } else {
                e.name.clone()
            },
            kind: e.kind.to_owned(),
            size: e.size,
            mode: e.mode.clone(),
            modified: e.modified.clone(),
        },
        |e| e.name.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn cat(fs: &WikiFs, path: &str) -> Result<(), CliError> {
    let path = normalize(path);
    ensure_dirs(fs, &path, false).await?;

    if fs.getattr(&path).await?.is_dir() {
        return Err(CliError::Validation {
            field: "path".into(),
            reason: format!("{path} is a directory"),
        });
    }

    fs.open(&path).await?;
    let data = read_all(fs, &path).await;
    fs.release(&path).await?;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&data?).await?;
    stdout.flush().await?;
    Ok(())
}

pub async fn stat(fs: &WikiFs, path: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let path = normalize(path);
    ensure_dirs(fs, &path, false).await?;

    let attr = fs.getattr(&path).await?;
    let entry = Entry::new(path, &attr);
    let out = output::render_single(
        &global.output,
        &entry,
        |e| {
            format!(
                "    Path: {}\n    Kind: {}\n    Size: {}\n    Mode: {}\nModified: {}",
                e.name, e.kind, e.size, e.mode, e.modified
            )
        },
        |e| e.name.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn put(
    fs: &WikiFs,
    path: &str,
    file: Option<&Path>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let path = normalize(path);
    if is_temp_name(&path) {
        return Err(CliError::Validation {
            field: "path".into(),
            reason: format!("{path} is an editor scratch name and is never saved"),
        });
    }

    let text = match file {
        Some(file) => tokio::fs::read(file).await?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            buf
        }
    };

    ensure_dirs(fs, &path, false).await?;
    fs.open(&path).await?;
    fs.truncate(&path, 0).await?;
    fs.write(&path, &text, 0)?;
    fs.release(&path).await?;

    if !global.quiet {
        eprintln!("Saved {path} ({} bytes)", text.len());
    }
    Ok(())
}

pub async fn mkdir(fs: &WikiFs, path: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let path = normalize(path);
    ensure_dirs(fs, &path, false).await?;
    fs.mkdir(&path)?;

    if !global.quiet {
        let site = fs
            .sites()
            .into_iter()
            .find(|site| child_path("/", site.name()) == path);
        match site {
            Some(site) => eprintln!("Created {path} for {}", site.config().host),
            None => eprintln!("Created {path}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_paths() {
        assert_eq!(child_path("/", "wikipedia-en"), "/wikipedia-en");
        assert_eq!(child_path("/site/Project", "Notes.mw"), "/site/Project/Notes.mw");
    }

    #[test]
    fn epoch_formats_as_utc() {
        assert_eq!(format_time(SystemTime::UNIX_EPOCH), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn entry_mode_is_octal() {
        let attr = FileAttr::file(0o644, 12, SystemTime::UNIX_EPOCH);
        let entry = Entry::new("Paris.mw".into(), &attr);
        assert_eq!(entry.mode, "644");
        assert_eq!(entry.kind, "file");
        assert!(!entry.is_dir());
    }
}
