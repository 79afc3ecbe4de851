// ── Virtual filesystem adapter ──
//
// Entry point for the host's filesystem callbacks. Maps every path to the
// directory object that owns it, keeps per-path byte buffers across
// open → read/write → release, and hides editor scratch files from the
// wiki while still letting editors use them.
//
// Buffers of real articles are submitted on release (when written to) and
// dropped once the wiki took them. Buffers of temp names stay until
// unlinked, since editors reopen their lock and swap files.

use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::attr::{BUFFER_PERM, FileAttr};
use crate::config::SiteConfig;
use crate::context::WikiContext;
use crate::directory::{Directory, RootDir, SiteDir};
use crate::error::FsError;
use crate::names::{ancestors, basename, is_below, is_temp_name, is_valid_name, normalize, parent};
use crate::site::Site;

/// Largest buffer a write or truncate may produce.
pub const MAX_BUFFER_LEN: usize = 64 * 1024 * 1024;

#[derive(Debug, Default)]
struct OpenBuffer {
    data: Vec<u8>,
    /// Written to since the last release.
    dirty: bool,
}

impl OpenBuffer {
    fn with_text(text: String) -> Self {
        Self {
            data: text.into_bytes(),
            dirty: false,
        }
    }
}

/// Buffer length needed to hold `len` bytes at `offset`.
fn buffer_end(path: &str, offset: u64, len: usize) -> Result<usize, FsError> {
    usize::try_from(offset)
        .ok()
        .and_then(|start| start.checked_add(len))
        .filter(|&end| end <= MAX_BUFFER_LEN)
        .ok_or_else(|| FsError::TooLarge {
            path: path.to_owned(),
        })
}

/// Buffer bytes as article text. Invalid UTF-8 is never posted.
fn article_text<'a>(path: &str, data: &'a [u8]) -> Result<&'a str, FsError> {
    std::str::from_utf8(data).map_err(|e| {
        warn!(path, error = %e, "refusing to save text that is not UTF-8");
        FsError::NotUtf8 {
            path: path.to_owned(),
        }
    })
}

/// The mounted tree of wikis.
#[derive(Debug)]
pub struct WikiFs {
    root: Arc<Directory>,
    /// Registered directories by path, root included.
    dirs: DashMap<String, Arc<Directory>>,
    buffers: DashMap<String, OpenBuffer>,
    mounted_at: SystemTime,
}

impl WikiFs {
    /// Mount `sites` under one root. Each site becomes `/<name>`.
    pub fn new(ctx: WikiContext, sites: Vec<SiteConfig>) -> Result<Self, FsError> {
        let ctx = Arc::new(ctx);
        let root = RootDir::new(Arc::clone(&ctx));
        let dirs = DashMap::new();

        for config in sites {
            let name = config.name.clone();
            if name.is_empty() || name.contains('/') || is_temp_name(&name) {
                warn!(site = %name, "unusable site directory name, skipped");
                continue;
            }
            let site = Site::new(config, &ctx)?;
            root.add_site(&name);
            dirs.insert(
                format!("/{name}"),
                Arc::new(Directory::Site(SiteDir::new(Arc::new(site)))),
            );
        }

        let root = Arc::new(Directory::Root(root));
        dirs.insert("/".to_owned(), Arc::clone(&root));
        Ok(Self {
            root,
            dirs,
            buffers: DashMap::new(),
            mounted_at: SystemTime::now(),
        })
    }

    /// Mounted sites, configured and synthesized, by name.
    pub fn sites(&self) -> Vec<Arc<Site>> {
        let mut sites: Vec<Arc<Site>> = self
            .dirs
            .iter()
            .filter(|e| e.key() != "/" && parent(e.key()) == "/")
            .filter_map(|e| e.value().site().cloned())
            .collect();
        sites.sort_by(|a, b| a.name().cmp(b.name()));
        sites
    }

    /// The directory registered nearest above `path`.
    fn owner(&self, path: &str) -> Arc<Directory> {
        ancestors(path)
            .find_map(|dir| self.dirs.get(dir).map(|d| Arc::clone(d.value())))
            .unwrap_or_else(|| Arc::clone(&self.root))
    }

    fn dir_at(&self, path: &str) -> Option<Arc<Directory>> {
        self.dirs.get(path).map(|d| Arc::clone(d.value()))
    }

    pub fn has_buffer(&self, path: &str) -> bool {
        self.buffers.contains_key(&normalize(path))
    }

    // ── Metadata ────────────────────────────────────────────────────

    pub async fn getattr(&self, path: &str) -> Result<FileAttr, FsError> {
        let path = normalize(path);
        debug!("getattr {}", path);

        if let Some(buf) = self.buffers.get(&path) {
            let size = u64::try_from(buf.data.len()).unwrap_or(u64::MAX);
            return Ok(FileAttr::file(BUFFER_PERM, size, self.mounted_at));
        }
        if is_temp_name(&path) {
            return Err(FsError::not_found(path));
        }
        if path == "/" {
            return Ok(FileAttr::directory(self.root.mode("/"), self.mounted_at));
        }

        let owner = self.owner(&path);
        if owner.is_directory(&path) {
            return Ok(FileAttr::directory(owner.mode(&path), self.mounted_at));
        }
        if owner.is_file(&path).await? {
            let size = owner.size(&path).await?;
            let mtime = owner.mtime(&path).await.unwrap_or(self.mounted_at);
            return Ok(FileAttr::file(owner.mode(&path), size, mtime));
        }
        Err(FsError::not_found(path))
    }

    /// Entry names of a directory, `.` and `..` first.
    pub async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let path = normalize(path);
        debug!("readdir {}", path);

        let Some(dir) = self.dir_at(&path) else {
            if is_valid_name(&path) && self.owner(&path).is_file(&path).await? {
                return Err(FsError::NotADirectory { path });
            }
            return Err(FsError::not_found(path));
        };

        let mut entries = vec![".".to_owned(), "..".to_owned()];
        entries.extend(dir.contents().await);
        Ok(entries)
    }

    // ── File lifecycle ──────────────────────────────────────────────

    /// Start a new file. Real names must be acceptable article names.
    pub fn create(&self, path: &str) -> Result<(), FsError> {
        let path = normalize(path);
        debug!("create {}", path);

        if is_valid_name(&path) && !self.owner(&path).accepts_file(&path) {
            return Err(FsError::denied(path));
        }
        self.buffers.entry(path).or_default();
        Ok(())
    }

    /// Load an article into a buffer unless one is already open.
    pub async fn open(&self, path: &str) -> Result<(), FsError> {
        let path = normalize(path);
        debug!("open {}", path);

        if self.buffers.contains_key(&path) {
            return Ok(());
        }
        let buffer = if is_valid_name(&path) {
            OpenBuffer::with_text(self.owner(&path).read(&path).await?)
        } else {
            OpenBuffer::default()
        };
        self.buffers.entry(path).or_insert(buffer);
        Ok(())
    }

    pub async fn read(&self, path: &str, size: usize, offset: u64) -> Result<Vec<u8>, FsError> {
        let path = normalize(path);
        debug!("read {} {} {}", path, size, offset);

        if !self.buffers.contains_key(&path) {
            self.open(&path).await?;
        }
        let Some(buf) = self.buffers.get(&path) else {
            return Err(FsError::not_found(path));
        };
        let len = buf.data.len();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(len);
        let end = start.saturating_add(size).min(len);
        Ok(buf.data[start..end].to_vec())
    }

    /// Write into the buffer; never touches the network.
    pub fn write(&self, path: &str, data: &[u8], offset: u64) -> Result<usize, FsError> {
        let path = normalize(path);
        debug!("write {} [{} bytes] {}", path, data.len(), offset);

        let end = buffer_end(&path, offset, data.len())?;
        let mut buf = self.buffers.entry(path).or_default();
        if buf.data.len() < end {
            buf.data.resize(end, 0);
        }
        buf.data[end - data.len()..end].copy_from_slice(data);
        buf.dirty = true;
        Ok(data.len())
    }

    /// Resize a buffer, loading the article first when none is open.
    pub async fn truncate(&self, path: &str, size: u64) -> Result<(), FsError> {
        let path = normalize(path);
        debug!("truncate {} {}", path, size);

        let len = buffer_end(&path, size, 0)?;
        if !self.buffers.contains_key(&path) && is_valid_name(&path) {
            let text = self.owner(&path).read(&path).await?;
            self.buffers
                .entry(path.clone())
                .or_insert(OpenBuffer::with_text(text));
        }

        let mut buf = self.buffers.entry(path).or_default();
        if buf.data.len() != len {
            buf.data.resize(len, 0);
            buf.dirty = true;
        }
        Ok(())
    }

    /// Close a file. A written article is saved to the wiki.
    ///
    /// The buffer is dropped only after the save went through; on failure
    /// it stays dirty so the edit is neither lost nor hidden by a re-fetch.
    pub async fn release(&self, path: &str) -> Result<(), FsError> {
        let path = normalize(path);
        debug!("release {}", path);

        if !is_valid_name(&path) {
            if let Some(mut buf) = self.buffers.get_mut(&path) {
                buf.dirty = false;
            }
            return Ok(());
        }

        let pending = match self.buffers.get(&path) {
            Some(buf) => buf.dirty.then(|| buf.data.clone()),
            None => return Ok(()),
        };
        let Some(data) = pending else {
            self.buffers.remove(&path);
            return Ok(());
        };

        self.owner(&path)
            .write(&path, article_text(&path, &data)?)
            .await?;
        // Writes that arrived during the save stay pending.
        self.buffers.remove_if(&path, |_, buf| buf.data == data);
        Ok(())
    }

    /// Drop the buffer and the cached article client. The wiki page stays.
    pub fn unlink(&self, path: &str) -> Result<(), FsError> {
        let path = normalize(path);
        debug!("unlink {}", path);

        self.buffers.remove(&path);
        if is_valid_name(&path) {
            self.owner(&path).unlink(&path)?;
        }
        Ok(())
    }

    // ── Directories ─────────────────────────────────────────────────

    pub fn mkdir(&self, path: &str) -> Result<(), FsError> {
        let path = normalize(path);
        debug!("mkdir {}", path);

        if self.dirs.contains_key(&path) {
            return Err(FsError::AlreadyExists { path });
        }
        let Some(parent_dir) = self.dir_at(parent(&path)) else {
            return Err(FsError::not_found(path));
        };
        let child = parent_dir.mkdir(&path)?;
        self.dirs.insert(path, Arc::new(child));
        Ok(())
    }

    /// Remove a sub-page directory and everything registered below it.
    pub fn rmdir(&self, path: &str) -> Result<(), FsError> {
        let path = normalize(path);
        debug!("rmdir {}", path);

        if self.dir_at(&path).is_none() {
            return Err(FsError::not_found(path));
        }
        self.owner(&path).rmdir(&path)?;
        self.dirs.retain(|k, _| k != &path && !is_below(k, &path));
        self.buffers.retain(|k, _| !is_below(k, &path));
        Ok(())
    }

    // ── Rename ──────────────────────────────────────────────────────

    /// Handle the rename patterns editors use to save.
    ///
    /// - temp → article: the temp buffer is saved to the article.
    /// - article → temp: the article text is copied into the temp buffer.
    /// - temp → temp: the buffer moves.
    /// - article → article: accepted, nothing happens on the wiki.
    pub async fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        let from = normalize(from);
        let to = normalize(to);
        debug!("rename {} {}", from, to);

        match (is_valid_name(&from), is_valid_name(&to)) {
            (false, true) => {
                let data = match self.buffers.get(&from) {
                    Some(buf) => buf.data.clone(),
                    None => return Err(FsError::not_found(from)),
                };
                let text = article_text(&to, &data)?;
                let owner = self.owner(&to);
                if !owner.accepts_file(&to) {
                    return Err(FsError::denied(to));
                }
                owner.write(&to, text).await?;
                self.buffers.remove(&from);
                self.buffers.remove(&to);
                Ok(())
            }
            (true, false) => {
                let owner = self.owner(&from);
                if !owner.is_file(&from).await? {
                    return Err(FsError::not_found(from));
                }
                let text = owner.read(&from).await?;
                self.buffers.insert(to, OpenBuffer::with_text(text));
                Ok(())
            }
            (false, false) => match self.buffers.remove(&from) {
                Some((_, buf)) => {
                    self.buffers.insert(to, buf);
                    Ok(())
                }
                None => Err(FsError::not_found(from)),
            },
            (true, true) => {
                if !self.owner(&from).is_file(&from).await? {
                    return Err(FsError::not_found(from));
                }
                warn!(
                    from = basename(&from),
                    to = basename(&to),
                    "rename between articles leaves the wiki unchanged"
                );
                Ok(())
            }
        }
    }

    // ── Accepted no-ops ─────────────────────────────────────────────

    pub fn set_times(&self, path: &str) -> Result<(), FsError> {
        debug!("utime {}", path);
        Ok(())
    }

    pub fn chmod(&self, path: &str, mode: u32) -> Result<(), FsError> {
        debug!("chmod {} {:o}", path, mode);
        Ok(())
    }

    pub fn chown(&self, path: &str) -> Result<(), FsError> {
        debug!("chown {}", path);
        Ok(())
    }

    pub fn flush(&self, path: &str) -> Result<(), FsError> {
        debug!("flush {}", path);
        Ok(())
    }

    pub fn fsync(&self, path: &str) -> Result<(), FsError> {
        debug!("fsync {}", path);
        Ok(())
    }
}
