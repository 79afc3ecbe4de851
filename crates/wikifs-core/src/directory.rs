// ── Directory objects ──
//
// A directory answers questions about the names directly inside it and
// routes article reads and writes to the right `DocumentClient`. The
// adapter finds the owning directory of a path; all methods here take the
// full path of the entry being asked about.

use std::sync::Arc;
use std::time::SystemTime;

use dashmap::{DashMap, DashSet};
use tracing::{debug, info};
use wikifs_api::DocumentClient;

use crate::attr::{DIR_PERM, FILE_PERM};
use crate::config::{SiteConfig, parse_family_dir};
use crate::context::WikiContext;
use crate::error::FsError;
use crate::names::{article_title, basename, is_article_name, is_subpage_name, parent};
use crate::site::Site;

/// The two kinds of directory in the tree.
#[derive(Debug)]
pub enum Directory {
    /// The mount root; holds one directory per site.
    Root(RootDir),
    /// A site directory or one of its sub-page directories.
    Site(SiteDir),
}

#[derive(Debug)]
pub struct RootDir {
    ctx: Arc<WikiContext>,
    sites: DashSet<String>,
}

#[derive(Debug)]
pub struct SiteDir {
    site: Arc<Site>,
    subdirs: DashSet<String>,
    /// Article clients by file name, created on first access.
    files: DashMap<String, Arc<DocumentClient>>,
}

impl RootDir {
    pub fn new(ctx: Arc<WikiContext>) -> Self {
        Self {
            ctx,
            sites: DashSet::new(),
        }
    }

    pub fn add_site(&self, name: &str) {
        self.sites.insert(name.to_owned());
    }

    fn mkdir(&self, path: &str) -> Result<Directory, FsError> {
        if parent(path) != "/" {
            return Err(FsError::not_found(path));
        }
        let name = basename(path);
        if self.sites.contains(name) {
            return Err(FsError::AlreadyExists { path: path.into() });
        }
        let Some((family, lang)) = parse_family_dir(name) else {
            debug!(name, "not a <family>-<lang> directory name");
            return Err(FsError::denied(path));
        };

        let mut config = SiteConfig::for_family(&family, &lang, &self.ctx);
        config.name = name.to_owned();
        let site = Site::new(config, &self.ctx)?;
        info!(name, host = %site.config().host, "mounted family wiki");

        self.sites.insert(name.to_owned());
        Ok(Directory::Site(SiteDir::new(Arc::new(site))))
    }
}

impl SiteDir {
    pub fn new(site: Arc<Site>) -> Self {
        Self {
            site,
            subdirs: DashSet::new(),
            files: DashMap::new(),
        }
    }

    pub fn site(&self) -> &Arc<Site> {
        &self.site
    }

    /// The client for the article at `path`, created on first use.
    fn document(&self, path: &str) -> Result<Arc<DocumentClient>, FsError> {
        let name = basename(path);
        if !is_article_name(name) {
            return Err(FsError::not_found(path));
        }
        let title = article_title(path).ok_or_else(|| FsError::not_found(path))?;
        let client = self
            .files
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(self.site.document(title)));
        Ok(Arc::clone(client.value()))
    }

    async fn contents(&self) -> Vec<String> {
        let clients: Vec<(String, Arc<DocumentClient>)> = self
            .files
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();

        let mut names: Vec<String> = self.subdirs.iter().map(|d| d.key().clone()).collect();
        for (name, client) in clients {
            if !client.is_empty().await {
                names.push(name);
            }
        }
        names.sort();
        names
    }

    fn mkdir(&self, path: &str) -> Result<Directory, FsError> {
        let name = basename(path);
        if !is_subpage_name(name) {
            return Err(FsError::denied(path));
        }
        if !self.subdirs.insert(name.to_owned()) {
            return Err(FsError::AlreadyExists { path: path.into() });
        }
        debug!(site = self.site.name(), name, "sub-page directory created");
        Ok(Directory::Site(SiteDir::new(Arc::clone(&self.site))))
    }
}

impl Directory {
    pub fn site(&self) -> Option<&Arc<Site>> {
        match self {
            Self::Root(_) => None,
            Self::Site(dir) => Some(dir.site()),
        }
    }

    pub fn is_directory(&self, path: &str) -> bool {
        match self {
            Self::Root(root) => {
                path == "/" || (parent(path) == "/" && root.sites.contains(basename(path)))
            }
            Self::Site(dir) => dir.subdirs.contains(basename(path)),
        }
    }

    /// Whether `path` is an article with content. Fetches it if needed.
    pub async fn is_file(&self, path: &str) -> Result<bool, FsError> {
        match self {
            Self::Root(_) => Ok(false),
            Self::Site(dir) => {
                if !is_article_name(basename(path)) {
                    return Ok(false);
                }
                let text = dir.document(path)?.fetch().await?;
                Ok(!text.trim().is_empty())
            }
        }
    }

    /// Whether a regular file named like `path` may be created here.
    pub fn accepts_file(&self, path: &str) -> bool {
        match self {
            Self::Root(_) => false,
            Self::Site(_) => is_article_name(basename(path)),
        }
    }

    /// Names inside this directory. Empty articles are left out.
    pub async fn contents(&self) -> Vec<String> {
        match self {
            Self::Root(root) => {
                let mut names: Vec<String> = root.sites.iter().map(|s| s.key().clone()).collect();
                names.sort();
                names
            }
            Self::Site(dir) => dir.contents().await,
        }
    }

    pub fn mode(&self, path: &str) -> u16 {
        if self.is_directory(path) {
            DIR_PERM
        } else {
            FILE_PERM
        }
    }

    pub async fn size(&self, path: &str) -> Result<u64, FsError> {
        let text = self.read(path).await?;
        Ok(u64::try_from(text.len()).unwrap_or(u64::MAX))
    }

    /// Revision time of the article, once it has been fetched.
    pub async fn mtime(&self, path: &str) -> Option<SystemTime> {
        match self {
            Self::Root(_) => None,
            Self::Site(dir) => match dir.document(path) {
                Ok(client) => client.last_modified().await,
                Err(_) => None,
            },
        }
    }

    pub async fn read(&self, path: &str) -> Result<String, FsError> {
        match self {
            Self::Root(_) => Err(FsError::not_found(path)),
            Self::Site(dir) => Ok(dir.document(path)?.fetch().await?),
        }
    }

    pub async fn write(&self, path: &str, text: &str) -> Result<(), FsError> {
        match self {
            Self::Root(_) => Err(FsError::denied(path)),
            Self::Site(dir) => Ok(dir.document(path)?.submit(text).await?),
        }
    }

    /// Forget the cached client for `path`. The wiki page stays.
    pub fn unlink(&self, path: &str) -> Result<(), FsError> {
        match self {
            Self::Root(_) => Err(FsError::denied(path)),
            Self::Site(dir) => match dir.files.remove(basename(path)) {
                Some(_) => Ok(()),
                None => Err(FsError::denied(path)),
            },
        }
    }

    /// Create the directory `path` and return it for registration.
    pub fn mkdir(&self, path: &str) -> Result<Directory, FsError> {
        match self {
            Self::Root(root) => root.mkdir(path),
            Self::Site(dir) => dir.mkdir(path),
        }
    }

    /// Remove the sub-page directory `path`. Sites themselves stay.
    pub fn rmdir(&self, path: &str) -> Result<(), FsError> {
        match self {
            Self::Root(_) => Err(FsError::denied(path)),
            Self::Site(dir) => match dir.subdirs.remove(basename(path)) {
                Some(_) => Ok(()),
                None => Err(FsError::not_found(path)),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn root() -> Directory {
        Directory::Root(RootDir::new(Arc::new(WikiContext::default())))
    }

    #[test]
    fn root_mkdir_accepts_family_names() {
        let root = root();
        let child = root.mkdir("/wikipedia-de").unwrap();
        let site = child.site().unwrap();
        assert_eq!(site.config().host, "de.wikipedia.org");
        assert_eq!(site.name(), "wikipedia-de");
        assert!(root.is_directory("/wikipedia-de"));
    }

    #[test]
    fn root_mkdir_rejects_other_names() {
        let root = root();
        assert!(matches!(
            root.mkdir("/notalanguage-xx"),
            Err(FsError::PermissionDenied { .. })
        ));
        assert!(!root.is_directory("/notalanguage-xx"));
    }

    #[test]
    fn root_mkdir_rejects_duplicates() {
        let root = root();
        root.mkdir("/wiktionary-fr").unwrap();
        assert!(matches!(
            root.mkdir("/wiktionary-fr"),
            Err(FsError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn root_has_no_files() {
        let root = root();
        assert!(!root.accepts_file("/Paris.mw"));
        assert!(root.unlink("/Paris.mw").is_err());
        assert!(matches!(
            root.rmdir("/wikipedia-de"),
            Err(FsError::PermissionDenied { .. })
        ));
        assert_eq!(root.mode("/"), DIR_PERM);
    }

    #[tokio::test]
    async fn sub_page_directories() {
        let root = root();
        let site = root.mkdir("/wikipedia-en").unwrap();

        let sub = site.mkdir("/wikipedia-en/Project").unwrap();
        assert!(sub.site().is_some());
        assert!(site.is_directory("/wikipedia-en/Project"));
        assert_eq!(site.contents().await, vec!["Project".to_owned()]);
        assert!(site.mkdir("/wikipedia-en/.hidden").is_err());

        site.rmdir("/wikipedia-en/Project").unwrap();
        assert!(!site.is_directory("/wikipedia-en/Project"));
        assert!(matches!(
            site.rmdir("/wikipedia-en/Project"),
            Err(FsError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn unfetched_articles_are_not_listed() {
        let root = root();
        let site = root.mkdir("/wikipedia-en").unwrap();
        let Directory::Site(ref dir) = site else {
            panic!("expected a site directory");
        };
        dir.document("/wikipedia-en/Paris.mw").unwrap();

        assert!(site.contents().await.is_empty());
        assert!(site.unlink("/wikipedia-en/Paris.mw").is_ok());
        assert!(site.unlink("/wikipedia-en/Paris.mw").is_err());
    }
}
