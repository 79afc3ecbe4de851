// wikifs-core: wiki articles as files.
//
// Resolves filesystem paths to site and sub-page directories, buffers open
// files in memory, tolerates editor scratch files, and saves buffered
// edits through `wikifs-api`.

pub mod adapter;
pub mod attr;
pub mod config;
pub mod context;
pub mod directory;
pub mod error;
pub mod names;
pub mod site;

// ── Primary re-exports ──────────────────────────────────────────────
pub use adapter::WikiFs;
pub use attr::{FileAttr, FileKind};
pub use config::{FAMILIES, SiteConfig, parse_family_dir};
pub use context::WikiContext;
pub use directory::Directory;
pub use error::FsError;
pub use names::ARTICLE_SUFFIX;
pub use site::Site;
