// ── Filesystem error taxonomy ──
//
// Every adapter call fails with one of these. `errno()` gives the value a
// userspace-filesystem host expects back. Remote failures that reach this
// far are transport-level; protocol oddities are degraded inside
// `wikifs-api` and never show up here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("No such file or directory: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("File exists: {path}")]
    AlreadyExists { path: String },

    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    #[error("File too large: {path}")]
    TooLarge { path: String },

    #[error("Article text is not valid UTF-8: {path}")]
    NotUtf8 { path: String },

    #[error("Remote wiki error: {0}")]
    Remote(#[from] wikifs_api::Error),
}

impl FsError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied { path: path.into() }
    }

    /// The positive errno for this error (hosts usually negate it).
    pub fn errno(&self) -> i32 {
        match self {
            Self::NotFound { .. } => libc::ENOENT,
            Self::PermissionDenied { .. } => libc::EACCES,
            Self::AlreadyExists { .. } => libc::EEXIST,
            Self::NotADirectory { .. } => libc::ENOTDIR,
            Self::TooLarge { .. } => libc::EFBIG,
            Self::NotUtf8 { .. } => libc::EINVAL,
            Self::Remote(e) if e.is_not_found() => libc::ENOENT,
            Self::Remote(_) => libc::EIO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_values() {
        assert_eq!(FsError::not_found("/x").errno(), libc::ENOENT);
        assert_eq!(FsError::denied("/x").errno(), libc::EACCES);
        assert_eq!(FsError::TooLarge { path: "/x".into() }.errno(), libc::EFBIG);
        assert_eq!(FsError::NotUtf8 { path: "/x".into() }.errno(), libc::EINVAL);
        assert_eq!(
            FsError::Remote(wikifs_api::Error::Tls("bad".into())).errno(),
            libc::EIO
        );
        assert_eq!(
            FsError::Remote(wikifs_api::Error::Status {
                status: 404,
                url: "http://w/".into()
            })
            .errno(),
            libc::ENOENT
        );
    }
}
