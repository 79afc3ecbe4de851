//! CLI error types with miette diagnostics.
//!
//! Maps `FsError` and `ConfigError` into user-facing errors with help text
//! and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use wikifs_config::ConfigError;
use wikifs_core::FsError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Filesystem ───────────────────────────────────────────────────

    #[error("No such file or directory: {path}")]
    #[diagnostic(
        code(wikifs::not_found),
        help(
            "Articles are `<Title>.mw` files inside a site directory.\n\
             Run: wikifs sites to list mounted wikis, or use a\n\
             `<family>-<lang>` directory such as /wikipedia-de"
        )
    )]
    NotFound { path: String },

    #[error("Permission denied: {path}")]
    #[diagnostic(
        code(wikifs::permission_denied),
        help(
            "Site directories cannot be removed, and titles may not contain\n\
             any of: # < > [ ] | {{ }}"
        )
    )]
    PermissionDenied { path: String },

    #[error("File exists: {path}")]
    #[diagnostic(code(wikifs::exists))]
    AlreadyExists { path: String },

    #[error("Not a directory: {path}")]
    #[diagnostic(code(wikifs::not_a_directory))]
    NotADirectory { path: String },

    #[error("Text not accepted for {path}: {reason}")]
    #[diagnostic(
        code(wikifs::bad_text),
        help("Articles are saved as UTF-8 text of at most 64 MiB")
    )]
    BadText { path: String, reason: String },

    // ── Remote ───────────────────────────────────────────────────────

    #[error("Could not reach the wiki")]
    #[diagnostic(
        code(wikifs::connection_failed),
        help(
            "Check the site's host, port and proxy settings.\n\
             Run: wikifs config show"
        )
    )]
    ConnectionFailed {
        #[source]
        source: wikifs_api::Error,
    },

    #[error("The wiki rejected the request")]
    #[diagnostic(code(wikifs::remote))]
    Remote {
        #[source]
        source: wikifs_api::Error,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(wikifs::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(wikifs::config),
        help("Run: wikifs config path to locate the config file")
    )]
    Config(#[from] ConfigError),

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Remote { source } if source.is_not_found() => exit_code::NOT_FOUND,
            Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Validation { .. }
            | Self::BadText { .. }
            | Self::Config(ConfigError::Validation { .. }) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── FsError → CliError mapping ───────────────────────────────────────

impl From<FsError> for CliError {
    fn from(err: FsError) -> Self {
        match err {
            FsError::NotFound { path } => Self::NotFound { path },
            FsError::PermissionDenied { path } => Self::PermissionDenied { path },
            FsError::AlreadyExists { path } => Self::AlreadyExists { path },
            FsError::NotADirectory { path } => Self::NotADirectory { path },
            FsError::TooLarge { path } => Self::BadText {
                path,
                reason: "too large".into(),
            },
            FsError::NotUtf8 { path } => Self::BadText {
                path,
                reason: "not valid UTF-8".into(),
            },
            FsError::Remote(source) if is_connection_error(&source) => {
                Self::ConnectionFailed { source }
            }
            FsError::Remote(source) => Self::Remote { source },
        }
    }
}

fn is_connection_error(err: &wikifs_api::Error) -> bool {
    match err {
        wikifs_api::Error::Transport(e) => e.is_connect() || e.is_timeout(),
        wikifs_api::Error::Tls(_) | wikifs_api::Error::Proxy { .. } => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(CliError::from(FsError::not_found("/x")).exit_code(), exit_code::NOT_FOUND);
        assert_eq!(CliError::from(FsError::denied("/x")).exit_code(), exit_code::PERMISSION);
        assert_eq!(
            CliError::from(FsError::AlreadyExists { path: "/x".into() }).exit_code(),
            exit_code::GENERAL
        );
        assert_eq!(
            CliError::from(FsError::Remote(wikifs_api::Error::Tls("bad".into()))).exit_code(),
            exit_code::CONNECTION
        );
        assert_eq!(
            CliError::from(FsError::Remote(wikifs_api::Error::Status {
                status: 404,
                url: "http://w/".into()
            }))
            .exit_code(),
            exit_code::NOT_FOUND
        );
        assert_eq!(
            CliError::from(FsError::Remote(wikifs_api::Error::Status {
                status: 500,
                url: "http://w/".into()
            }))
            .exit_code(),
            exit_code::GENERAL
        );
    }

    #[test]
    fn rejected_text_is_a_usage_error() {
        let err = CliError::from(FsError::NotUtf8 { path: "/w/Paris.mw".into() });
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert!(err.to_string().contains("UTF-8"));
        let err = CliError::from(FsError::TooLarge { path: "/w/x~".into() });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn config_validation_is_a_usage_error() {
        let err = CliError::from(ConfigError::Validation {
            field: "sites.x.host".into(),
            reason: "must not be empty".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
