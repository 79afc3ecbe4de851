//! Configuration for wikifs.
//!
//! The TOML config file, credential resolution (env + keyring + plaintext),
//! and translation into `wikifs_core` site configurations. The core never
//! reads files; the binary loads a [`Config`] here and hands the result in.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wikifs_api::{BasicAuth, FormFields, LoginCredentials, LoginPolicy, TlsMode};
use wikifs_core::{SiteConfig, WikiContext};

const KEYRING_SERVICE: &str = "wikifs";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no site named '{name}' in the config")]
    UnknownSite { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: General,

    /// Overrides of the wiki's hidden form-field names.
    #[serde(default)]
    pub fields: FormFields,

    /// Wikis to mount, keyed by directory name.
    #[serde(default)]
    pub sites: BTreeMap<String, SiteEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct General {
    /// Seconds a fetched article is served from cache.
    #[serde(default = "default_article_cache_secs")]
    pub article_cache_secs: u64,

    /// Seconds a login cookie is reused.
    #[serde(default = "default_login_cache_secs")]
    pub login_cache_secs: u64,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Turn on debug logging.
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub login_policy: LoginPolicy,
}

impl Default for General {
    fn default() -> Self {
        Self {
            article_cache_secs: default_article_cache_secs(),
            login_cache_secs: default_login_cache_secs(),
            timeout: default_timeout(),
            debug: false,
            login_policy: LoginPolicy::default(),
        }
    }
}

fn default_article_cache_secs() -> u64 {
    30
}
fn default_login_cache_secs() -> u64 {
    7200
}
fn default_timeout() -> u64 {
    30
}

/// One wiki.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteEntry {
    /// Host name, e.g. "fr.wikipedia.org".
    pub host: String,

    /// Path of the index script.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    #[serde(default = "default_https")]
    pub https: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Wiki account for editing under a name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Wiki password (plaintext; prefer keyring or env).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Authentication domain for LDAP-style login extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// HTTP basic-auth in front of the wiki.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_auth_username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_auth_password: Option<String>,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Fixed proxy URL for every request to this site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Override `general.article_cache_secs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_cache_secs: Option<u64>,

    /// Override `general.login_cache_secs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_cache_secs: Option<u64>,
}

fn default_base_path() -> String {
    "/w/index.php".into()
}
fn default_https() -> bool {
    true
}

impl SiteEntry {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            base_path: default_base_path(),
            https: default_https(),
            port: None,
            username: None,
            password: None,
            domain: None,
            http_auth_username: None,
            http_auth_password: None,
            insecure: false,
            ca_cert: None,
            proxy: None,
            article_cache_secs: None,
            login_cache_secs: None,
        }
    }
}

impl Config {
    /// The config `config init` writes when nothing better is known.
    pub fn sample() -> Self {
        let mut sites = BTreeMap::new();
        sites.insert("wikipedia-en".to_owned(), SiteEntry::new("en.wikipedia.org"));
        Self {
            sites,
            ..Self::default()
        }
    }

    pub fn site(&self, name: &str) -> Result<&SiteEntry, ConfigError> {
        self.sites.get(name).ok_or_else(|| ConfigError::UnknownSite {
            name: name.to_owned(),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "wikifs", "wikifs").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("wikifs");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from `path` (missing file means defaults), then apply
/// `WIKIFS_`-prefixed environment overrides such as
/// `WIKIFS_GENERAL__DEBUG=true`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("WIKIFS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, creating parents.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// `WIKIFS_PASSWORD_WIKIPEDIA_FR` for site `wikipedia-fr`.
pub fn password_env_var(site_name: &str) -> String {
    env_var_for("WIKIFS_PASSWORD_", site_name)
}

/// `WIKIFS_HTTP_PASSWORD_WIKIPEDIA_FR` for site `wikipedia-fr`.
pub fn http_password_env_var(site_name: &str) -> String {
    env_var_for("WIKIFS_HTTP_PASSWORD_", site_name)
}

fn env_var_for(prefix: &str, site_name: &str) -> String {
    let suffix: String = site_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{prefix}{suffix}")
}

fn keyring_user(site_name: &str, kind: &str) -> String {
    format!("{site_name}/{kind}")
}

/// Env var, then system keyring, then plaintext.
fn resolve_secret(env_var: &str, keyring_key: &str, plaintext: Option<&String>) -> Option<SecretString> {
    // 1. Env var
    if let Ok(val) = std::env::var(env_var) {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, keyring_key) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    plaintext.map(|pw| SecretString::from(pw.clone()))
}

/// Resolve the wiki password of a site.
pub fn resolve_password(site: &SiteEntry, site_name: &str) -> Option<SecretString> {
    resolve_secret(
        &password_env_var(site_name),
        &keyring_user(site_name, "password"),
        site.password.as_ref(),
    )
}

/// Resolve the HTTP basic-auth password of a site.
pub fn resolve_http_auth_password(site: &SiteEntry, site_name: &str) -> Option<SecretString> {
    resolve_secret(
        &http_password_env_var(site_name),
        &keyring_user(site_name, "http-auth"),
        site.http_auth_password.as_ref(),
    )
}

/// Store a site's wiki password in the system keyring.
pub fn store_password(site_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(site_name, "password"))?;
    entry.set_password(password)?;
    Ok(())
}

// ── Translation to core types ───────────────────────────────────────

/// Process-wide settings from `[general]` and `[fields]`.
pub fn build_context(cfg: &Config) -> WikiContext {
    let mut ctx = WikiContext {
        fields: cfg.fields.clone(),
        article_ttl: Duration::from_secs(cfg.general.article_cache_secs),
        login_ttl: Duration::from_secs(cfg.general.login_cache_secs),
        login_policy: cfg.general.login_policy,
        ..WikiContext::default()
    };
    ctx.transport.timeout = Duration::from_secs(cfg.general.timeout);
    ctx
}

/// Build the `SiteConfig` for one `[sites.<name>]` entry.
pub fn site_to_config(
    site: &SiteEntry,
    name: &str,
    ctx: &WikiContext,
) -> Result<SiteConfig, ConfigError> {
    if site.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: format!("sites.{name}.host"),
            reason: "must not be empty".into(),
        });
    }

    let mut config = SiteConfig::new(name, site.host.trim(), ctx);
    config.base_path.clone_from(&site.base_path);
    config.https = site.https;
    config.port = site.port;

    if let Some(secs) = site.article_cache_secs {
        config.article_ttl = Duration::from_secs(secs);
    }
    if let Some(secs) = site.login_cache_secs {
        config.login_ttl = Duration::from_secs(secs);
    }

    if let Some(ref username) = site.username {
        match resolve_password(site, name) {
            Some(password) => {
                config.credentials = Some(LoginCredentials {
                    username: username.clone(),
                    password,
                    domain: site.domain.clone(),
                });
            }
            None => {
                return Err(ConfigError::Validation {
                    field: format!("sites.{name}.password"),
                    reason: format!(
                        "username is set but no password was found (set it in the config, \
                         the keyring, or {})",
                        password_env_var(name)
                    ),
                });
            }
        }
    }

    if let Some(ref username) = site.http_auth_username {
        config.transport.basic_auth = Some(BasicAuth {
            username: username.clone(),
            password: resolve_http_auth_password(site, name)
                .unwrap_or_else(|| SecretString::from(String::new())),
        });
    }

    config.transport.tls = if site.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = site.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    if let Some(ref proxy) = site.proxy {
        let url = url::Url::parse(proxy).map_err(|e| ConfigError::Validation {
            field: format!("sites.{name}.proxy"),
            reason: format!("invalid URL '{proxy}': {e}"),
        })?;
        config.transport.proxy = Some(url);
    }

    Ok(config)
}

/// Every configured site, in name order.
pub fn load_sites(cfg: &Config, ctx: &WikiContext) -> Result<Vec<SiteConfig>, ConfigError> {
    cfg.sites
        .iter()
        .map(|(name, site)| site_to_config(site, name, ctx))
        .collect()
}
