// ── Site configuration ──
//
// One `SiteConfig` per wiki, keyed by its directory name. Built by the
// config crate from the TOML file, or synthesized from a family directory
// name such as `wikipedia-de`. Never touches disk.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use wikifs_api::{LoginCredentials, LoginPolicy, SiteEndpoint, TransportConfig};

use crate::context::WikiContext;

/// Wiki families that can be mounted by name alone.
pub const FAMILIES: &[&str] = &[
    "wikipedia",
    "wiktionary",
    "wikiquote",
    "wikibooks",
    "wikisource",
    "wikinews",
    "wikiversity",
    "wikivoyage",
];

/// Index script path shared by every family wiki.
pub const FAMILY_INDEX_PATH: &str = "/w/index.php";

static FAMILY_DIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?i)^({})-([a-z]{{2,3}})$", FAMILIES.join("|"));
    Regex::new(&pattern).expect("family directory pattern")
});

/// Split `<family>-<lang>` into lowercase parts, if it names a family wiki.
pub fn parse_family_dir(name: &str) -> Option<(String, String)> {
    let caps = FAMILY_DIR_RE.captures(name)?;
    Some((
        caps.get(1)?.as_str().to_ascii_lowercase(),
        caps.get(2)?.as_str().to_ascii_lowercase(),
    ))
}

/// Everything needed to talk to one wiki.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Directory name under the mount root.
    pub name: String,
    pub host: String,
    /// Path of the index script, e.g. `/w/index.php`.
    pub base_path: String,
    pub https: bool,
    pub port: Option<u16>,
    /// Wiki account; `None` edits anonymously.
    pub credentials: Option<LoginCredentials>,
    pub transport: TransportConfig,
    pub article_ttl: Duration,
    pub login_ttl: Duration,
    pub login_policy: LoginPolicy,
}

impl SiteConfig {
    /// A site with the context's defaults and no account.
    pub fn new(name: impl Into<String>, host: impl Into<String>, ctx: &WikiContext) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            base_path: FAMILY_INDEX_PATH.to_owned(),
            https: true,
            port: None,
            credentials: None,
            transport: ctx.transport.clone(),
            article_ttl: ctx.article_ttl,
            login_ttl: ctx.login_ttl,
            login_policy: ctx.login_policy,
        }
    }

    /// Anonymous `https://<lang>.<family>.org/w/index.php` site.
    pub fn for_family(family: &str, lang: &str, ctx: &WikiContext) -> Self {
        let family = family.to_ascii_lowercase();
        let lang = lang.to_ascii_lowercase();
        Self::new(
            format!("{family}-{lang}"),
            format!("{lang}.{family}.org"),
            ctx,
        )
    }

    pub fn endpoint(&self) -> Result<SiteEndpoint, wikifs_api::Error> {
        SiteEndpoint::new(self.https, &self.host, self.port, &self.base_path)
    }
}
