//! Site listing.

use serde::Serialize;
use tabled::Tabled;

use wikifs_core::{SiteConfig, WikiFs};

use crate::cli::GlobalOpts;
use crate::output;

#[derive(Debug, Serialize)]
struct SiteInfo {
    name: String,
    url: String,
    user: Option<String>,
    article_cache_secs: u64,
}

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "Site")]
    name: String,
    #[tabled(rename = "Index URL")]
    url: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Cache")]
    cache: String,
}

fn index_url(config: &SiteConfig) -> String {
    config
        .endpoint()
        .ok()
        .and_then(|ep| ep.root().join(ep.index_path()).ok())
        .map_or_else(|| config.host.clone(), |url| url.to_string())
}

impl From<&SiteConfig> for SiteInfo {
    fn from(config: &SiteConfig) -> Self {
        Self {
            name: config.name.clone(),
            url: index_url(config),
            user: config.credentials.as_ref().map(|c| c.username.clone()),
            article_cache_secs: config.article_ttl.as_secs(),
        }
    }
}

pub fn handle(fs: &WikiFs, global: &GlobalOpts) {
    let sites: Vec<SiteInfo> = fs
        .sites()
        .iter()
        .map(|site| SiteInfo::from(site.config()))
        .collect();

    let out = output::render_list(
        &global.output,
        &sites,
        |s| SiteRow {
            name: s.name.clone(),
            url: s.url.clone(),
            user: s.user.clone().unwrap_or_else(|| "(anonymous)".into()),
            cache: format!("{}s", s.article_cache_secs),
        },
        |s| s.name.clone(),
    );
    output::print_output(&out, global.quiet);
}
