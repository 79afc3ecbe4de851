// ── Runtime context ──
//
// Built once at startup by the binary and handed to the adapter, which
// passes it down to every directory and site it creates. Nothing in the
// core reads configuration or logging state from anywhere else.

use std::time::Duration;

use wikifs_api::{FormFields, LoginPolicy, TransportConfig};

/// Process-wide settings shared by every site.
#[derive(Debug, Clone)]
pub struct WikiContext {
    /// Transport defaults; sites may override TLS, proxy and basic auth.
    pub transport: TransportConfig,
    /// Hidden-field names of the edit and login forms.
    pub fields: FormFields,
    /// How long a fetched article is served from cache.
    pub article_ttl: Duration,
    /// How long a login cookie is reused.
    pub login_ttl: Duration,
    pub login_policy: LoginPolicy,
}

impl Default for WikiContext {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            fields: FormFields::default(),
            article_ttl: Duration::from_secs(30),
            login_ttl: Duration::from_secs(7200),
            login_policy: LoginPolicy::default(),
        }
    }
}
