// One mounted wiki: endpoint, HTTP clients and the shared login session.
//
// Every directory of a site (the site directory and its sub-page
// directories) holds an `Arc<Site>`, so all articles under it reuse one
// session and one connection pool.

use std::sync::Arc;

use tracing::debug;
use wikifs_api::{DocumentClient, FormFields, HttpClients, SessionManager, SiteEndpoint};

use crate::config::SiteConfig;
use crate::context::WikiContext;

#[derive(Debug)]
pub struct Site {
    config: SiteConfig,
    endpoint: SiteEndpoint,
    http: HttpClients,
    session: Arc<SessionManager>,
    fields: FormFields,
}

impl Site {
    pub fn new(config: SiteConfig, ctx: &WikiContext) -> Result<Self, wikifs_api::Error> {
        let endpoint = config.endpoint()?;
        let http = HttpClients::new(&config.transport)?;
        let session = Arc::new(SessionManager::new(
            endpoint.clone(),
            http.clone(),
            config.credentials.clone(),
            ctx.fields.clone(),
            config.login_policy,
            config.login_ttl,
        ));
        debug!(
            site = %config.name,
            root = %endpoint.root(),
            logged_in = session.has_credentials(),
            "site ready"
        );
        Ok(Self {
            config,
            endpoint,
            http,
            session,
            fields: ctx.fields.clone(),
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// A fresh client for `title`, sharing this site's session.
    pub fn document(&self, title: &str) -> DocumentClient {
        DocumentClient::new(
            title,
            self.endpoint.clone(),
            self.http.clone(),
            Arc::clone(&self.session),
            self.fields.clone(),
            self.config.article_ttl,
        )
    }
}
