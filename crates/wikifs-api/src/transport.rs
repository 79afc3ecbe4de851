// Shared transport configuration for building reqwest::Client instances.
//
// The session manager and every document client of a site share TLS,
// proxy, timeout and basic-auth settings through this module, avoiding
// duplicated builder logic.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;

/// Product token sent as `User-Agent` on every request.
pub const USER_AGENT: &str = concat!("wikifs/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed wikis).
    DangerAcceptInvalid,
}

/// Whether a built client follows HTTP redirects.
///
/// Submitting an edit must see the raw 302 that signals success, while
/// the login page GET wants the final page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirects {
    Follow,
    Observe,
}

/// HTTP basic-auth credentials sent in front of the wiki itself.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Fixed proxy for all requests (`http_proxy` style URL).
    pub proxy: Option<Url>,
    pub basic_auth: Option<BasicAuth>,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            proxy: None,
            basic_auth: None,
            user_agent: USER_AGENT.to_owned(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self, redirects: Redirects) -> Result<reqwest::Client, Error> {
        let policy = match redirects {
            Redirects::Follow => reqwest::redirect::Policy::limited(10),
            Redirects::Observe => reqwest::redirect::Policy::none(),
        };

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .redirect(policy);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        if let Some(ref proxy) = self.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str()).map_err(|e| Error::Proxy {
                url: proxy.to_string(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Attach basic-auth credentials to a request, if configured.
    pub fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.basic_auth {
            Some(ref auth) => {
                builder.basic_auth(&auth.username, Some(auth.password.expose_secret()))
            }
            None => builder,
        }
    }
}

/// The pair of clients a site needs, built once from one `TransportConfig`.
#[derive(Debug, Clone)]
pub struct HttpClients {
    /// Never follows redirects.
    pub observe: reqwest::Client,
    /// Follows redirects.
    pub follow: reqwest::Client,
    transport: TransportConfig,
}

impl HttpClients {
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            observe: transport.build_client(Redirects::Observe)?,
            follow: transport.build_client(Redirects::Follow)?,
            transport: transport.clone(),
        })
    }

    /// Apply basic auth and, when present, the session cookie.
    pub(crate) fn prepare(
        &self,
        builder: reqwest::RequestBuilder,
        cookie: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let builder = self.transport.authorize(builder);
        match cookie {
            Some(cookie) => builder.header(reqwest::header::COOKIE, cookie),
            None => builder,
        }
    }
}
