// Wiki login session
//
// Performs the login-form handshake for one site and caches the resulting
// cookie string for a configurable TTL. Every document of the site shares
// one `SessionManager`, so the login cost is paid once per TTL, not once
// per article.
//
// A failed login is not an error: the site simply continues anonymously.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, SET_COOKIE};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::endpoint::SiteEndpoint;
use crate::error::Error;
use crate::form::{FormFields, hidden_inputs};
use crate::transport::HttpClients;

/// Username/password for the wiki's own login form.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: SecretString,
    /// Authentication domain for LDAP-style login extensions.
    pub domain: Option<String>,
}

/// How a login response is judged successful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoginPolicy {
    /// Exactly four distinct cookies; the first three form the session.
    /// Matches older wiki releases that always set the same cookie set.
    #[default]
    CookieCount,
    /// A user-identifying cookie (`*UserID` / `*UserName`) was set; every
    /// cookie seen during the handshake forms the session.
    SessionCookie,
}

#[derive(Debug, Default)]
struct SessionState {
    cookie: Option<String>,
    /// When the cookie (or the decision to stay anonymous) was obtained.
    obtained_at: Option<Instant>,
}

/// Owns the login cookie of one site.
#[derive(Debug)]
pub struct SessionManager {
    endpoint: SiteEndpoint,
    http: HttpClients,
    credentials: Option<LoginCredentials>,
    fields: FormFields,
    policy: LoginPolicy,
    ttl: Duration,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn new(
        endpoint: SiteEndpoint,
        http: HttpClients,
        credentials: Option<LoginCredentials>,
        fields: FormFields,
        policy: LoginPolicy,
        ttl: Duration,
    ) -> Self {
        Self {
            endpoint,
            http,
            credentials,
            fields,
            policy,
            ttl,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Return the session cookie, logging in first when the cached one is
    /// older than the TTL or `force_refresh` is set.
    ///
    /// `None` means requests go out anonymously.
    pub async fn ensure(&self, force_refresh: bool) -> Option<String> {
        let mut state = self.state.lock().await;

        if !force_refresh && state.obtained_at.is_some_and(|at| at.elapsed() < self.ttl) {
            return state.cookie.clone();
        }

        let cookie = match self.credentials {
            Some(ref credentials) => self.login(credentials).await,
            None => None,
        };

        state.cookie.clone_from(&cookie);
        state.obtained_at = Some(Instant::now());
        cookie
    }

    /// The cached cookie, without logging in.
    pub async fn cookie(&self) -> Option<String> {
        self.state.lock().await.cookie.clone()
    }

    /// Forget the cached session; the next `ensure` logs in again.
    pub async fn invalidate(&self) {
        *self.state.lock().await = SessionState::default();
    }

    async fn login(&self, credentials: &LoginCredentials) -> Option<String> {
        match self.try_login(credentials).await {
            Ok(Some(cookie)) => {
                info!(
                    host = self.endpoint.host(),
                    username = %credentials.username,
                    "logged in"
                );
                Some(cookie)
            }
            Ok(None) => {
                warn!(
                    host = self.endpoint.host(),
                    username = %credentials.username,
                    "could not log in, continuing anonymously"
                );
                None
            }
            Err(e) => {
                warn!(
                    host = self.endpoint.host(),
                    error = %e,
                    "login request failed, continuing anonymously"
                );
                None
            }
        }
    }

    async fn try_login(&self, credentials: &LoginCredentials) -> Result<Option<String>, Error> {
        let url = self.endpoint.login_url()?;

        // 1. Login page: anti-forgery token plus the pre-login session cookie.
        debug!("GET {}", url);
        let resp = self
            .http
            .prepare(self.http.follow.get(url.clone()), None)
            .send()
            .await?;
        let page_cookies = set_cookies(resp.headers());
        let page = resp.text().await?;
        let login_token = hidden_inputs(&page).remove(&self.fields.login_token);

        // 2. Credentials.
        let mut form: Vec<(&str, &str)> = vec![
            ("wpName", credentials.username.as_str()),
            ("wpPassword", credentials.password.expose_secret()),
            ("wpLoginattempt", "Log in"),
            ("wpRemember", "1"),
        ];
        if let Some(ref token) = login_token {
            form.push((self.fields.login_token.as_str(), token.as_str()));
        }
        if let Some(ref domain) = credentials.domain {
            form.push(("wpDomain", domain.as_str()));
        }

        let page_cookie = (!page_cookies.is_empty()).then(|| page_cookies.join("; "));

        debug!("POST {}", url);
        let resp = self
            .http
            .prepare(self.http.observe.post(url), page_cookie.as_deref())
            .form(&form)
            .send()
            .await?;

        let cookies = set_cookies(resp.headers());
        debug!(
            status = resp.status().as_u16(),
            count = cookies.len(),
            "login response"
        );

        Ok(judge(self.policy, &page_cookies, &cookies))
    }
}

/// Decide from the cookies a login produced whether it succeeded.
fn judge(policy: LoginPolicy, page_cookies: &[String], cookies: &[String]) -> Option<String> {
    match policy {
        LoginPolicy::CookieCount => {
            (cookies.len() == 4).then(|| cookies.get(..3).unwrap_or_default().join("; "))
        }
        LoginPolicy::SessionCookie => {
            let identified = cookies.iter().any(|c| {
                let name = cookie_name(c);
                name.ends_with("UserID") || name.ends_with("UserName")
            });
            if !identified {
                return None;
            }
            // Later cookies replace earlier ones with the same name.
            let mut merged: Vec<&String> = Vec::new();
            for cookie in page_cookies.iter().chain(cookies) {
                merged.retain(|c| cookie_name(c) != cookie_name(cookie));
                merged.push(cookie);
            }
            Some(
                merged
                    .into_iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        }
    }
}

/// The distinct `name=value` pairs of all `Set-Cookie` headers, in order.
fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    let mut cookies: Vec<String> = Vec::new();
    for value in headers.get_all(SET_COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        let pair = value.split(';').next().unwrap_or_default().trim();
        if pair.contains('=') && !cookies.iter().any(|c| c == pair) {
            cookies.push(pair.to_owned());
        }
    }
    cookies
}

fn cookie_name(pair: &str) -> &str {
    pair.split_once('=').map_or(pair, |(name, _)| name)
}
