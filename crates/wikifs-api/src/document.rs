// Remote document client
//
// One instance per article. Fetches the article's edit page, keeps the
// source text and the hidden edit tokens from it, and posts a new revision
// back through the same form.
//
// Token lifecycle: tokens are `Fresh` right after a fetch and `Stale`
// after every submit (and before the first fetch). A submit with stale
// tokens fetches first.

use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant, SystemTime};

use chrono::NaiveDateTime;
use regex::Regex;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::endpoint::SiteEndpoint;
use crate::error::Error;
use crate::form::{EditForm, FormFields};
use crate::session::SessionManager;
use crate::transport::HttpClients;

/// Summary used when the text carries no `[[Summary: ...]]` directive.
pub const DEFAULT_SUMMARY: &str = " ";

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\A[ \t]*\[\[summary:(.*?)\]\][ \t]*(?:\r?\n)?").expect("summary pattern")
});

/// Split a leading `[[Summary: ...]]` directive off an article text.
///
/// Returns `(summary, body)`; the summary is [`DEFAULT_SUMMARY`] when the
/// directive is absent.
pub fn parse_summary(text: &str) -> (String, &str) {
    match SUMMARY_RE.captures(text) {
        Some(caps) => {
            let summary = caps.get(1).map_or("", |m| m.as_str().trim());
            let end = caps.get(0).map_or(0, |m| m.end());
            (summary.to_owned(), &text[end..])
        }
        None => (DEFAULT_SUMMARY.to_owned(), text),
    }
}

/// Hidden-field values captured from one edit page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTokens {
    pub edit_time: String,
    pub start_time: String,
    /// Absent on some anonymous edit forms.
    pub edit_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    /// No usable tokens; the next submit must fetch first.
    Stale,
    Fresh(EditTokens),
}

#[derive(Debug)]
struct DocumentState {
    text: String,
    empty: bool,
    fetched_at: Option<Instant>,
    tokens: TokenState,
    last_edit: Option<SystemTime>,
}

impl Default for DocumentState {
    fn default() -> Self {
        Self {
            text: String::new(),
            empty: true,
            fetched_at: None,
            tokens: TokenState::Stale,
            last_edit: None,
        }
    }
}

/// Reads and writes one article of one wiki.
#[derive(Debug)]
pub struct DocumentClient {
    title: String,
    endpoint: SiteEndpoint,
    http: HttpClients,
    session: Arc<SessionManager>,
    fields: FormFields,
    cache_ttl: Duration,
    state: Mutex<DocumentState>,
}

impl DocumentClient {
    pub fn new(
        title: impl Into<String>,
        endpoint: SiteEndpoint,
        http: HttpClients,
        session: Arc<SessionManager>,
        fields: FormFields,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            title: title.into(),
            endpoint,
            http,
            session,
            fields,
            cache_ttl,
            state: Mutex::new(DocumentState::default()),
        }
    }

    /// The article title (sub-pages keep their `/`).
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether the last known text is blank. `true` before the first fetch.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.empty
    }

    /// Last known text, without touching the network.
    pub async fn cached_text(&self) -> String {
        self.state.lock().await.text.clone()
    }

    pub async fn token_state(&self) -> TokenState {
        self.state.lock().await.tokens.clone()
    }

    /// Whether a submit could go out without fetching first.
    pub async fn is_fresh(&self) -> bool {
        matches!(self.state.lock().await.tokens, TokenState::Fresh(_))
    }

    /// Time of the revision last seen, from the edit timestamp token.
    pub async fn last_modified(&self) -> Option<SystemTime> {
        self.state.lock().await.last_edit
    }

    /// Return the article text, fetching it when the cached copy is older
    /// than the cache TTL (or was invalidated by a submit).
    pub async fn fetch(&self) -> Result<String, Error> {
        let mut state = self.state.lock().await;

        if state
            .fetched_at
            .is_some_and(|at| at.elapsed() < self.cache_ttl)
        {
            debug!(title = %self.title, "article served from cache");
            return Ok(state.text.clone());
        }

        self.refresh(&mut state).await?;
        Ok(state.text.clone())
    }

    /// Post `new_text` as the next revision.
    ///
    /// A no-op when the text equals the cached text. Anything but a
    /// redirect from the wiki is logged, not returned: the cache takes the
    /// new text either way and the tokens go stale so the next fetch sees
    /// what the server really holds.
    pub async fn submit(&self, new_text: &str) -> Result<(), Error> {
        let mut state = self.state.lock().await;

        if state.text == new_text {
            debug!(title = %self.title, "text unchanged, nothing to submit");
            return Ok(());
        }

        if state.tokens == TokenState::Stale {
            debug!(title = %self.title, "edit tokens stale, fetching before submit");
            self.refresh(&mut state).await?;
        }

        let (summary, body) = parse_summary(new_text);
        let tokens = match state.tokens {
            TokenState::Fresh(ref tokens) => tokens.clone(),
            TokenState::Stale => {
                warn!(title = %self.title, "submitting without edit tokens");
                EditTokens {
                    edit_time: String::new(),
                    start_time: String::new(),
                    edit_token: None,
                }
            }
        };

        let mut form: Vec<(&str, &str)> = vec![
            ("wpTextbox1", body),
            ("wpSummary", summary.as_str()),
            (self.fields.edit_time.as_str(), tokens.edit_time.as_str()),
            (self.fields.start_time.as_str(), tokens.start_time.as_str()),
            ("wpSave", "1"),
        ];
        if let Some(ref token) = tokens.edit_token {
            form.push((self.fields.edit_token.as_str(), token.as_str()));
        }

        let cookie = self.session.ensure(false).await;
        let url = self.endpoint.submit_url(&self.title)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .prepare(self.http.observe.post(url), cookie.as_deref())
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        if status.is_redirection() {
            info!(title = %self.title, summary = %summary, "article saved");
            state.last_edit = Some(SystemTime::now());
        } else {
            let response = resp.text().await.unwrap_or_default();
            let preview = &response[..floor_char_boundary(&response, 200)];
            warn!(
                title = %self.title,
                status = status.as_u16(),
                response = %preview,
                "save not confirmed by a redirect"
            );
        }

        state.text = new_text.to_owned();
        state.empty = body.trim().is_empty();
        state.tokens = TokenState::Stale;
        state.fetched_at = None;
        Ok(())
    }

    async fn refresh(&self, state: &mut DocumentState) -> Result<(), Error> {
        let cookie = self.session.ensure(false).await;
        let url = self.endpoint.edit_url(&self.title)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .prepare(self.http.follow.get(url.clone()), cookie.as_deref())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = resp.text().await?;
        let form = EditForm::parse(&html, &self.fields);

        let missing = form.missing(&self.fields);
        if !missing.is_empty() {
            warn!(title = %self.title, ?missing, "edit form lacks expected fields");
        }
        if form.text.is_none() {
            warn!(title = %self.title, "edit form has no text area");
        }

        state.tokens = match (form.edit_time, form.start_time) {
            (Some(edit_time), Some(start_time)) => {
                state.last_edit = parse_edit_time(&edit_time).or(state.last_edit);
                TokenState::Fresh(EditTokens {
                    edit_time,
                    start_time,
                    edit_token: form.edit_token,
                })
            }
            _ => TokenState::Stale,
        };
        state.text = form.text.unwrap_or_default();
        state.empty = state.text.trim().is_empty();
        state.fetched_at = Some(Instant::now());
        Ok(())
    }
}

/// `YYYYMMDDHHMMSS` (UTC) as used by the edit timestamp. Empty for
/// articles that do not exist yet.
fn parse_edit_time(raw: &str) -> Option<SystemTime> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y%m%d%H%M%S")
        .ok()
        .map(|t| SystemTime::from(t.and_utc()))
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
