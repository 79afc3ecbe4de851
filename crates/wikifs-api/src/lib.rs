// wikifs-api: async client for the MediaWiki edit-form protocol
//
// Fetches an article's edit page, scrapes the source text and hidden edit
// tokens out of it, posts new revisions back through the same form, and
// keeps a per-site login session alive.

pub mod document;
pub mod endpoint;
pub mod error;
pub mod form;
pub mod session;
pub mod transport;

pub use document::{DocumentClient, EditTokens, TokenState, parse_summary};
pub use endpoint::SiteEndpoint;
pub use error::Error;
pub use form::{EditForm, FormFields};
pub use session::{LoginCredentials, LoginPolicy, SessionManager};
pub use transport::{BasicAuth, HttpClients, Redirects, TlsMode, TransportConfig, USER_AGENT};
