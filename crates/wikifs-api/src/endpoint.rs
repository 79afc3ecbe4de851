// URL construction for one wiki site.
//
// Every request goes to the site's index script with a `title` and an
// `action` in the query string.

use url::Url;

use crate::error::Error;

const LOGIN_TITLE: &str = "Special:Userlogin";

/// Where a wiki lives: scheme, host and port, plus the index script path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteEndpoint {
    root: Url,
    index_path: String,
}

impl SiteEndpoint {
    /// Build an endpoint from its parts. `index_path` must start with `/`
    /// (e.g. `/w/index.php`); a missing slash is added.
    pub fn new(https: bool, host: &str, port: Option<u16>, index_path: &str) -> Result<Self, Error> {
        let scheme = if https { "https" } else { "http" };
        let authority = match port {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };
        let root = Url::parse(&format!("{scheme}://{authority}/"))?;
        Ok(Self::from_root(root, index_path))
    }

    /// Build an endpoint from an already parsed root URL.
    pub fn from_root(root: Url, index_path: &str) -> Self {
        let index_path = if index_path.starts_with('/') {
            index_path.to_owned()
        } else {
            format!("/{index_path}")
        };
        Self { root, index_path }
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    pub fn host(&self) -> &str {
        self.root.host_str().unwrap_or_default()
    }

    pub fn index_path(&self) -> &str {
        &self.index_path
    }

    /// `{index}?title={title}&action=edit`
    pub fn edit_url(&self, title: &str) -> Result<Url, Error> {
        self.action_url(title, "edit", None)
    }

    /// `{index}?title={title}&action=submit`
    pub fn submit_url(&self, title: &str) -> Result<Url, Error> {
        self.action_url(title, "submit", None)
    }

    /// `{index}?title=Special:Userlogin&action=submit&returnto=Special:Userlogin`
    pub fn login_url(&self) -> Result<Url, Error> {
        self.action_url(LOGIN_TITLE, "submit", Some(LOGIN_TITLE))
    }

    fn action_url(&self, title: &str, action: &str, returnto: Option<&str>) -> Result<Url, Error> {
        let mut url = self.root.join(&self.index_path)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("title", title).append_pair("action", action);
            if let Some(returnto) = returnto {
                query.append_pair("returnto", returnto);
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn edit_url_carries_title_and_action() {
        let ep = SiteEndpoint::new(true, "fr.wikipedia.org", None, "/w/index.php").unwrap();
        assert_eq!(
            ep.edit_url("Paris").unwrap().as_str(),
            "https://fr.wikipedia.org/w/index.php?title=Paris&action=edit"
        );
    }

    #[test]
    fn explicit_port_and_plain_http() {
        let ep = SiteEndpoint::new(false, "wiki.local", Some(8080), "mediawiki/index.php").unwrap();
        assert_eq!(ep.index_path(), "/mediawiki/index.php");
        assert_eq!(
            ep.submit_url("Main Page").unwrap().as_str(),
            "http://wiki.local:8080/mediawiki/index.php?title=Main+Page&action=submit"
        );
    }

    #[test]
    fn sub_page_titles_keep_their_slash() {
        let ep = SiteEndpoint::new(true, "example.org", None, "/w/index.php").unwrap();
        let url = ep.edit_url("Project/Notes").unwrap();
        let title = url
            .query_pairs()
            .find(|(k, _)| k == "title")
            .map(|(_, v)| v.into_owned());
        assert_eq!(title.as_deref(), Some("Project/Notes"));
    }

    #[test]
    fn login_url_returns_to_login_page() {
        let ep = SiteEndpoint::new(true, "example.org", None, "/w/index.php").unwrap();
        assert_eq!(
            ep.login_url().unwrap().as_str(),
            "https://example.org/w/index.php?title=Special%3AUserlogin&action=submit&returnto=Special%3AUserlogin"
        );
    }
}
