// Path and file-name rules
//
// Paths are absolute, `/`-separated, and never carry a trailing slash
// (except the root itself). No inode table exists: everything is derived
// from the path string.

/// Extension every article file carries.
pub const ARTICLE_SUFFIX: &str = ".mw";

/// Characters a wiki title cannot contain.
pub const FORBIDDEN_TITLE_CHARS: [char; 8] = ['#', '<', '>', '[', ']', '|', '{', '}'];

/// Canonical form: leading `/`, no trailing `/`, no empty components.
pub fn normalize(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Last component; empty for the root.
pub fn basename(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Containing directory; the root is its own parent.
pub fn parent(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((dir, _)) => dir,
    }
}

/// Whether `path` names something a text editor made for itself: a hidden
/// file, a vi swap file, a backup ending in `~`, or an emacs lock or
/// auto-save file. The root and other empty names count as real.
pub fn is_temp_name(path: &str) -> bool {
    let name = basename(path);
    !name.is_empty()
        && (name.starts_with('.')
            || name.ends_with(".swp")
            || name.ends_with('~')
            || name.starts_with('#')
            || name.starts_with("s.")
            || name.starts_with("p."))
}

/// Inverse of [`is_temp_name`]: the name may reach the wiki.
pub fn is_valid_name(path: &str) -> bool {
    !is_temp_name(path)
}

/// Whether a file name inside a site directory denotes an article.
pub fn is_article_name(name: &str) -> bool {
    name.len() > ARTICLE_SUFFIX.len()
        && name.ends_with(ARTICLE_SUFFIX)
        && !name.contains(FORBIDDEN_TITLE_CHARS)
}

/// Whether a name may be used for a sub-page directory.
pub fn is_subpage_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(FORBIDDEN_TITLE_CHARS) && !is_temp_name(name)
}

/// Article title for a file path: everything after the site component,
/// minus the suffix. Sub-pages keep their slashes.
///
/// `/wikipedia-fr/Paris.mw` → `Paris`,
/// `/mysite/Project/Notes.mw` → `Project/Notes`.
pub fn article_title(path: &str) -> Option<&str> {
    let rest = path.strip_prefix('/')?;
    let (_site, rel) = rest.split_once('/')?;
    rel.strip_suffix(ARTICLE_SUFFIX).filter(|t| !t.is_empty())
}

/// Ancestors from nearest to farthest, ending with `/`.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    let mut current = path;
    std::iter::from_fn(move || {
        if current == "/" {
            return None;
        }
        current = parent(current);
        Some(current)
    })
}

/// Whether `path` lies strictly below `dir`.
pub fn is_below(path: &str, dir: &str) -> bool {
    if dir == "/" {
        return path != "/";
    }
    path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_slashes() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("//"), "/");
        assert_eq!(normalize("site//Paris.mw/"), "/site/Paris.mw");
    }

    #[test]
    fn basename_and_parent() {
        assert_eq!(basename("/site/Paris.mw"), "Paris.mw");
        assert_eq!(basename("/"), "");
        assert_eq!(parent("/site/Paris.mw"), "/site");
        assert_eq!(parent("/site"), "/");
        assert_eq!(parent("/"), "/");
    }

    #[test]
    fn editor_files_are_temp_names() {
        for name in [
            "/s/.Paris.mw.swp",
            "/s/Paris.mw.swp",
            "/s/Paris.mw~",
            "/s/#Paris.mw#",
            "/s/.#Paris.mw",
            "/s/s.Paris",
            "/s/p.Paris",
        ] {
            assert!(is_temp_name(name), "{name} should be a temp name");
        }
        assert!(is_valid_name("/s/Paris.mw"));
        assert!(is_valid_name("/s/4913"));
        assert!(is_valid_name("/"));
    }

    #[test]
    fn article_names_need_suffix_and_clean_title() {
        assert!(is_article_name("Paris.mw"));
        assert!(!is_article_name("Paris.txt"));
        assert!(!is_article_name(".mw"));
        assert!(!is_article_name("C[1].mw"));
        assert!(!is_article_name("a|b.mw"));
    }

    #[test]
    fn titles_keep_sub_pages() {
        assert_eq!(article_title("/wikipedia-fr/Paris.mw"), Some("Paris"));
        assert_eq!(article_title("/mysite/Project/Notes.mw"), Some("Project/Notes"));
        assert_eq!(article_title("/mysite/Notes.txt"), None);
        assert_eq!(article_title("/Paris.mw"), None);
    }

    #[test]
    fn ancestors_walk_to_root() {
        let found: Vec<&str> = ancestors("/a/b/c").collect();
        assert_eq!(found, vec!["/a/b", "/a", "/"]);
        assert_eq!(ancestors("/a").collect::<Vec<_>>(), vec!["/"]);
        assert_eq!(ancestors("/").count(), 0);
    }

    #[test]
    fn below() {
        assert!(is_below("/a/b", "/a"));
        assert!(!is_below("/ab", "/a"));
        assert!(!is_below("/a", "/a"));
        assert!(is_below("/a", "/"));
    }
}
