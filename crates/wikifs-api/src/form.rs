// Edit-form scraping
//
// Only two parts of the returned page matter: the `<textarea>` holding the
// article source and the hidden `<input>` fields carrying the edit tokens.
// This is not an HTML parser and does not try to be one.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static INPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<input\b[^>]*>").expect("input pattern"));

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:][a-z0-9_:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#)
        .expect("attribute pattern")
});

static TEXTAREA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<textarea\b[^>]*>(.*?)</textarea\s*>").expect("textarea pattern")
});

/// Names of the hidden form fields the wiki uses for its edit tokens.
///
/// They follow the wiki software's form layout, which differs between
/// versions. Overridable under `[fields]` in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormFields {
    pub edit_time: String,
    pub start_time: String,
    pub edit_token: String,
    pub login_token: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            edit_time: "wpEdittime".into(),
            start_time: "wpStarttime".into(),
            edit_token: "wpEditToken".into(),
            login_token: "wpLoginToken".into(),
        }
    }
}

/// What one fetched edit page yielded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditForm {
    /// Article source, `None` when the page had no text area.
    pub text: Option<String>,
    pub edit_time: Option<String>,
    pub start_time: Option<String>,
    pub edit_token: Option<String>,
}

impl EditForm {
    pub fn parse(html: &str, fields: &FormFields) -> Self {
        let inputs = hidden_inputs(html);
        let text = TEXTAREA_RE
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| decode_entities(m.as_str()));

        Self {
            text,
            edit_time: inputs.get(&fields.edit_time).cloned(),
            start_time: inputs.get(&fields.start_time).cloned(),
            edit_token: inputs.get(&fields.edit_token).cloned(),
        }
    }

    /// Names of the expected token fields the page did not carry.
    pub fn missing<'a>(&self, fields: &'a FormFields) -> Vec<&'a str> {
        let mut missing = Vec::new();
        if self.edit_time.is_none() {
            missing.push(fields.edit_time.as_str());
        }
        if self.start_time.is_none() {
            missing.push(fields.start_time.as_str());
        }
        if self.edit_token.is_none() {
            missing.push(fields.edit_token.as_str());
        }
        missing
    }
}

/// Collect `name -> value` for every `<input>` carrying both attributes.
///
/// The first occurrence of a name wins.
pub fn hidden_inputs(html: &str) -> HashMap<String, String> {
    let mut found = HashMap::new();
    for tag in INPUT_RE.find_iter(html) {
        let mut name = None;
        let mut value = None;
        for attr in ATTR_RE.captures_iter(tag.as_str()) {
            let key = attr.get(1).map_or("", |m| m.as_str());
            let val = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map_or("", |m| m.as_str());
            if key.eq_ignore_ascii_case("name") {
                name = Some(val);
            } else if key.eq_ignore_ascii_case("value") {
                value = Some(val);
            }
        }
        if let (Some(name), Some(value)) = (name, value) {
            found
                .entry(name.to_owned())
                .or_insert_with(|| decode_entities(value));
        }
    }
    found
}

/// Decode the character references a wiki emits inside form markup.
///
/// Unknown named references are left untouched.
pub fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';').filter(|&i| i <= 10) else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => entity.strip_prefix('#').and_then(|num| {
                let code = match num.strip_prefix(['x', 'X']) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => num.parse().ok(),
                };
                code.and_then(char::from_u32)
            }),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EDIT_PAGE: &str = r#"<html><body>
<form id="editform" method="post" action="/w/index.php?title=Paris&amp;action=submit">
<input type='hidden' value="20240101120000" name="wpEdittime" />
<input type='hidden' value="20240102130000" name="wpStarttime" />
<textarea tabindex="1" accesskey="," name="wpTextbox1" id="wpTextbox1" rows="25">'''Paris''' is &lt;b&gt;big&lt;/b&gt; &amp; old.
== History ==
</textarea>
<input type="hidden" value="abc123+\" name="wpEditToken" />
<input type="hidden" value="ignored" name="wpEdittime" />
</form></body></html>"#;

    #[test]
    fn parses_tokens_and_body() {
        let form = EditForm::parse(EDIT_PAGE, &FormFields::default());
        assert_eq!(form.edit_time.as_deref(), Some("20240101120000"));
        assert_eq!(form.start_time.as_deref(), Some("20240102130000"));
        assert_eq!(form.edit_token.as_deref(), Some("abc123+\\"));
        assert_eq!(
            form.text.as_deref(),
            Some("'''Paris''' is <b>big</b> & old.\n== History ==\n")
        );
        assert!(form.missing(&FormFields::default()).is_empty());
    }

    #[test]
    fn first_occurrence_wins() {
        let inputs = hidden_inputs(EDIT_PAGE);
        assert_eq!(inputs["wpEdittime"], "20240101120000");
    }

    #[test]
    fn reports_missing_tokens() {
        let html = "<textarea name=\"wpTextbox1\"></textarea>";
        let fields = FormFields::default();
        let form = EditForm::parse(html, &fields);
        assert_eq!(form.text.as_deref(), Some(""));
        assert_eq!(form.missing(&fields), vec!["wpEdittime", "wpStarttime", "wpEditToken"]);
    }

    #[test]
    fn no_textarea_means_no_text() {
        let form = EditForm::parse("<p>Permission error</p>", &FormFields::default());
        assert!(form.text.is_none());
    }

    #[test]
    fn custom_field_names() {
        let fields = FormFields {
            edit_time: "editRevId".into(),
            ..FormFields::default()
        };
        let html = r#"<input type="hidden" name="editRevId" value="42">"#;
        assert_eq!(EditForm::parse(html, &fields).edit_time.as_deref(), Some("42"));
    }

    #[test]
    fn decodes_numeric_references_and_keeps_strays() {
        assert_eq!(decode_entities("&#65;&#x42;&unknown; a & b"), "AB&unknown; a & b");
    }
}
