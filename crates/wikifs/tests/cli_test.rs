//! Integration tests for the `wikifs` binary.
//!
//! Argument parsing, config handling and error exit codes run without any
//! network. The read/save round trips run against a wiremock wiki.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `wikifs` binary with env isolation.
///
/// Clears all `WIKIFS_*` and proxy env vars and points config directories
/// at a nonexistent path so tests never touch the user's real setup.
fn wikifs_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("wikifs");
    cmd.env("HOME", "/tmp/wikifs-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/wikifs-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("WIKIFS_CONFIG")
        .env_remove("WIKIFS_OUTPUT")
        .env_remove("RUST_LOG")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("HTTPS_PROXY")
        .env_remove("https_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy");
    cmd
}

/// A command reading its config from `config`.
fn with_config(config: &Path) -> assert_cmd::Command {
    let mut cmd = wikifs_cmd();
    cmd.arg("--config").arg(config);
    cmd
}

fn write_config(dir: &TempDir, toml: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, toml).unwrap();
    path
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

const TWO_SITES: &str = r#"
[sites.wikipedia-fr]
host = "fr.wikipedia.org"

[sites.intranet]
host = "wiki.example.org"
base_path = "/index.php"
username = "me"
password = "hunter2"
"#;

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = wikifs_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    wikifs_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("wiki")
            .and(predicate::str::contains("cat"))
            .and(predicate::str::contains("put"))
            .and(predicate::str::contains("mkdir")),
    );
}

#[test]
fn test_version_flag() {
    wikifs_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wikifs"));
}

#[test]
fn test_completions_zsh() {
    wikifs_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_output_format() {
    let output = wikifs_cmd().args(["-o", "xml", "sites"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_flag() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.toml");
    with_config(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_writes_sample_once() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("nested").join("config.toml");

    with_config(&config)
        .args(["config", "init"])
        .write_stdin("")
        .assert()
        .success();
    let written = std::fs::read_to_string(&config).unwrap();
    assert!(written.contains("en.wikipedia.org"), "{written}");

    let output = with_config(&config)
        .args(["config", "init"])
        .write_stdin("")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--force"));

    with_config(&config)
        .args(["config", "init", "--force"])
        .write_stdin("")
        .assert()
        .success();
}

#[test]
fn test_config_show_masks_passwords() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, TWO_SITES);

    let output = with_config(&config)
        .args(["config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(!text.contains("hunter2"), "{text}");
    assert!(text.contains("********"), "{text}");
    assert!(text.contains("wiki.example.org"), "{text}");
}

#[test]
fn test_config_show_without_file_is_defaults() {
    let dir = TempDir::new().unwrap();
    with_config(&dir.path().join("missing.toml"))
        .args(["-o", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"article_cache_secs\": 30"));
}

#[test]
fn test_broken_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "[general\n");
    let output = with_config(&config).arg("sites").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("wikifs config path"));
}

#[test]
fn test_username_without_password_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "[sites.nopass]\nhost = \"wiki.invalid\"\nusername = \"me\"\n",
    );
    let output = with_config(&config).arg("sites").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("WIKIFS_PASSWORD_NOPASS"));
}

// ── Offline tree commands ───────────────────────────────────────────

#[test]
fn test_sites_lists_configured_wikis() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, TWO_SITES);

    with_config(&config)
        .args(["-o", "plain", "sites"])
        .assert()
        .success()
        .stdout("intranet\nwikipedia-fr\n");

    with_config(&config)
        .arg("sites")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("https://wiki.example.org/index.php")
                .and(predicate::str::contains("me"))
                .and(predicate::str::contains("(anonymous)")),
        );
}

#[test]
fn test_ls_root_lists_sites() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, TWO_SITES);

    with_config(&config)
        .args(["-o", "plain", "ls", "/"])
        .assert()
        .success()
        .stdout("intranet\nwikipedia-fr\n");
}

#[test]
fn test_stat_site_directory() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, TWO_SITES);

    with_config(&config)
        .args(["-o", "json-compact", "stat", "/intranet"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""kind":"directory""#)
                .and(predicate::str::contains(r#""mode":"755""#)),
        );
}

#[test]
fn test_unknown_site_is_not_found() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, TWO_SITES);

    let output = with_config(&config)
        .args(["cat", "/nowhere/Paris.mw"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("/nowhere"));
}

#[test]
fn test_mkdir_family_wiki() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, TWO_SITES);

    with_config(&config)
        .args(["mkdir", "/wiktionary-de"])
        .assert()
        .success()
        .stderr(predicate::str::contains("de.wiktionary.org"));

    let output = with_config(&config)
        .args(["mkdir", "/intranet"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_put_refuses_scratch_names() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, TWO_SITES);

    let output = with_config(&config)
        .args(["put", "/intranet/.Paris.mw.swp"])
        .write_stdin("text")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Against a fake wiki ─────────────────────────────────────────────

fn edit_page(body: &str) -> String {
    format!(
        r#"<form id="editform">
<input type="hidden" value="20240101120000" name="wpEdittime" />
<input type="hidden" value="20240102130000" name="wpStarttime" />
<textarea name="wpTextbox1">{body}</textarea>
<input type="hidden" value="tok" name="wpEditToken" />
</form>"#
    )
}

async fn local_wiki(dir: &TempDir) -> (MockServer, std::path::PathBuf) {
    let server = MockServer::start().await;
    let config = write_config(
        dir,
        &format!(
            "[sites.local]\nhost = \"{}\"\nhttps = false\nport = {}\n",
            server.address().ip(),
            server.address().port()
        ),
    );
    (server, config)
}

async fn mount_article(server: &MockServer, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .and(query_param("title", title))
        .and(query_param("action", "edit"))
        .respond_with(ResponseTemplate::new(200).set_body_string(edit_page(body)))
        .mount(server)
        .await;
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cat_prints_article_source() {
    let dir = TempDir::new().unwrap();
    let (server, config) = local_wiki(&dir).await;
    mount_article(&server, "Paris", "'''Paris''' is a city.").await;

    let mut cmd = with_config(&config);
    cmd.args(["cat", "/local/Paris.mw"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(output.stdout, b"'''Paris''' is a city.");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cat_missing_article_is_not_found() {
    let dir = TempDir::new().unwrap();
    let (server, config) = local_wiki(&dir).await;
    mount_article(&server, "Nowhere", "").await;

    let mut cmd = with_config(&config);
    cmd.args(["cat", "/local/Nowhere.mw"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_saves_with_summary() {
    let dir = TempDir::new().unwrap();
    let (server, config) = local_wiki(&dir).await;
    mount_article(&server, "Project/Notes", "old").await;
    Mock::given(method("POST"))
        .and(path("/w/index.php"))
        .and(query_param("title", "Project/Notes"))
        .and(query_param("action", "submit"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/wiki/Project/Notes"))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = with_config(&config);
    cmd.args(["put", "/local/Project/Notes.mw"])
        .write_stdin("[[Summary: tidy up]]\nnew text");
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let form: std::collections::HashMap<String, String> =
        url::form_urlencoded::parse(&post.body).into_owned().collect();
    assert_eq!(form["wpTextbox1"], "new text");
    assert_eq!(form["wpSummary"], "tidy up");
    assert_eq!(form["wpEditToken"], "tok");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_refuses_non_utf8_text() {
    let dir = TempDir::new().unwrap();
    let (server, config) = local_wiki(&dir).await;
    mount_article(&server, "Paris", "old").await;
    let input = dir.path().join("latin1.txt");
    std::fs::write(&input, b"Caf\xe9").unwrap();

    let mut cmd = with_config(&config);
    cmd.args(["put", "/local/Paris.mw", "-f"]).arg(&input);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("UTF-8"));
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() != "POST"));
}

#[test]
fn test_unreachable_wiki_is_a_connection_error() {
    // Bind then release a port so nothing listens on it.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        &format!("[sites.local]\nhost = \"127.0.0.1\"\nhttps = false\nport = {port}\n"),
    );

    let output = with_config(&config)
        .args(["cat", "/local/Paris.mw"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}
