use std::path::Path;
use std::process::Command;

fn wikicheck_cmd(fixture: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_wikicheck"));
    cmd.current_dir(Path::new("tests/fixtures").join(fixture));
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn clean_wiki_passes() {
    let check = wikicheck_cmd("clean").arg("check").output().unwrap();
    assert!(
        check.status.success(),
        "check failed: {}{}",
        String::from_utf8_lossy(&check.stdout),
        String::from_utf8_lossy(&check.stderr)
    );
    assert!(check.stdout.is_empty(), "no failures printed");
    let stderr = String::from_utf8_lossy(&check.stderr);
    assert!(stderr.contains("All links valid in 3 articles"), "summary: {stderr}");
}

#[test]
fn broken_links_are_reported() {
    let check = wikicheck_cmd("broken").arg("check").output().unwrap();
    assert_eq!(check.status.code(), Some(1), "broken links exit with 1");

    let stdout = String::from_utf8_lossy(&check.stdout);
    let expected = [
        "wiki/Broken/en.md:3:1: /wiki/Missing_page: no such file or directory: Missing_page",
        "wiki/Broken/en.md:4:1: /wiki/Lost: broken redirect (redirect.yaml:3: Lost --> Nowhere)",
        "wiki/Broken/en.md:5:1: /wiki/FAQ#nope: no identifier `#nope` in wiki/FAQ/en.md (no translation available)",
        "wiki/Broken/en.md:6:1: undeclared: no reference definition for `[undeclared]`",
    ];
    assert_eq!(stdout.lines().collect::<Vec<_>>(), expected);

    let stderr = String::from_utf8_lossy(&check.stderr);
    assert!(stderr.contains("4 broken links in 1 of 2 articles"), "summary: {stderr}");
}

#[test]
fn json_format_tags_each_failure() {
    let check = wikicheck_cmd("broken")
        .args(["check", "--format", "json", "wiki/Broken/en.md"])
        .output()
        .unwrap();
    assert_eq!(check.status.code(), Some(1), "broken links exit with 1");

    let value: serde_json::Value = serde_json::from_slice(&check.stdout).unwrap();
    let kinds: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|failure| failure["error"]["kind"].as_str().unwrap())
        .collect();
    assert_eq!(
        kinds,
        ["link_not_found", "broken_redirect", "missing_identifier", "missing_reference"]
    );
    assert_eq!(value[1]["error"]["source"], "Lost");
    assert_eq!(value[1]["error"]["line"], 3);
    assert_eq!(value[2]["error"]["translation_available"], false);
}

#[test]
fn explicit_file_limits_the_check() {
    let check = wikicheck_cmd("broken")
        .args(["check", "./wiki/FAQ/en.md", "wiki/redirect.yaml"])
        .output()
        .unwrap();
    assert!(
        check.status.success(),
        "check failed: {}",
        String::from_utf8_lossy(&check.stdout)
    );
}

#[test]
fn ids_lists_identifiers() {
    let ids = wikicheck_cmd("clean").args(["ids", "wiki/FAQ/en.md"]).output().unwrap();
    assert!(ids.status.success(), "ids failed: {}", String::from_utf8_lossy(&ids.stderr));
    assert_eq!(
        String::from_utf8_lossy(&ids.stdout),
        "wiki/FAQ/en.md#custom\nwiki/FAQ/en.md#general\n"
    );
}

#[test]
fn ids_json_includes_front_matter() {
    let ids = wikicheck_cmd("clean")
        .args(["ids", "--format", "json", "wiki/FAQ/en.md"])
        .output()
        .unwrap();
    assert!(ids.status.success(), "ids failed: {}", String::from_utf8_lossy(&ids.stderr));
    let value: serde_json::Value = serde_json::from_slice(&ids.stdout).unwrap();
    assert_eq!(value["front_matter"]["tags"][0], "faq");
    assert_eq!(value["identifiers"], serde_json::json!(["custom", "general"]));
}

#[test]
fn sitemap_and_templates_are_skipped() {
    let check = wikicheck_cmd("skipped").arg("check").output().unwrap();
    assert!(
        check.status.success(),
        "check failed: {}",
        String::from_utf8_lossy(&check.stdout)
    );
    let stderr = String::from_utf8_lossy(&check.stderr);
    assert!(stderr.contains("All links valid in 1 articles"), "summary: {stderr}");
}

#[test]
fn missing_redirect_file_is_fatal() {
    let check = wikicheck_cmd("noredirects").arg("check").output().unwrap();
    assert_eq!(check.status.code(), Some(2), "fatal errors exit with 2");
    let stderr = String::from_utf8_lossy(&check.stderr);
    assert!(stderr.contains("Redirect File Not Found"), "diagnostic: {stderr}");
}

#[test]
fn missing_article_is_fatal() {
    let check = wikicheck_cmd("clean")
        .args(["check", "wiki/Nope/en.md"])
        .output()
        .unwrap();
    assert_eq!(check.status.code(), Some(2), "fatal errors exit with 2");
}
