use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const TOKEN: &str = "integration-secret";

fn faq_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_faq"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("cc.csv"),
        "Key Word , Description\nhọc phí,Tuition is paid per term.\nHọc bổng,Scholarships open in May.\nkhác,Other questions.\n",
    )
    .unwrap();
    fs::write(
        files_dir.join("hb.csv"),
        "key word,description\nhours,Mon-Fri 8-17\nvisa,Bring your passport.\n",
    )
    .unwrap();
    fs::write(files_dir.join("broken.csv"), "key word,answer\nx,y\n").unwrap();

    let config_content = format!(
        r#"[store]
admin_edits = '{root}/data/admin_edits.csv'
pins = '{root}/data/pinned_keywords.json'
preferences = '{root}/data/theme_prefs.json'

[server]
bind = "127.0.0.1:8591"

[sources.local.uploads]
root = '{root}/files'
"#,
        root = root.display()
    );

    let config_path = config_dir.join("faq.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_faq(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = faq_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env("FAQ_ADMIN_TOKEN", TOKEN)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run faq binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_sources() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, success) = run_faq(&config, &["sources"]);
    assert!(success);
    assert!(stdout.contains("local:uploads"));
    assert!(stdout.contains("admin"));
}

#[test]
fn test_rebuild_reports_skipped_source() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_faq(&config, &["rebuild"]);
    assert!(success, "stderr: {}", stderr);
    assert!(stdout.contains("broken.csv"));
    assert!(stdout.contains("SKIPPED"));
    assert!(stdout.contains("entries: 5"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_lookup_exact_and_sentinel() {
    let (_tmp, config) = setup_test_env();

    let (stdout, _, success) = run_faq(&config, &["lookup", "hours"]);
    assert!(success);
    assert_eq!(stdout.trim(), "Mon-Fri 8-17");

    let (stdout, _, success) = run_faq(&config, &["lookup", "VISA"]);
    assert!(success);
    assert_eq!(stdout.trim(), "Bring your passport.");

    let (stdout, _, success) = run_faq(&config, &["lookup", "parking"]);
    assert!(success);
    assert!(stdout.contains("No data available"));
}

#[test]
fn test_search_substring_case_insensitive() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_faq(&config, &["search", "học"]);
    assert!(success);

    let keys: Vec<&str> = stdout
        .lines()
        .filter(|l| l.starts_with('['))
        .collect();
    assert_eq!(keys, vec!["[cc] học phí", "[cc] Học bổng"]);
    assert!(stderr.contains("broken.csv"));
}

#[test]
fn test_search_topic_filter_and_empty_fragment() {
    let (_tmp, config) = setup_test_env();

    let (stdout, _, _) = run_faq(&config, &["search", "--topic", "hb"]);
    let count = stdout.lines().filter(|l| l.starts_with('[')).count();
    assert_eq!(count, 2);

    let (stdout, _, _) = run_faq(&config, &["search"]);
    let count = stdout.lines().filter(|l| l.starts_with('[')).count();
    assert_eq!(count, 5);
}

#[test]
fn test_topics_and_keywords() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, success) = run_faq(&config, &["topics"]);
    assert!(success);
    let topics: Vec<&str> = stdout.lines().collect();
    assert_eq!(topics, vec!["cc", "hb"]);

    let (stdout, _, _) = run_faq(&config, &["keywords", "hb"]);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["hours", "visa"]);
}

#[test]
fn test_suggest() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, success) = run_faq(&config, &["suggest", "hour"]);
    assert!(success);
    assert!(stdout.lines().next().unwrap().ends_with("hours"));
}

#[test]
fn test_admin_add_overrides_source() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, success) = run_faq(
        &config,
        &[
            "admin",
            "--token",
            TOKEN,
            "add",
            "--key",
            "hours",
            "--description",
            "Closed for holidays",
            "--topic",
            "manual",
        ],
    );
    assert!(success, "stderr: {}", stderr);

    let (stdout, _, _) = run_faq(&config, &["lookup", "hours"]);
    assert_eq!(stdout.trim(), "Closed for holidays");

    let (stdout, _, _) = run_faq(&config, &["topics"]);
    assert!(stdout.lines().any(|l| l == "manual"));

    let (_, _, success) = run_faq(&config, &["admin", "--token", TOKEN, "delete", "manual"]);
    assert!(success);
    let (stdout, _, _) = run_faq(&config, &["lookup", "hours"]);
    assert_eq!(stdout.trim(), "Mon-Fri 8-17");
}

#[test]
fn test_admin_requires_token() {
    let (tmp, config) = setup_test_env();
    let (_, stderr, success) = run_faq(
        &config,
        &[
            "admin",
            "--token",
            "wrong",
            "add",
            "--key",
            "x",
            "--description",
            "y",
            "--topic",
            "z",
        ],
    );
    assert!(!success);
    assert!(stderr.contains("admin access required"));
    assert!(!tmp.path().join("data/admin_edits.csv").exists());
}

#[test]
fn test_admin_validation_rejects_blank_field() {
    let (tmp, config) = setup_test_env();
    let (_, stderr, success) = run_faq(
        &config,
        &[
            "admin",
            "--token",
            TOKEN,
            "add",
            "--key",
            "x",
            "--description",
            " ",
            "--topic",
            "z",
        ],
    );
    assert!(!success);
    assert!(stderr.contains("description"));
    assert!(!tmp.path().join("data/admin_edits.csv").exists());
}

#[test]
fn test_pins_grouped_by_topic() {
    let (_tmp, config) = setup_test_env();
    run_faq(&config, &["pin", "alice", "visa"]);
    run_faq(&config, &["pin", "alice", "học phí"]);
    let (stdout, _, success) = run_faq(&config, &["pins", "alice"]);
    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["cc", "  học phí", "hb", "  visa"]);

    let (stdout, _, _) = run_faq(&config, &["pins", "bob"]);
    assert!(stdout.contains("No pinned keywords."));
}

#[test]
fn test_theme_toggle() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, _) = run_faq(&config, &["theme", "alice"]);
    assert_eq!(stdout.trim(), "light");
    let (stdout, _, _) = run_faq(&config, &["theme", "alice", "--toggle"]);
    assert_eq!(stdout.trim(), "dark");
    let (stdout, _, _) = run_faq(&config, &["theme", "alice"]);
    assert_eq!(stdout.trim(), "dark");
}

#[test]
fn test_export_json() {
    let (tmp, config) = setup_test_env();
    let out = tmp.path().join("out/kb.json");
    let (_, stderr, success) = run_faq(&config, &["export", "-o", out.to_str().unwrap()]);
    assert!(success, "stderr: {}", stderr);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["entries"].as_array().unwrap().len(), 5);
    assert_eq!(json["report"]["entries"], 5);
}

#[test]
fn test_no_sources_reports_no_valid_data() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("faq.toml");
    fs::write(
        &config,
        format!(
            "[store]\nadmin_edits = '{}/edits.csv'\n",
            tmp.path().display()
        ),
    )
    .unwrap();

    let (stdout, _, success) = run_faq(&config, &["lookup", "anything"]);
    assert!(success);
    assert_eq!(stdout.trim(), "no valid data");
}

#[test]
fn test_invalid_config_errors() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("faq.toml");
    fs::write(&config, "[merge]\nkey_policy = \"random\"\n").unwrap();
    let (_, stderr, success) = run_faq(&config, &["topics"]);
    assert!(!success);
    assert!(stderr.contains("key_policy"));
}
