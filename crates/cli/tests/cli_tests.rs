// End-to-end tests against the built `troute` binary.
// Run with: cargo test -p termroute-cli --test cli_tests

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const TERMS: &str = "\
search_term,campaign_name,ad_group_name,impressions,clicks,cost,conversions
b2b order management software,Search - NonBrand,NB - General B2B,210,4,48.20,0
order management system,Search - NonBrand,OMS,150,6,72.00,2
kibo oms,Search - NonBrand,OMS,20,1,3.00,0
";

const NEGATIVES: &str = "\
campaign_name,ad_group_name,keyword,match_type
Search - NonBrand,OMS,b2c,PHRASE
";

const CUSTOM_RULES: &str = r#"
name = "Custom"

[[intent]]
label = "Headless"
contains = ["headless"]
"#;

const BAD_REGEX_RULES: &str = r#"
name = "Bad"

[[intent]]
label = "Broken"
regex = ["("]
"#;

/// Command with user config and rules env isolated to `home`.
fn troute(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_troute"));
    cmd.env("XDG_CONFIG_HOME", home)
        .env("HOME", home)
        .env_remove("TERMROUTE_RULES")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

fn setup() -> (TempDir, String, String) {
    let dir = TempDir::new().unwrap();
    let terms = write(dir.path(), "terms.csv", TERMS);
    let negatives = write(dir.path(), "negatives.csv", NEGATIVES);
    (dir, terms, negatives)
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// -------------------------------------------------------------------------
// analyze
// -------------------------------------------------------------------------

#[test]
fn analyze_writes_reports_and_summary() {
    let (dir, terms, negatives) = setup();
    let out_dir = dir.path().join("reports");
    let out = troute(dir.path())
        .args(["analyze", "--terms", &terms, "--negatives", &negatives, "--out-dir"])
        .arg(&out_dir)
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    for name in [
        "traffic_routing_analysis.csv",
        "refined_recommendations.csv",
        "cross_contamination_issues.csv",
        "negation_recommendations.csv",
    ] {
        assert!(out_dir.join(name).is_file(), "missing {name}");
    }

    let text = stdout(&out);
    assert!(text.contains("ROUTING STATUS BREAKDOWN"));
    assert!(text.contains("POTENTIAL_MISMATCH"));

    let analysis = std::fs::read_to_string(out_dir.join("traffic_routing_analysis.csv")).unwrap();
    assert_eq!(analysis.lines().count(), 3);
    assert!(analysis.contains("b2b order management software"));
    assert!(!analysis.contains("kibo oms"));
}

#[test]
fn analyze_json_dry_run() {
    let (dir, terms, negatives) = setup();
    let out_dir = dir.path().join("untouched");
    let out = troute(dir.path())
        .args(["analyze", "--terms", &terms, "--negatives", &negatives, "--json", "--dry-run", "--out-dir"])
        .arg(&out_dir)
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(!out_dir.exists());

    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["summary"]["total_terms"], 2);
    assert_eq!(value["meta"]["brand_rows_skipped"], 1);
    assert_eq!(value["meta"]["window"]["days"], 60);
    assert_eq!(value["recommendations"][0]["expected_ad_group"], "OMS");
}

#[test]
fn analyze_fail_on_mismatch_exit_code() {
    let (dir, terms, negatives) = setup();
    let out = troute(dir.path())
        .args(["analyze", "--terms", &terms, "--negatives", &negatives, "--dry-run", "--fail-on-mismatch"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("mismatch"));
}

#[test]
fn analyze_thresholds_can_silence_mismatch() {
    let (dir, terms, negatives) = setup();
    let out = troute(dir.path())
        .args([
            "analyze", "--terms", &terms, "--negatives", &negatives,
            "--dry-run", "--fail-on-mismatch", "--min-cost", "100", "--min-clicks", "50",
        ])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
}

#[test]
fn analyze_missing_column_is_data_error() {
    let dir = TempDir::new().unwrap();
    let terms = write(dir.path(), "terms.csv", "search_term,campaign_name,ad_group_name\nx,y,z\n");
    let negatives = write(dir.path(), "negatives.csv", NEGATIVES);
    let out = troute(dir.path())
        .args(["analyze", "--terms", &terms, "--negatives", &negatives, "--dry-run"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(4));
    let err = stderr(&out);
    assert!(err.contains("error: terms.csv: missing column 'impressions'"), "{err}");
    assert!(err.contains("hint:"));
}

#[test]
fn analyze_unreadable_file_is_io_error() {
    let (dir, _, negatives) = setup();
    let missing = dir.path().join("nope.csv");
    let out = troute(dir.path())
        .args(["analyze", "--negatives", &negatives, "--dry-run", "--terms"])
        .arg(&missing)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(5));
}

#[test]
fn analyze_bad_end_date_is_usage_error() {
    let (dir, terms, negatives) = setup();
    let out = troute(dir.path())
        .args(["analyze", "--terms", &terms, "--negatives", &negatives, "--dry-run", "--end-date", "yesterday"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("YYYY-MM-DD"));
}

#[test]
fn analyze_oversized_days_is_usage_error() {
    let (dir, terms, negatives) = setup();
    let out = troute(dir.path())
        .args(["analyze", "--terms", &terms, "--negatives", &negatives, "--dry-run", "--days", "4294967295"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("--days"));
}

#[test]
fn analyze_blank_ad_group_is_data_error() {
    let dir = TempDir::new().unwrap();
    let terms = write(
        dir.path(),
        "terms.csv",
        "search_term,campaign_name,ad_group_name,impressions,clicks,cost,conversions\n\
         order management,Search - NonBrand,,,,40,\n",
    );
    let negatives = write(dir.path(), "negatives.csv", NEGATIVES);
    let out = troute(dir.path())
        .args(["analyze", "--terms", &terms, "--negatives", &negatives, "--dry-run"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("row 2: empty ad_group_name"), "{}", stderr(&out));
}

#[test]
fn analyze_window_drops_old_dated_rows() {
    let dir = TempDir::new().unwrap();
    let terms = write(
        dir.path(),
        "daily.csv",
        "\
date,search_term,campaign_name,ad_group_name,impressions,clicks,cost,conversions
2026-02-20,headless commerce api,Search - NonBrand,NB - General B2B,10,1,4.00,0
2026-02-21,headless commerce api,Search - NonBrand,NB - General B2B,10,2,9.00,0
2025-06-01,headless commerce api,Search - NonBrand,NB - General B2B,10,5,50.00,0
",
    );
    let negatives = write(dir.path(), "negatives.csv", NEGATIVES);
    let out = troute(dir.path())
        .args([
            "analyze", "--terms", &terms, "--negatives", &negatives,
            "--json", "--dry-run", "--end-date", "2026-03-01", "--days", "30",
        ])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["meta"]["input_rows"], 2);
    assert_eq!(value["decisions"][0]["term"]["clicks"], 3);
    assert_eq!(value["meta"]["window"]["start"], "2026-01-30");
}

// -------------------------------------------------------------------------
// classify
// -------------------------------------------------------------------------

#[test]
fn classify_prints_intent_and_brand() {
    let dir = TempDir::new().unwrap();
    let out = troute(dir.path())
        .args(["classify", "b2b order management platform", "kibo oms", "zzz"])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let lines: Vec<String> = stdout(&out).lines().map(str::to_string).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("OMS"));
    assert!(lines[1].contains("brand"));
    assert!(lines[2].contains("UNCLEAR"));
}

#[test]
fn classify_json_with_env_rules() {
    let dir = TempDir::new().unwrap();
    let rules = write(dir.path(), "custom.toml", CUSTOM_RULES);
    let out = troute(dir.path())
        .env("TERMROUTE_RULES", &rules)
        .args(["classify", "headless commerce", "kibo oms", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value[0]["intent"], "Headless");
    // custom rules carry no brand patterns
    assert_eq!(value[1]["is_brand"], false);
    assert_eq!(value[1]["intent"], "UNCLEAR");
}

#[test]
#[cfg(target_os = "linux")]
fn classify_picks_up_user_config_rules() {
    let dir = TempDir::new().unwrap();
    let config_dir = dir.path().join("termroute");
    std::fs::create_dir_all(&config_dir).unwrap();
    write(&config_dir, "rules.toml", CUSTOM_RULES);
    let out = troute(dir.path())
        .args(["classify", "headless storefront"])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("Headless"));
}

// -------------------------------------------------------------------------
// rules
// -------------------------------------------------------------------------

#[test]
fn rules_show_prints_builtin_document() {
    let dir = TempDir::new().unwrap();
    let out = troute(dir.path()).args(["rules", "show"]).output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("[[intent]]"));
    assert!(text.contains("label = \"OMS\""));
    assert!(stderr(&out).contains("built-in defaults"));
}

#[test]
fn rules_validate_ok_and_bad() {
    let dir = TempDir::new().unwrap();
    let good = write(dir.path(), "good.toml", CUSTOM_RULES);
    let out = troute(dir.path()).args(["rules", "validate", &good]).output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).starts_with("ok: 'Custom' v1"));

    let bad = write(dir.path(), "bad.toml", BAD_REGEX_RULES);
    let out = troute(dir.path()).args(["rules", "validate", &bad]).output().unwrap();
    assert_eq!(out.status.code(), Some(10));
    assert!(stderr(&out).contains("Broken"));

    let missing = dir.path().join("missing.toml");
    let out = troute(dir.path()).args(["rules", "validate"]).arg(&missing).output().unwrap();
    assert_eq!(out.status.code(), Some(11));
}
