//! End-to-end pipeline tests over real directory trees.

use std::fs;
use std::path::Path;

use importee_core::{
    check_imports, Analyzer, LinearRule, ProjectConfig, RunConfig, RULE_LINEAR,
    RULE_PARSE_ERROR,
};
use tempfile::TempDir;

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn layered_config(root: &Path) -> ProjectConfig {
    let mut config = ProjectConfig::new(
        root,
        vec!["core".to_string(), "api".to_string()],
    );
    config.rules.linear = vec![LinearRule::new(vec![
        "core".to_string(),
        "api".to_string(),
    ])];
    config
}

fn check(config: ProjectConfig, run: RunConfig) -> importee_core::CheckReport {
    Analyzer::builder()
        .config(config)
        .run_config(run)
        .build()
        .unwrap()
        .check()
        .unwrap()
}

#[test]
fn higher_layer_importing_lower_is_clean() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "core/a.py", "");
    write_file(tmp.path(), "api/b.py", "import core.a\n");

    let report = check(layered_config(tmp.path()), RunConfig::default());
    assert!(report.is_clean());
    assert_eq!(report.files_checked, 2);
}

#[test]
fn lower_layer_importing_higher_is_one_violation() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "core/a.py", "import api.b\n");
    write_file(tmp.path(), "api/b.py", "");

    let report = check(layered_config(tmp.path()), RunConfig::default());
    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.rule_name, RULE_LINEAR);
    assert_eq!(issue.path, "core/a.py");
    assert_eq!(issue.line, 1);
    assert!(issue.message.contains("'core'"));
    assert!(issue.message.contains("'api'"));
}

#[test]
fn syntax_error_isolates_to_its_file() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "core/a.py", "import api.b\n");
    write_file(tmp.path(), "core/broken.py", "def broken(:\n");
    write_file(tmp.path(), "api/b.py", "");

    let report = check(layered_config(tmp.path()), RunConfig::default());
    assert_eq!(report.issues.len(), 2);

    // Sorted report: the violation in core/a.py, then the parse error.
    assert_eq!(report.issues[0].rule_name, RULE_LINEAR);
    assert_eq!(report.issues[0].path, "core/a.py");
    assert_eq!(report.issues[1].rule_name, RULE_PARSE_ERROR);
    assert_eq!(report.issues[1].path, "core/broken.py");
}

#[test]
fn modules_outside_every_group_are_exempt() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "core/a.py", "import extra.b\n");
    write_file(tmp.path(), "extra/b.py", "import api.c\n");
    write_file(tmp.path(), "api/c.py", "");

    let mut config = ProjectConfig::new(
        tmp.path(),
        vec![
            "core".to_string(),
            "api".to_string(),
            "extra".to_string(),
        ],
    );
    config.rules.linear = vec![LinearRule::new(vec![
        "core".to_string(),
        "api".to_string(),
    ])];

    // `extra` is internal but matches no group, so neither edge violates.
    let report = check(config, RunConfig::default());
    assert!(report.is_clean());
}

#[test]
fn check_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "core/a.py", "import api.b\nimport os\n");
    write_file(tmp.path(), "api/b.py", "import core.a\n");

    let first = check(layered_config(tmp.path()), RunConfig::default());
    let second = check(layered_config(tmp.path()), RunConfig::default());
    assert_eq!(first.issues, second.issues);
    // The second run served every file from the cache.
    assert_eq!(second.files_parsed, 0);
    assert_eq!(second.cache_hits, 2);
}

#[test]
fn worker_count_does_not_change_the_result() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "core/a.py", "import api.b\n");
    write_file(tmp.path(), "core/z.py", "import api.sub.deep\n");
    write_file(tmp.path(), "api/b.py", "import core.a\n");
    write_file(tmp.path(), "api/sub/__init__.py", "");
    write_file(tmp.path(), "api/sub/deep.py", "from core import z\n");

    let project = format!(
        r#"{{"project_root":{root},
            "source_modules":["core","api"],
            "rules":{{"linear":[{{"order":["core","api"]}}]}}}}"#,
        root = serde_json::to_string(tmp.path()).unwrap(),
    );

    let single = check_imports(
        &project,
        r#"{"verbose":false,"no_cache":true,"jobs":1}"#,
    )
    .unwrap();
    let many = check_imports(
        &project,
        r#"{"verbose":false,"no_cache":true,"jobs":4}"#,
    )
    .unwrap();
    assert_eq!(single, many);

    // And the shape is the documented boundary contract.
    let parsed: serde_json::Value = serde_json::from_str(&single).unwrap();
    let issues = parsed["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0]["rule_name"], "linear");
    assert_eq!(issues[0]["path"], "core/a.py");
    assert_eq!(issues[0]["line"], 1);
    assert!(issues[0]["message"].is_string());
}

#[test]
fn scoped_and_unscoped_rules_stack() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "app/config/loader.py", "from app.checker import run\n");
    write_file(tmp.path(), "app/checker/__init__.py", "");

    let mut config = ProjectConfig::new(tmp.path(), vec!["app".to_string()]);
    config.rules.linear = vec![
        LinearRule::new(vec!["config".to_string(), "checker".to_string()])
            .scoped("app"),
        LinearRule::new(vec!["app.config".to_string(), "app.checker".to_string()]),
    ];

    // Both rules cover the same edge; each reports it.
    let report = check(config, RunConfig::default());
    assert_eq!(report.issues.len(), 2);
    assert!(report
        .issues
        .iter()
        .all(|i| i.rule_name == RULE_LINEAR && i.path == "app/config/loader.py"));
}
