use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

const DEPLOY_YAML: &str = r#"
name: deploy
arguments:
  - name: target
    mode: required
    suggestions: [staging, production, preview]
  - name: hosts
    mode: array
options:
  - name: env
    shortcut: e
    mode: required
    default: prod
  - name: verbose
    shortcut: v
  - name: cache
    mode: negatable
    default: true
"#;

const ROUTES_YAML: &str = r#"
routes:
  home:
    path: /
  blog_post:
    path: /blog/{slug}
    methods: [GET]
  blog_update:
    path: /blog/{slug}
    methods: [PUT]
  admin:
    path: /admin
    condition: is_admin
"#;

/// Minimal fixture files in a temp directory.
fn fixtures() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let definition = dir.path().join("deploy.yaml");
    fs::write(&definition, DEPLOY_YAML).expect("failed to write definition");
    let routes = dir.path().join("routes.yaml");
    fs::write(&routes, ROUTES_YAML).expect("failed to write routes");
    (dir, definition, routes)
}

fn waypost(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_waypost"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run waypost")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

// ---------------------------------------------------------------------------
// parse / synopsis / suggest
// ---------------------------------------------------------------------------

#[test]
fn parse_binds_argv_tokens() {
    let (_dir, definition, _) = fixtures();
    let definition = definition.to_str().unwrap();
    let output = waypost(&[
        "parse",
        "--definition",
        definition,
        "--",
        "-ve",
        "qa",
        "web",
        "h1",
        "--no-cache",
    ]);
    let json = stdout_json(&output);
    assert_eq!(json["command"], "deploy");
    assert_eq!(json["arguments"]["target"], "web");
    assert_eq!(json["arguments"]["hosts"], serde_json::json!(["h1"]));
    assert_eq!(json["options"]["env"], "qa");
    assert_eq!(json["options"]["verbose"], true);
    assert_eq!(json["options"]["cache"], false);
}

#[test]
fn parse_string_mode_tokenizes_quotes() {
    let (_dir, definition, _) = fixtures();
    let output = waypost(&[
        "parse",
        "--definition",
        definition.to_str().unwrap(),
        "--string",
        "--",
        "web --env='blue green'",
    ]);
    let json = stdout_json(&output);
    assert_eq!(json["options"]["env"], "blue green");
    assert_eq!(json["options"]["cache"], true);
}

#[test]
fn parse_reports_missing_arguments() {
    let (_dir, definition, _) = fixtures();
    let output = waypost(&["parse", "--definition", definition.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: Not enough arguments (missing: \"target\")."), "{stderr}");
}

#[test]
fn parse_reports_unknown_option() {
    let (_dir, definition, _) = fixtures();
    let output = waypost(&[
        "parse",
        "--definition",
        definition.to_str().unwrap(),
        "--",
        "web",
        "--force",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("The \"--force\" option does not exist."), "{stderr}");
}

#[test]
fn synopsis_prints_usage_line() {
    let (_dir, definition, _) = fixtures();
    let definition = definition.to_str().unwrap();

    let output = waypost(&["synopsis", "--definition", definition]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "deploy [-e|--env ENV] [-v|--verbose] [--cache|--no-cache] [--] <target> [<hosts>...]"
    );

    let output = waypost(&["synopsis", "--definition", definition, "--short"]);
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "deploy [options] [--] <target> [<hosts>...]"
    );
}

#[test]
fn suggest_filters_by_prefix() {
    let (_dir, definition, _) = fixtures();
    let output = waypost(&[
        "suggest",
        "--definition",
        definition.to_str().unwrap(),
        "--argument",
        "target",
        "pr",
    ]);
    assert!(output.status.success());
    let lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(lines, ["production", "preview"]);
}

// ---------------------------------------------------------------------------
// match / dump
// ---------------------------------------------------------------------------

#[test]
fn match_prints_route_and_params() {
    let (_dir, _, routes) = fixtures();
    let output = waypost(&["match", "--routes", routes.to_str().unwrap(), "/blog/hello"]);
    let json = stdout_json(&output);
    assert_eq!(json["route"], "blog_post");
    assert_eq!(json["params"]["slug"], "hello");
    assert!(json["redirect"].is_null());
}

#[test]
fn match_uses_request_method() {
    let (_dir, _, routes) = fixtures();
    let routes = routes.to_str().unwrap();

    let output = waypost(&["match", "--routes", routes, "--method", "put", "/blog/x"]);
    assert_eq!(stdout_json(&output)["route"], "blog_update");

    let output = waypost(&["match", "--routes", routes, "--method", "DELETE", "/blog/x"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("method not allowed (allow: GET, PUT)"), "{stderr}");
}

#[test]
fn match_not_found() {
    let (_dir, _, routes) = fixtures();
    let output = waypost(&["match", "--routes", routes.to_str().unwrap(), "/missing"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: No routes found for \"/missing\"."), "{stderr}");
}

#[test]
fn match_conditions_need_explicit_allowance() {
    let (_dir, _, routes) = fixtures();
    let routes = routes.to_str().unwrap();

    let output = waypost(&["match", "--routes", routes, "/admin"]);
    assert!(!output.status.success());

    let output = waypost(&[
        "match",
        "--routes",
        routes,
        "--allow-condition",
        "is_admin",
        "/admin",
    ]);
    assert_eq!(stdout_json(&output)["route"], "admin");
}

#[test]
fn dump_describes_tables() {
    let (_dir, _, routes) = fixtures();
    let output = waypost(&["dump", "--routes", routes.to_str().unwrap()]);
    let json = stdout_json(&output);
    assert_eq!(json["static_routes"]["/"], serde_json::json!(["home"]));
    assert_eq!(json["static_routes"]["/admin"], serde_json::json!(["admin"]));
    let alternatives = &json["regexes"][0]["alternatives"];
    assert_eq!(
        alternatives[0]["routes"],
        serde_json::json!(["blog_post", "blog_update"])
    );
    assert_eq!(json["conditions"][0]["expression"], "is_admin");
}

#[test]
fn missing_config_file_fails() {
    let output = waypost(&["dump", "--routes", "/nonexistent/routes.yaml"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: Failed to load"), "{stderr}");
}
