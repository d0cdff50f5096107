//! Integration tests for the rollchart binary

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const ORDERS: &str = r##"{
    "name": "orders",
    "command": "serve",
    "port": 8080,
    "roleArn": "arn:aws:iam::123:role/x",
    "env": "production",
    "hostname": "orders.example.com",
    "argoProject": "team-a",
    "serviceInfo": { "department": "payments", "slackChannel": "#payments" }
}"##;

/// Run rollchart with its output directory inside `dir`
fn rollchart(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rollchart"))
        .args(args)
        .env("ROLLCHART_OUTDIR", dir.join("dist"))
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute rollchart")
}

fn write_config(dir: &Path, content: &str) -> String {
    let path = dir.join("config.json");
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

fn documents(yaml: &str) -> Vec<serde_yaml::Value> {
    serde_yaml::Deserializer::from_str(yaml)
        .map(|doc| serde_yaml::Value::deserialize(doc).unwrap())
        .collect()
}

#[test]
fn test_synth_writes_chart_file() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), ORDERS);

    let output = rollchart(dir.path(), &["--config", &config]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let file = dir.path().join("dist").join("orders.k8s.yaml");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("orders.k8s.yaml"));

    let docs = documents(&fs::read_to_string(file).unwrap());
    assert_eq!(docs.len(), 7);

    let kinds: Vec<&str> = docs.iter().filter_map(|doc| doc["kind"].as_str()).collect();
    assert_eq!(
        kinds,
        vec![
            "ConfigMap",
            "Service",
            "Service",
            "ServiceAccount",
            "Ingress",
            "Ingress",
            "Rollout"
        ]
    );

    for doc in docs.iter().filter(|doc| doc["kind"] == "Ingress") {
        assert_eq!(doc["metadata"]["labels"]["example.com/service"], "orders");
        assert_eq!(doc["metadata"]["labels"]["example.com/department"], "payments");
    }
}

#[test]
fn test_missing_config_flag_fails() {
    let dir = TempDir::new().unwrap();
    let output = rollchart(dir.path(), &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--config"));
}

#[test]
fn test_missing_config_file_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json").display().to_string();

    let output = rollchart(dir.path(), &["--config", &missing]);
    assert_eq!(output.status.code(), Some(5));
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_malformed_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "{ not json");

    let output = rollchart(dir.path(), &["--config", &config]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_missing_field_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        dir.path(),
        &ORDERS.replace(r#""hostname": "orders.example.com","#, ""),
    );

    let output = rollchart(dir.path(), &["--config", &config]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("hostname"), "stderr: {stderr}");
}

#[test]
fn test_invalid_port_is_config_error() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &ORDERS.replace("8080", "0"));

    let output = rollchart(dir.path(), &["--config", &config]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("port"));
}

#[test]
fn test_path_like_name_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        dir.path(),
        &ORDERS.replace(r#""name": "orders""#, r#""name": "../escaped""#),
    );

    let output = rollchart(dir.path(), &["--config", &config]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("name"), "stderr: {stderr}");

    assert!(!dir.path().join("escaped.k8s.yaml").exists());
    assert!(!dir.path().join("dist").exists());
}
