//! Binary-level integration tests for the kubeforge CLI.

use std::path::PathBuf;
use std::process::Command;

use kubeforge_schema::NodeAssets;
use tempfile::TempDir;

const CONTAINERD_1_4_9_AMD64: &str =
    "9911479f86012d6eab7e0f532da8f807a8b0f555ee09ef89367d8c31243073bb";

/// Test context holding a scratch directory for specs and compiler output.
struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn kubeforge_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_kubeforge");
        let mut cmd = Command::new(bin_path);
        cmd.current_dir(self.temp_dir.path());
        cmd
    }

    fn write_spec(&self, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join("cluster.toml");
        std::fs::write(&path, contents).expect("failed to write spec");
        path
    }

    fn out_dir(&self) -> PathBuf {
        self.temp_dir.path().join("out")
    }
}

const SAMPLE_SPEC: &str = r#"
[cluster]
name = "test.k8s.local"
kubernetes-version = "1.21.3"

[containerd]
version = "1.4.9"

[cni]
version = "0.9.1"

[bootstrap]
version = "0.4.2"

[[instance-groups]]
name = "control-plane"
architecture = "amd64"

[[instance-groups]]
name = "nodes"
architecture = "arm64"
"#;

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx
        .kubeforge_cmd()
        .arg("--help")
        .output()
        .expect("failed to run kubeforge");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    let output = ctx
        .kubeforge_cmd()
        .arg("--version")
        .output()
        .expect("failed to run kubeforge");
    assert!(output.status.success());
}

#[test]
fn test_compile_writes_one_manifest_per_instance_group() {
    let ctx = TestContext::new();
    let spec = ctx.write_spec(SAMPLE_SPEC);

    let output = ctx
        .kubeforge_cmd()
        .args(["compile", "--spec"])
        .arg(&spec)
        .arg("--out")
        .arg(ctx.out_dir())
        .output()
        .expect("failed to run kubeforge compile");
    assert!(
        output.status.success(),
        "compile failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let amd64 = NodeAssets::load(&ctx.out_dir().join("control-plane/conf/assets.toml")).unwrap();
    assert_eq!(amd64.assets[0].asset.sha256.as_str(), CONTAINERD_1_4_9_AMD64);
    assert!(amd64.assets[0].asset.urls[0].contains("v1.4.9"));

    // The arm64 group rides the docker bundle instead of a native build.
    let arm64 = NodeAssets::load(&ctx.out_dir().join("nodes/conf/assets.toml")).unwrap();
    assert!(arm64.assets[0].asset.urls[0].contains("download.docker.com"));
    assert_eq!(arm64.assets.len(), amd64.assets.len());
}

#[test]
fn test_compile_fails_with_actionable_message_on_unknown_version() {
    let ctx = TestContext::new();
    let spec = ctx.write_spec(&SAMPLE_SPEC.replace("1.21.3", "1.21.99"));

    let output = ctx
        .kubeforge_cmd()
        .args(["compile", "--spec"])
        .arg(&spec)
        .output()
        .expect("failed to run kubeforge compile");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("kubelet"));
    assert!(stderr.contains("1.21.99"));
}

#[test]
fn test_resolve_prints_single_line_descriptor() {
    let ctx = TestContext::new();
    let output = ctx
        .kubeforge_cmd()
        .args(["resolve", "containerd", "amd64", "1.4.9"])
        .output()
        .expect("failed to run kubeforge resolve");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.trim();
    assert!(line.starts_with(CONTAINERD_1_4_9_AMD64));
    assert!(line.contains("@https://github.com/containerd/"));
}

#[test]
fn test_resolve_json_output_is_parseable() {
    let ctx = TestContext::new();
    let output = ctx
        .kubeforge_cmd()
        .args(["resolve", "kubelet", "arm64", "1.21.3", "--json"])
        .output()
        .expect("failed to run kubeforge resolve");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        value["urls"][0],
        "https://dl.k8s.io/release/v1.21.3/bin/linux/arm64/kubelet"
    );
}

#[test]
fn test_resolve_rejects_unknown_architecture() {
    let ctx = TestContext::new();
    let output = ctx
        .kubeforge_cmd()
        .args(["resolve", "containerd", "s390x", "1.4.9"])
        .output()
        .expect("failed to run kubeforge resolve");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown architecture"));
}
