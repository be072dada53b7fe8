//! Cluster-spec compilation: resolve every asset an instance group needs and
//! assemble the per-node boot configuration manifest.
//!
//! The spec model here is deliberately minimal: exactly the fields the
//! resolver consumes. Cloud resources, certificates, and addon packaging are
//! other subsystems' problems.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use kubeforge_schema::{Architecture, FileAsset, NodeAssets};

use crate::component::Component;
use crate::resolver::{PackageOverride, ResolveError, resolve_asset};

/// Errors loading a cluster spec file.
#[derive(Error, Debug)]
pub enum SpecError {
    /// Underlying filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The spec is not valid TOML or violates a field invariant.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Declarative cluster specification, the resolver's input contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterSpec {
    /// Cluster-wide settings.
    pub cluster: ClusterMeta,
    /// Container runtime settings.
    pub containerd: ContainerdSpec,
    /// CNI plugin bundle settings.
    pub cni: VersionedSpec,
    /// Bootstrap agent settings.
    pub bootstrap: VersionedSpec,
    /// Instance groups to provision.
    #[serde(default)]
    pub instance_groups: Vec<InstanceGroup>,
}

/// Cluster-wide metadata and the Kubernetes release to install.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterMeta {
    /// Cluster name, used for output directory layout only.
    pub name: String,
    /// Kubernetes release for kubelet and kubectl.
    pub kubernetes_version: String,
}

/// Container runtime version plus optional operator override packages.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContainerdSpec {
    /// Requested containerd version.
    pub version: String,
    /// Operator-supplied package override, consulted before any table.
    #[serde(default)]
    pub packages: Option<PackageOverride>,
}

/// A component carrying only a version.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionedSpec {
    /// Requested version.
    pub version: String,
}

/// One group of identically-shaped machines.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceGroup {
    /// Group name, used for output directory layout.
    pub name: String,
    /// Target CPU architecture. Validated against the closed set at
    /// compile time, not at deserialization, so the error names the group.
    pub architecture: String,
}

impl ClusterSpec {
    /// Load a spec from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Resolve every component a node of architecture `arch` needs and assemble
/// the ordered boot manifest.
///
/// # Errors
///
/// The first [`ResolveError`] aborts compilation; nothing is partially
/// emitted.
pub fn compile_node_assets(
    spec: &ClusterSpec,
    arch: Architecture,
) -> Result<NodeAssets, ResolveError> {
    let wanted: [(Component, &str, Option<&PackageOverride>); 5] = [
        (
            Component::Containerd,
            &spec.containerd.version,
            spec.containerd.packages.as_ref(),
        ),
        (Component::Kubelet, &spec.cluster.kubernetes_version, None),
        (Component::Kubectl, &spec.cluster.kubernetes_version, None),
        (Component::CniPlugins, &spec.cni.version, None),
        (Component::Bootstrap, &spec.bootstrap.version, None),
    ];

    let mut manifest = NodeAssets::new();
    for (component, version, overrides) in wanted {
        let descriptor = resolve_asset(component, arch, version, overrides)?;
        let file_name = asset_file_name(component, descriptor.primary_url());
        tracing::debug!(%component, %arch, file_name = %file_name, "resolved boot asset");
        manifest.push(FileAsset::new(file_name, descriptor));
    }
    Ok(manifest)
}

/// Compile the manifest for one instance group, validating its architecture
/// string against the closed set.
pub fn compile_instance_group(
    spec: &ClusterSpec,
    group: &InstanceGroup,
) -> Result<NodeAssets, ResolveError> {
    let arch: Architecture = group.architecture.parse()?;
    compile_node_assets(spec, arch)
}

/// File name for a fetched artifact: the URL basename, or the component key
/// when the URL has none. Fallback-resolved assets keep their bundler's
/// name, so what lands on disk says what it actually is.
fn asset_file_name(component: Component, url: &str) -> String {
    let base = url.split('/').next_back().unwrap_or("");
    if base.is_empty() {
        component.key().to_string()
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec() -> ClusterSpec {
        toml::from_str(
            r#"
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
            "#,
        )
        .unwrap()
    }

    #[test]
    fn amd64_manifest_uses_native_containerd() {
        let manifest = compile_node_assets(&sample_spec(), Architecture::Amd64).unwrap();
        let names: Vec<&str> = manifest.assets.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "cri-containerd-cni-1.4.9-linux-amd64.tar.gz",
                "kubelet",
                "kubectl",
                "cni-plugins-linux-amd64-v0.9.1.tgz",
                "kubeforge-bootstrap",
            ]
        );
    }

    #[test]
    fn arm64_manifest_carries_the_docker_bundle_instead() {
        let manifest = compile_node_assets(&sample_spec(), Architecture::Arm64).unwrap();
        // 1.4.9 has no arm64 build and no mapping; the default bundler
        // version's docker archive stands in.
        assert_eq!(manifest.assets[0].file_name, "docker-20.10.7.tgz");
        assert_eq!(manifest.assets[1].file_name, "kubelet");
    }

    #[test]
    fn instance_group_architecture_is_validated() {
        let spec = sample_spec();
        let group = InstanceGroup {
            name: "riscv-experiment".to_string(),
            architecture: "riscv64".to_string(),
        };
        let err = compile_instance_group(&spec, &group).unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownArchitecture {
                value: "riscv64".to_string(),
            }
        );
    }

    #[test]
    fn compile_aborts_on_first_unresolvable_component() {
        let mut spec = sample_spec();
        spec.cluster.kubernetes_version = "1.21.99".to_string();
        let err = compile_node_assets(&spec, Architecture::Amd64).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnknownAssetForVersion { component: Component::Kubelet, .. }
        ));
    }

    #[test]
    fn spec_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cluster.toml");
        std::fs::write(
            &path,
            r#"
            [cluster]
            name = "disk.k8s.local"
            kubernetes-version = "1.22.1"

            [containerd]
            version = "1.5.5"
            [containerd.packages]
            url-amd64 = "https://mirror.internal/ctr.tar.gz"
            hash-amd64 = "dddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddd"

            [cni]
            version = "0.9.1"

            [bootstrap]
            version = "0.4.0"
            "#,
        )
        .unwrap();

        let spec = ClusterSpec::load(&path).unwrap();
        assert_eq!(spec.cluster.name, "disk.k8s.local");

        let manifest = compile_node_assets(&spec, Architecture::Amd64).unwrap();
        assert_eq!(manifest.assets[0].file_name, "ctr.tar.gz");
        assert_eq!(
            manifest.assets[0].asset.sha256.as_str(),
            "dddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddd"
        );
    }
}
